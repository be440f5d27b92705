//! Text attributes: the per-column payload of the run-length store.
//!
//! An attribute bundles style renditions, a color pair, and an optional
//! hyperlink identity. The row engine never interprets attributes — it only
//! stores, compares, and hands them back — but the hyperlink accessors are
//! part of its public contract (see [`Row::hyperlinks`](crate::Row::hyperlinks)).

use bitflags::bitflags;

bitflags! {
    /// Style renditions a cell can carry, one bit per SGR rendition the row
    /// engine stores. How each one is drawn (or whether it is drawn at all)
    /// is the renderer's business.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u16 {
        /// SGR 1.
        const INTENSE           = 1 << 0;
        /// SGR 2.
        const FAINT             = 1 << 1;
        /// SGR 3.
        const ITALIC            = 1 << 2;
        /// SGR 4.
        const UNDERLINED        = 1 << 3;
        /// SGR 21.
        const DOUBLY_UNDERLINED = 1 << 4;
        /// SGR 4:3.
        const CURLY_UNDERLINED  = 1 << 5;
        /// SGR 53.
        const OVERLINED         = 1 << 6;
        /// SGR 5.
        const BLINKING          = 1 << 7;
        /// SGR 7.
        const REVERSED          = 1 << 8;
        /// SGR 8.
        const INVISIBLE         = 1 << 9;
        /// SGR 9.
        const CROSSED_OUT       = 1 << 10;
        /// DECSCA guarded area; selective-erase operations skip the cell.
        const PROTECTED         = 1 << 11;
    }
}

/// One color slot of a cell attribute.
///
/// `Default` defers to the terminal theme. The other variants follow the SGR
/// escalation: 16 base colors, then the 256-entry palette, then direct RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// The theme's foreground or background, depending on the slot.
    #[default]
    Default,
    /// One of the 16 base colors (SGR 30-37, 90-97, and their backgrounds).
    Ansi(u8),
    /// An entry of the 256-color palette (SGR 38;5 / 48;5).
    Palette(u8),
    /// Direct color (SGR 38;2 / 48;2).
    Rgb { r: u8, g: u8, b: u8 },
}

/// The text attribute of one column: renditions, colors, hyperlink identity.
///
/// Cheap to copy and compare; the run-length store relies on `Eq` to merge
/// abutting runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextAttribute {
    pub flags: StyleFlags,
    pub fg: Color,
    pub bg: Color,
    /// Hyperlink identifier assigned by the enclosing buffer's hyperlink map.
    /// `0` means the cell is not part of a hyperlink.
    hyperlink_id: u16,
}

impl TextAttribute {
    /// A default attribute with the given colors.
    #[must_use]
    pub fn with_colors(fg: Color, bg: Color) -> Self {
        Self {
            fg,
            bg,
            ..Self::default()
        }
    }

    /// Whether this attribute carries a hyperlink.
    #[must_use]
    pub fn is_hyperlink(&self) -> bool {
        self.hyperlink_id != 0
    }

    /// The hyperlink identifier, or `0` if none.
    #[must_use]
    pub fn hyperlink_id(&self) -> u16 {
        self.hyperlink_id
    }

    /// Attach a hyperlink identifier. `0` detaches.
    pub fn set_hyperlink_id(&mut self, id: u16) {
        self.hyperlink_id = id;
    }

    /// Reset all attributes to default (SGR 0).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
