//! Glyph width oracle: how many columns a grapheme cluster occupies.
//!
//! Every cluster measures either 1 (narrow) or 2 (wide) columns — the oracle
//! is a total function with no other outputs. The raw Unicode width of a
//! cluster can fall outside that range in both directions: a lone combining
//! mark measures 0, some emoji ZWJ sequences measure more than 2. Both are
//! folded back into the cell model here, since every cell stack occupies at
//! least one and at most two columns.
//!
//! The one genuine policy choice is East Asian Ambiguous characters, which
//! legacy CJK terminals draw two columns wide and everything else draws one;
//! [`AmbiguousWidth`] names the two conventions, narrow being the default.

use unicode_width::UnicodeWidthStr;

/// Measurement convention for East Asian Ambiguous characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AmbiguousWidth {
    /// Ambiguous characters occupy one column (the Unicode default).
    #[default]
    Narrow,
    /// Ambiguous characters occupy two columns (legacy CJK terminals).
    Wide,
}

/// The column width of one grapheme cluster: 1 or 2.
#[must_use]
pub fn cluster_width(cluster: &str, ambiguous: AmbiguousWidth) -> u16 {
    let cells = match ambiguous {
        AmbiguousWidth::Narrow => cluster.width(),
        AmbiguousWidth::Wide => cluster.width_cjk(),
    };
    if cells >= 2 {
        2
    } else {
        1
    }
}

/// The column width of one grapheme cluster given as UTF-16 code units.
///
/// Total over all inputs: unpaired surrogates measure as the replacement
/// character (narrow).
#[must_use]
pub fn cluster_width_utf16(units: &[u16], ambiguous: AmbiguousWidth) -> u16 {
    cluster_width(&String::from_utf16_lossy(units), ambiguous)
}
