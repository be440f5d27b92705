//! The row: one fixed-width line of terminal cells.
//!
//! A row composes three stores that must move in lockstep:
//!
//! - a packed UTF-16 character buffer (`chars`), holding every cell's text
//!   back to back, one `U+0020` per blank cell;
//! - the [`CharOffsets`] index mapping each of the `width + 1` columns to its
//!   offset in `chars`, with the high bit marking wide-glyph trailers;
//! - a [`RunLength`] store of per-column [`TextAttribute`]s.
//!
//! The write primitive is [`Row::replace_characters`]. Its hard case is a
//! partial overwrite of wide glyphs. Given a row `"xxyyzz"` of three
//! two-column glyphs, writing a two-column glyph `ww` at column 1 must not
//! produce `"xwwyzz"` — the severed halves of `x` and `y` are meaningless.
//! The write range is instead extended over every partially-covered glyph and
//! the severed cells become spaces: `" ww zz"`.
//!
//! Reads never fail; out-of-range columns are clamped. Writes fail fast, and
//! because the offset table is rewritten before the character buffer is
//! filled, any error escaping the write path resets the row first (see
//! [`RowError`]).

use tracing::{trace, warn};

use crate::attr::TextAttribute;
use crate::error::{Result, RowError};
use crate::offsets::{CharOffsets, OFFSET_MASK};
use crate::rle::RunLength;
use crate::segment::with_segmenter;
use crate::width::{cluster_width, AmbiguousWidth};

const SPACE: u16 = 0x20;

/// Packed text length cap. Bit 15 of an offset entry is the trailer flag, and
/// the trailing pad columns of a write need up to two offsets past the last
/// consumed unit, so consumption stops short of `OFFSET_MASK` by that margin.
const MAX_ROW_TEXT: usize = OFFSET_MASK as usize - 2;

/// A column's role in a wide-glyph pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DbcsAttribute {
    /// A single-width cell.
    #[default]
    Single,
    /// The leading (left) half of a wide glyph.
    Leading,
    /// The trailing (right) half of a wide glyph.
    Trailing,
}

/// Word-navigation class of the glyph anchored at a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelimiterClass {
    /// First code unit is `U+0020` or below.
    Control,
    /// First code unit is one of the caller's delimiters.
    Delimiter,
    /// Anything else.
    Regular,
}

/// Row-level rendition mode. Opaque to the row engine apart from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineRendition {
    #[default]
    SingleWidth,
    DoubleWidth,
    DoubleHeightTop,
    DoubleHeightBottom,
}

/// One fixed-width row of cells: packed text, column-offset index, and
/// run-length attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Packed UTF-16 cell text; `chars.len()` always equals the offset
    /// table's sentinel.
    chars: Vec<u16>,
    offsets: CharOffsets,
    attr: RunLength<TextAttribute>,
    width: u16,
    line_rendition: LineRendition,
    wrap_forced: bool,
    dbcs_padded: bool,
}

impl Row {
    /// A row of `width` blank cells carrying `fill` in a single attribute run.
    ///
    /// Widths above `OFFSET_MASK` are clamped: the offset encoding cannot
    /// address text past bit 15.
    #[must_use]
    pub fn new(width: u16, fill: &TextAttribute) -> Self {
        let width = width.min(OFFSET_MASK);
        Self {
            chars: vec![SPACE; width as usize],
            offsets: CharOffsets::new(width),
            attr: RunLength::new(width, *fill),
            width,
            line_rendition: LineRendition::SingleWidth,
            wrap_forced: false,
            dbcs_padded: false,
        }
    }

    /// Return the row to all spaces with `fill` as the single attribute run,
    /// reusing the base allocation and releasing any spill beyond it.
    pub fn reset(&mut self, fill: &TextAttribute) {
        self.chars.clear();
        self.chars.shrink_to(self.width as usize);
        self.chars.resize(self.width as usize, SPACE);
        self.offsets.reset();
        self.attr = RunLength::new(self.width, *fill);
        self.line_rendition = LineRendition::SingleWidth;
        self.wrap_forced = false;
        self.dbcs_padded = false;
    }

    // ── Simple accessors ────────────────────────────────────────────

    /// The column count.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// The packed cell text of the whole row.
    #[must_use]
    pub fn text(&self) -> &[u16] {
        &self.chars
    }

    /// The raw column-offset entries (`width + 1` of them): low 15 bits are
    /// the offset into [`text`](Self::text), the high bit marks a wide-glyph
    /// trailer.
    #[must_use]
    pub fn char_offsets(&self) -> &[u16] {
        self.offsets.as_slice()
    }

    /// Whether the row was soft-wrapped into the next one.
    #[must_use]
    pub fn wrap_forced(&self) -> bool {
        self.wrap_forced
    }

    pub fn set_wrap_forced(&mut self, wrap: bool) {
        self.wrap_forced = wrap;
    }

    /// Whether the last cell was padded with a space because a wide glyph
    /// did not fit.
    #[must_use]
    pub fn dbcs_padded(&self) -> bool {
        self.dbcs_padded
    }

    pub fn set_dbcs_padded(&mut self, padded: bool) {
        self.dbcs_padded = padded;
    }

    #[must_use]
    pub fn line_rendition(&self) -> LineRendition {
        self.line_rendition
    }

    pub fn set_line_rendition(&mut self, rendition: LineRendition) {
        self.line_rendition = rendition;
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// The full grapheme occupying the cell stack anchored at `column`
    /// (or containing `column`, if `column` is a trailer).
    #[must_use]
    pub fn glyph_at(&self, column: u16) -> &[u16] {
        if self.width == 0 {
            return &[];
        }
        let col = self.clamped_col(column);
        let beg = self.offsets.offset(col);
        let end = self.offsets.offset(self.offsets.next_non_trailer(col + 1));
        &self.chars[beg as usize..end as usize]
    }

    /// The role of `column` in a wide-glyph pair.
    #[must_use]
    pub fn dbcs_attr_at(&self, column: u16) -> DbcsAttribute {
        if self.width == 0 {
            return DbcsAttribute::Single;
        }
        let col = self.clamped_col(column);
        if self.offsets.is_trailer(col) {
            DbcsAttribute::Trailing
        } else if self.offsets.is_trailer(col + 1) {
            DbcsAttribute::Leading
        } else {
            DbcsAttribute::Single
        }
    }

    /// Classify the glyph at `column` by its first code unit.
    #[must_use]
    pub fn delimiter_class_at(&self, column: u16, delimiters: &[u16]) -> DelimiterClass {
        if self.width == 0 {
            return DelimiterClass::Control;
        }
        let col = self.clamped_col(column);
        let unit = self.chars[self.offsets.offset(col) as usize];
        if unit <= SPACE {
            DelimiterClass::Control
        } else if delimiters.contains(&unit) {
            DelimiterClass::Delimiter
        } else {
            DelimiterClass::Regular
        }
    }

    /// The column of the first non-space glyph; `width` if the row is blank.
    ///
    /// Leading blank cells hold exactly one space each, so the code-unit
    /// count and the column count coincide.
    #[must_use]
    pub fn measure_left(&self) -> u16 {
        self.chars.iter().take_while(|&&u| u == SPACE).count() as u16
    }

    /// One past the last non-space column, in cells.
    ///
    /// Counting code units from the left would be wrong here: a glyph's text
    /// length is not its column count. Trailing blank cells hold exactly one
    /// space each, so measuring the blank suffix and subtracting from the
    /// width is.
    #[must_use]
    pub fn measure_right(&self) -> u16 {
        let trailing = self
            .chars
            .iter()
            .rev()
            .take_while(|&&u| u == SPACE)
            .count();
        self.width - trailing as u16
    }

    /// Whether any cell holds something other than a space.
    #[must_use]
    pub fn contains_text(&self) -> bool {
        self.chars.iter().any(|&u| u != SPACE)
    }

    /// `column`, moved left past any trailer cells it lands on: the start of
    /// the preceding cell stack.
    #[must_use]
    pub fn preceding_column(&self, column: u16) -> u16 {
        if self.width == 0 {
            return 0;
        }
        let mut col = self.clamped_col(column);
        while col != 0 {
            col -= 1;
            if !self.offsets.is_trailer(col) {
                break;
            }
        }
        col
    }

    /// Iterate the row's cell stacks in column order.
    ///
    /// The yielded column spans sum to exactly `width`. Restartable by
    /// calling `iter` again.
    #[must_use]
    pub fn iter(&self) -> RowTextIter<'_> {
        RowTextIter {
            chars: &self.chars,
            offsets: &self.offsets,
            col: 0,
        }
    }

    // ── Attributes ──────────────────────────────────────────────────

    /// The attribute run store.
    #[must_use]
    pub fn attributes(&self) -> &RunLength<TextAttribute> {
        &self.attr
    }

    /// The attribute at `column` (clamped).
    #[must_use]
    pub fn attr_at(&self, column: u16) -> TextAttribute {
        if self.width == 0 {
            return TextAttribute::default();
        }
        self.attr
            .get(self.clamped_col(column))
            .copied()
            .unwrap_or_default()
    }

    /// Overwrite the attributes of columns `[begin, end)`.
    pub fn replace_attributes(&mut self, begin: u16, end: u16, attr: &TextAttribute) {
        self.attr.replace(
            self.clamped_col_inclusive(begin),
            self.clamped_col_inclusive(end),
            *attr,
        );
    }

    /// Overwrite the attributes of every column from `begin` to the end of
    /// the row.
    pub fn set_attr_to_end(&mut self, begin: u16, attr: &TextAttribute) {
        let begin = self.clamped_col_inclusive(begin);
        self.attr.replace(begin, self.attr.total(), *attr);
    }

    /// Adopt `attr` as this row's attribute store, resized to `new_width`
    /// columns. Used when row contents move between rows of different widths.
    pub fn transfer_attributes(&mut self, attr: &RunLength<TextAttribute>, new_width: u16) {
        if attr.is_empty() {
            self.attr = RunLength::new(new_width, TextAttribute::default());
        } else {
            let mut attr = attr.clone();
            attr.resize_trailing_extent(new_width);
            self.attr = attr;
        }
    }

    /// The distinct hyperlink identifiers present in this row's attributes.
    #[must_use]
    pub fn hyperlinks(&self) -> Vec<u16> {
        let mut ids = Vec::new();
        for run in self.attr.runs() {
            let id = run.value.hyperlink_id();
            if run.value.is_hyperlink() && !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    // ── Writes ──────────────────────────────────────────────────────

    /// Clear one cell stack to a space.
    pub fn clear_cell(&mut self, column: u16) -> Result<()> {
        let mut text: &[u16] = &[SPACE];
        self.replace_characters(column, column.saturating_add(1), &mut text)?;
        Ok(())
    }

    /// Replace the cells from `column_begin` onward with the leading portion
    /// of `text`, segmented into grapheme clusters and measured in columns.
    ///
    /// `column_begin` and `column_end` are clamped to `[0, width]`;
    /// `column_begin >= column_end` or empty `text` is a no-op. Writing stops
    /// at the end of the row (or when `text` runs out); on return `text`
    /// holds the unconsumed suffix so a streaming caller can continue on the
    /// next row. A wide glyph that no longer fits is left unconsumed, the
    /// remaining cell is padded with a space, and
    /// [`dbcs_padded`](Self::dbcs_padded) is set. Wide glyphs partially
    /// covered by the write are evicted whole, their severed cells padded
    /// with spaces.
    ///
    /// Returns the first column past the last cell written.
    ///
    /// # Errors
    ///
    /// [`RowError::MalformedUtf16`] on ill-formed input,
    /// [`RowError::OutOfMemory`] when the char buffer cannot grow. In both
    /// cases the row has been reset to blank cells with the default
    /// attribute before the error is returned.
    pub fn replace_characters(
        &mut self,
        column_begin: u16,
        column_end: u16,
        text: &mut &[u16],
    ) -> Result<u16> {
        match self.replace_characters_inner(column_begin, column_end, text) {
            Ok(col) => Ok(col),
            Err(err) => {
                // The offset table is rewritten before the char buffer is
                // filled, so the intermediate state may index past the text.
                warn!(error = %err, "edit failed, resetting row");
                self.reset(&TextAttribute::default());
                Err(err)
            }
        }
    }

    fn replace_characters_inner(
        &mut self,
        column_begin: u16,
        column_end: u16,
        text: &mut &[u16],
    ) -> Result<u16> {
        let col_beg = self.clamped_col_inclusive(column_begin);
        let col_end = self.clamped_col_inclusive(column_end);
        let input: &[u16] = text;

        if col_beg >= col_end || input.is_empty() {
            return Ok(col_beg);
        }

        // Writing into the trailing half of a wide glyph evicts the whole
        // glyph: extend the range leftward to its leading cell. The columns
        // crossed become single pad spaces.
        let ch_ext_beg = self.offsets.offset(col_beg);
        let mut col_ext_beg = col_beg;
        while col_ext_beg != 0 && self.offsets.is_trailer(col_ext_beg) {
            col_ext_beg -= 1;
        }
        let leading_spaces = col_beg - col_ext_beg;

        // `ch1`/`ch2` and `col_beg`/`col2` delimit the consumed text and the
        // written columns as the fill advances.
        let ch1 = ch_ext_beg + leading_spaces;
        let mut ch2 = ch1;
        let mut col2 = col_beg;
        let mut padding_spaces: u16 = 0;
        let mut consumed = 0usize;

        // ASCII fast pass: one column per code unit, no segmentation.
        let ascii_cap = ((self.width - col2) as usize)
            .min(input.len())
            .min(MAX_ROW_TEXT.saturating_sub(ch2 as usize));
        while consumed < ascii_cap && input[consumed] < 0x80 {
            self.offsets.set(col2, ch2);
            consumed += 1;
            col2 += 1;
            ch2 += 1;
        }

        // Stopping before the cap means a non-ASCII unit is in reach: the
        // rest needs real segmentation.
        if consumed < ascii_cap {
            // The last ASCII unit may belong to the next cluster (a combining
            // mark follows); back off one unit and let the segmenter decide.
            let backed_off = consumed != 0;
            if backed_off {
                consumed -= 1;
                col2 -= 1;
                ch2 -= 1;
            }

            let width = self.width;
            let offsets = &mut self.offsets;
            let dbcs_padded = &mut self.dbcs_padded;
            with_segmenter(|seg| -> Result<()> {
                let mut wrote_cluster = false;
                for cluster in seg.clusters(&input[consumed..])? {
                    let advance = cluster.units;
                    let glyph_width = cluster_width(cluster.text, AmbiguousWidth::Narrow);

                    if glyph_width > width - col2 {
                        // A wide glyph with one column left: pad that column
                        // and leave the glyph for the caller's next row.
                        *dbcs_padded = true;
                        padding_spaces = 1;
                        break;
                    }
                    if ch2 as usize + advance > MAX_ROW_TEXT {
                        if backed_off && !wrote_cluster {
                            // Re-commit the backed-off unit as its own cell;
                            // its offset entry is already in place.
                            consumed += 1;
                            col2 += 1;
                            ch2 += 1;
                        }
                        break;
                    }

                    offsets.set(col2, ch2);
                    col2 += 1;
                    if glyph_width == 2 {
                        offsets.set_trailer(col2, ch2);
                        col2 += 1;
                    }
                    wrote_cluster = true;

                    consumed += advance;
                    ch2 += advance as u16;

                    if col2 == width {
                        break;
                    }
                }
                Ok(())
            })?;
        }

        // Extend rightward over a wide glyph clipped by the write: its
        // surviving trailer cells also become pad spaces.
        let mut col3 = col2 + padding_spaces;
        while self.offsets.is_trailer(col3) {
            col3 += 1;
        }
        let ch3 = self.offsets.offset(col3);
        let trailing_spaces = col3 - col2;

        let copied = (ch2 - ch1) as usize;
        debug_assert_eq!(copied, consumed);
        let inserted = copied + leading_spaces as usize + trailing_spaces as usize;
        let ch3_new = ch_ext_beg as usize + inserted;

        if ch3_new != ch3 as usize {
            self.resize_chars(col3, ch_ext_beg, ch3, ch3_new)?;
        }

        // Physical emit: pad spaces, the consumed prefix of the input, pad
        // spaces — and ascending offsets for the pad columns (one unit each).
        let pad = ch_ext_beg as usize;
        self.chars[pad..pad + leading_spaces as usize].fill(SPACE);
        self.offsets.fill_ascending(col_ext_beg..col_beg, ch_ext_beg);

        self.chars[ch1 as usize..ch1 as usize + copied].copy_from_slice(&input[..copied]);

        let pad = ch2 as usize;
        self.chars[pad..pad + trailing_spaces as usize].fill(SPACE);
        self.offsets.fill_ascending(col2..col3 + 1, ch2);

        *text = &input[copied..];
        self.debug_validate();
        Ok(col3)
    }

    /// Shift the text following an edited range to its new position,
    /// reallocating when the buffer is too small, and rewrite the offsets of
    /// every column at or past the range end.
    fn resize_chars(
        &mut self,
        col_ext_end: u16,
        ch_ext_beg: u16,
        ch_ext_end_old: u16,
        ch_ext_end_new: usize,
    ) -> Result<()> {
        let old = ch_ext_end_old as usize;
        let current_len = self.chars.len();
        let new_len = current_len - old + ch_ext_end_new;

        if new_len <= self.chars.capacity() {
            if new_len > current_len {
                self.chars.resize(new_len, SPACE);
                self.chars.copy_within(old..current_len, ch_ext_end_new);
            } else {
                self.chars.copy_within(old..current_len, ch_ext_end_new);
                self.chars.truncate(new_len);
            }
        } else {
            let min_capacity = (current_len + (current_len >> 1)).min(OFFSET_MASK as usize);
            let new_capacity = new_len.max(min_capacity);
            trace!(new_capacity, "char buffer spilling to a larger allocation");

            let mut chars: Vec<u16> = Vec::new();
            chars
                .try_reserve_exact(new_capacity)
                .map_err(|_| RowError::OutOfMemory {
                    requested: new_capacity,
                })?;
            chars.extend_from_slice(&self.chars[..ch_ext_beg as usize]);
            // The gap is filled by the caller right after; spaces keep the
            // buffer well-formed in the meantime.
            chars.resize(ch_ext_end_new, SPACE);
            chars.extend_from_slice(&self.chars[old..current_len]);
            self.chars = chars;
        }

        self.offsets
            .shift_tail(col_ext_end, ch_ext_end_new as i32 - old as i32);
        Ok(())
    }

    /// Change the column count, keeping as many leading whole glyphs as fit.
    ///
    /// A wide glyph straddling the new right edge is discarded; new trailing
    /// cells are spaces. The attribute store's trailing run is stretched or
    /// truncated to the new width (`fill` seeds it only when the store is
    /// empty, i.e. the row had zero width).
    pub fn resize(&mut self, new_width: u16, fill: &TextAttribute) {
        let new_width = new_width.min(OFFSET_MASK);
        if new_width == self.width {
            return;
        }
        trace!(old_width = self.width, new_width, "resizing row");

        let mut cols_to_copy = new_width.min(self.width);
        // The offset at a trailer column is its glyph's start, so reading
        // before the backoff already excludes a glyph cut by the new edge.
        let chars_to_copy = self.offsets.offset(cols_to_copy);
        while cols_to_copy != 0 && self.offsets.is_trailer(cols_to_copy) {
            cols_to_copy -= 1;
        }
        let trailing_whitespace = new_width - cols_to_copy;

        let mut chars = Vec::with_capacity(
            (chars_to_copy as usize + trailing_whitespace as usize).max(new_width as usize),
        );
        chars.extend_from_slice(&self.chars[..chars_to_copy as usize]);
        chars.resize(chars_to_copy as usize + trailing_whitespace as usize, SPACE);

        let mut entries = Vec::with_capacity(new_width as usize + 1);
        entries.extend_from_slice(&self.offsets.as_slice()[..cols_to_copy as usize]);
        entries.extend((0..=trailing_whitespace).map(|i| chars_to_copy + i));

        self.chars = chars;
        self.offsets = CharOffsets::from_entries(entries);
        self.width = new_width;

        if self.attr.is_empty() {
            self.attr = RunLength::new(new_width, *fill);
        } else {
            self.attr.resize_trailing_extent(new_width);
        }
        self.debug_validate();
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Clamp a column argument into `[0, width)`.
    fn clamped_col(&self, col: u16) -> u16 {
        col.min(self.width.saturating_sub(1))
    }

    /// Clamp a column argument into `[0, width]`.
    fn clamped_col_inclusive(&self, col: u16) -> u16 {
        col.min(self.width)
    }

    #[inline]
    fn debug_validate(&self) {
        if cfg!(debug_assertions) {
            debug_assert_eq!(self.offsets.offset(0), 0);
            debug_assert!(!self.offsets.is_trailer(0));
            debug_assert!(!self.offsets.is_trailer(self.width));
            debug_assert_eq!(self.offsets.char_len() as usize, self.chars.len());
            for col in 1..=self.width {
                let prev = self.offsets.offset(col - 1);
                let cur = self.offsets.offset(col);
                debug_assert!(cur >= prev);
                if cur == prev {
                    debug_assert!(self.offsets.is_trailer(col));
                }
            }
        }
    }
}

/// One cell stack yielded by [`Row::iter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowText<'a> {
    /// The stack's text: one grapheme cluster, or one pad space.
    pub text: &'a [u16],
    /// Columns covered: 1, or 2 for a wide glyph.
    pub cols: u16,
    /// `Leading` for a wide glyph, `Single` otherwise. Trailer cells are
    /// folded into their leading cell and never yielded on their own.
    pub dbcs: DbcsAttribute,
}

/// Forward-only iterator over a row's cell stacks.
#[derive(Debug, Clone)]
pub struct RowTextIter<'a> {
    chars: &'a [u16],
    offsets: &'a CharOffsets,
    col: u16,
}

impl<'a> Iterator for RowTextIter<'a> {
    type Item = RowText<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let chars: &'a [u16] = self.chars;
        let offsets: &'a CharOffsets = self.offsets;
        if self.col >= offsets.width() {
            return None;
        }
        let beg = self.col;
        let end = offsets.next_non_trailer(beg + 1);
        let text = &chars[offsets.offset(beg) as usize..offsets.offset(end) as usize];
        let cols = end - beg;
        self.col = end;
        Some(RowText {
            text,
            cols,
            dbcs: if cols == 2 {
                DbcsAttribute::Leading
            } else {
                DbcsAttribute::Single
            },
        })
    }
}
