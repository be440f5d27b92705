#![forbid(unsafe_code)]

//! Row storage engine for a terminal text buffer.
//!
//! A terminal row must satisfy three contradictory demands at once: a fixed
//! column geometry (every column maps to exactly one displayable cell, wide
//! glyphs spanning two), variable-length glyph storage (a cell may hold an
//! arbitrarily long grapheme cluster, addressable by column in O(1)), and
//! in-place mutation under partial overwrites (clobbering half of a wide
//! glyph must leave whitespace, never a severed glyph).
//!
//! This crate reconciles them with a packed UTF-16 character buffer per row
//! plus a parallel column-offset index whose high bit marks wide-glyph
//! trailer cells — see [`Row`] and its write primitive
//! [`Row::replace_characters`] — alongside a run-length store of per-column
//! text attributes ([`RunLength`]) and a chunked, row-aligned text stream
//! over an enclosing buffer for search ([`BufferTextStream`]).
//!
//! The engine is single-threaded by design: rows are mutated under the
//! enclosing buffer's exclusion discipline, no operation blocks, and every
//! operation is bounded by the row width or the input length.

pub mod attr;
pub mod error;
pub mod offsets;
pub mod rle;
pub mod row;
pub mod segment;
pub mod stream;
pub mod width;

pub use attr::{Color, StyleFlags, TextAttribute};
pub use error::{Result, RowError};
pub use offsets::{CharOffsets, OFFSET_MASK, TRAILER_FLAG};
pub use rle::{Run, RunLength};
pub use row::{DbcsAttribute, DelimiterClass, LineRendition, Row, RowText, RowTextIter};
pub use segment::{with_segmenter, Segmenter};
pub use stream::{BufferTextStream, TextSource};
pub use width::{cluster_width, cluster_width_utf16, AmbiguousWidth};
