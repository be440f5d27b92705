//! Error type for the row engine.
//!
//! Read operations never fail — they clamp their arguments into valid ranges.
//! Write operations fail fast; any error escaping
//! [`Row::replace_characters`](crate::Row::replace_characters) leaves the row
//! in a freshly-reset (all spaces, default attribute) state, because the
//! offset table is rewritten before the character buffer is filled.

use thiserror::Error;

/// Errors produced by the row engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowError {
    /// An argument was outside its valid range.
    #[error("argument out of range: {context}")]
    InvalidArgument {
        /// Which argument, and what was wrong with it.
        context: &'static str,
    },

    /// The input was not well-formed UTF-16 (an unpaired surrogate).
    ///
    /// Grapheme segmentation cannot proceed over such input. The write that
    /// triggered this has reset the row.
    #[error("malformed UTF-16 input: unpaired surrogate at code unit {offset}")]
    MalformedUtf16 {
        /// Offset of the offending code unit, in UTF-16 units from the start
        /// of the input slice.
        offset: usize,
    },

    /// The character buffer could not grow to hold the requested text.
    ///
    /// The write that triggered this has reset the row.
    #[error("char buffer allocation failed (requested {requested} code units)")]
    OutOfMemory {
        /// The capacity, in UTF-16 code units, that could not be reserved.
        requested: usize,
    },
}

/// Crate-local result alias.
pub type Result<T> = std::result::Result<T, RowError>;
