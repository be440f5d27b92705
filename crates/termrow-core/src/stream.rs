//! Buffer-wide chunked text stream.
//!
//! Read-only adapter that stitches the rows of an enclosing text buffer into
//! one randomly-accessible stream of UTF-16 code units, chunked by row. The
//! search driver walks this stream instead of materializing the whole buffer.
//!
//! Chunks coincide with whole rows, and rows store complete grapheme
//! clusters, so chunk boundaries always fall on code-point boundaries.
//! Chunks are *stable* — the adapter never reshuffles them — but the total
//! length is expensive to compute (it needs a full walk), which the adapter
//! advertises via [`BufferTextStream::length_is_expensive`] until a walk has
//! pinned the length down.
//!
//! The adapter holds a read cursor only; the underlying buffer must not be
//! mutated during the stream's lifetime.

use crate::error::{Result, RowError};

/// Read access to the rows of an enclosing text buffer.
pub trait TextSource {
    /// Number of rows.
    fn row_count(&self) -> usize;

    /// The packed text of row `row`. `row` is `[0, row_count)`.
    fn row_text(&self, row: usize) -> &[u16];
}

/// Cursor over a [`TextSource`], exposing one row at a time as the current
/// chunk.
///
/// Cloning is shallow: the clone shares the source and copies the cursor
/// state.
#[derive(Debug)]
pub struct BufferTextStream<'a, S: TextSource + ?Sized> {
    source: &'a S,
    /// Row index of the current chunk.
    row: usize,
    /// Absolute offset of the current chunk's first code unit.
    chunk_start: usize,
    /// Absolute offset one past the current chunk's last code unit.
    chunk_limit: usize,
    /// Total code units across all rows, once known.
    total_units: Option<usize>,
}

impl<'a, S: TextSource + ?Sized> BufferTextStream<'a, S> {
    /// A stream positioned on the first row.
    pub fn new(source: &'a S) -> Self {
        let chunk_limit = if source.row_count() > 0 {
            source.row_text(0).len()
        } else {
            0
        };
        Self {
            source,
            row: 0,
            chunk_start: 0,
            chunk_limit,
            total_units: None,
        }
    }

    /// The text of the current chunk (one whole row).
    #[must_use]
    pub fn chunk(&self) -> &'a [u16] {
        if self.source.row_count() == 0 {
            return &[];
        }
        self.source.row_text(self.row)
    }

    /// Absolute offset of the current chunk's first code unit.
    #[must_use]
    pub fn chunk_start(&self) -> usize {
        self.chunk_start
    }

    /// Absolute offset one past the current chunk's last code unit.
    #[must_use]
    pub fn chunk_limit(&self) -> usize {
        self.chunk_limit
    }

    /// Total code units across all rows.
    ///
    /// Computed by a full walk on first use, then cached.
    pub fn native_length(&mut self) -> usize {
        if let Some(total) = self.total_units {
            return total;
        }
        let mut total = 0;
        for row in 0..self.source.row_count() {
            total += self.source.row_text(row).len();
        }
        self.total_units = Some(total);
        total
    }

    /// Whether [`native_length`](Self::native_length) still requires a full
    /// walk. Flips to `false` once any operation has pinned the length down.
    #[must_use]
    pub fn length_is_expensive(&self) -> bool {
        self.total_units.is_none()
    }

    /// Chunks never move or reshuffle for the lifetime of the stream.
    #[must_use]
    pub fn stable_chunks(&self) -> bool {
        true
    }

    /// Position the cursor on the chunk containing `native_index`.
    ///
    /// With `forward`, the resulting chunk satisfies
    /// `start <= native_index < limit`; otherwise
    /// `start < native_index <= limit`. Returns `false` — leaving the cursor
    /// at the nearest end of the stream — when no chunk qualifies.
    pub fn access(&mut self, native_index: usize, forward: bool) -> bool {
        let target = if forward {
            native_index
        } else {
            match native_index.checked_sub(1) {
                Some(t) => t,
                None => return false,
            }
        };

        if target >= self.chunk_start && target < self.chunk_limit {
            return true;
        }

        if target < self.chunk_start {
            let mut start = self.chunk_start;
            let mut y = self.row;
            while y > 0 {
                y -= 1;
                let text = self.source.row_text(y);
                let limit = start;
                start -= text.len();
                if target >= start {
                    self.row = y;
                    self.chunk_start = start;
                    self.chunk_limit = limit;
                    return true;
                }
            }
            false
        } else {
            let row_count = self.source.row_count();
            let mut limit = self.chunk_limit;
            let mut y = self.row;
            while y + 1 < row_count {
                y += 1;
                let text = self.source.row_text(y);
                let start = limit;
                limit += text.len();
                self.row = y;
                self.chunk_start = start;
                self.chunk_limit = limit;
                if target < limit {
                    return true;
                }
            }
            // Walked off the end: the total length is now known.
            self.total_units = Some(limit);
            false
        }
    }

    /// Copy the half-open range `[native_start, native_limit)` into `dest`.
    ///
    /// Returns the number of code units the range holds — the amount that
    /// *would* have been written — even when `dest` is smaller (pass an
    /// empty `dest` to preflight). Out-of-range bounds are clamped to the
    /// stream's end.
    ///
    /// # Errors
    ///
    /// [`RowError::InvalidArgument`] when `native_start > native_limit`.
    pub fn extract(
        &mut self,
        native_start: usize,
        native_limit: usize,
        dest: &mut [u16],
    ) -> Result<usize> {
        if native_start > native_limit {
            return Err(RowError::InvalidArgument {
                context: "extract range is inverted",
            });
        }
        if !self.access(native_start, true) {
            return Ok(0);
        }

        let row_count = self.source.row_count();
        let mut written = 0usize;
        let mut would_write = 0usize;
        let mut pos = self.chunk_start;
        let mut y = self.row;

        while y < row_count && pos < native_limit {
            let text = self.source.row_text(y);
            let row_end = pos + text.len();
            let s = native_start.max(pos);
            let e = native_limit.min(row_end);
            if e > s {
                let slice = &text[s - pos..e - pos];
                would_write += slice.len();
                let room = dest.len() - written;
                let n = slice.len().min(room);
                dest[written..written + n].copy_from_slice(&slice[..n]);
                written += n;
            }
            pos = row_end;
            y += 1;
        }

        if pos < native_limit {
            // Walked off the end: the total length is now known.
            self.total_units = Some(pos);
        }
        Ok(would_write)
    }
}

impl<S: TextSource + ?Sized> Clone for BufferTextStream<'_, S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source,
            row: self.row,
            chunk_start: self.chunk_start,
            chunk_limit: self.chunk_limit,
            total_units: self.total_units,
        }
    }
}
