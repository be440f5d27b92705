//! Grapheme segmentation over UTF-16 text.
//!
//! The row engine stores UTF-16 but the segmentation crates operate on
//! `&str`, so the segmenter transcodes into a reusable scratch buffer and
//! walks extended grapheme clusters from there. Cluster lengths are reported
//! back in UTF-16 code units so the caller can advance through its own
//! storage without a second decode.
//!
//! Transcoding is also where malformed input is caught: an unpaired
//! surrogate fails the whole call with
//! [`RowError::MalformedUtf16`](crate::RowError::MalformedUtf16) — the row
//! engine treats that as fatal for the current edit.
//!
//! # Lifecycle
//!
//! A [`Segmenter`] is cheap to create but its scratch buffer is worth
//! reusing, so the engine routes all calls through one thread-local instance
//! via [`with_segmenter`]. The segmenter holds no state across calls beyond
//! the scratch allocation.

use std::cell::RefCell;

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Result, RowError};

thread_local! {
    static SEGMENTER: RefCell<Segmenter> = RefCell::new(Segmenter::new());
}

/// Run `f` with this thread's shared segmenter.
pub fn with_segmenter<R>(f: impl FnOnce(&mut Segmenter) -> R) -> R {
    SEGMENTER.with(|cell| f(&mut cell.borrow_mut()))
}

/// Grapheme-cluster segmenter for UTF-16 slices.
#[derive(Debug, Default)]
pub struct Segmenter {
    scratch: String,
}

impl Segmenter {
    /// A fresh segmenter with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Segment `text` into extended grapheme clusters.
    ///
    /// Fails on ill-formed UTF-16; the iterator otherwise yields every
    /// cluster in order, each with its decoded text and its length in UTF-16
    /// code units.
    pub fn clusters(&mut self, text: &[u16]) -> Result<Clusters<'_>> {
        self.scratch.clear();
        let mut offset = 0usize;
        for unit in char::decode_utf16(text.iter().copied()) {
            match unit {
                Ok(ch) => {
                    self.scratch.push(ch);
                    offset += ch.len_utf16();
                }
                Err(_) => return Err(RowError::MalformedUtf16 { offset }),
            }
        }
        Ok(Clusters {
            inner: self.scratch.graphemes(true),
        })
    }

    /// The cluster boundary offsets of `text`, in UTF-16 code units.
    ///
    /// Yields `0 = b_0 < b_1 < … < b_n = text.len()`. For empty input the
    /// single boundary `0` is produced.
    pub fn boundaries(&mut self, text: &[u16]) -> Result<Boundaries<'_>> {
        Ok(Boundaries {
            clusters: self.clusters(text)?,
            pos: 0,
            start_emitted: false,
        })
    }
}

/// One extended grapheme cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cluster<'a> {
    /// The cluster's text, decoded.
    pub text: &'a str,
    /// The cluster's length in UTF-16 code units.
    pub units: usize,
}

/// Iterator over the clusters of one segmentation call.
#[derive(Debug)]
pub struct Clusters<'a> {
    inner: unicode_segmentation::Graphemes<'a>,
}

impl<'a> Iterator for Clusters<'a> {
    type Item = Cluster<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|g| Cluster {
            text: g,
            units: g.chars().map(char::len_utf16).sum(),
        })
    }
}

/// Iterator over cluster boundary offsets, in UTF-16 code units.
pub struct Boundaries<'a> {
    clusters: Clusters<'a>,
    pos: usize,
    start_emitted: bool,
}

impl Iterator for Boundaries<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if !self.start_emitted {
            self.start_emitted = true;
            return Some(0);
        }
        self.clusters.next().map(|c| {
            self.pos += c.units;
            self.pos
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16s(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn all_clusters(text: &str) -> Vec<(String, usize)> {
        let mut seg = Segmenter::new();
        seg.clusters(&u16s(text))
            .unwrap()
            .map(|c| (c.text.to_string(), c.units))
            .collect()
    }

    fn all_boundaries(text: &str) -> Vec<usize> {
        let mut seg = Segmenter::new();
        seg.boundaries(&u16s(text)).unwrap().collect()
    }

    #[test]
    fn ascii_clusters_one_unit_each() {
        assert_eq!(
            all_clusters("abc"),
            vec![
                ("a".to_string(), 1),
                ("b".to_string(), 1),
                ("c".to_string(), 1)
            ]
        );
    }

    #[test]
    fn combining_mark_joins_its_base() {
        let clusters = all_clusters("e\u{0301}f");
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0], ("e\u{0301}".to_string(), 2));
        assert_eq!(clusters[1], ("f".to_string(), 1));
    }

    #[test]
    fn surrogate_pair_is_two_units_one_cluster() {
        let clusters = all_clusters("\u{1F600}");
        assert_eq!(clusters, vec![("\u{1F600}".to_string(), 2)]);
    }

    #[test]
    fn zwj_sequence_is_one_cluster() {
        // Family emoji: three person scalars joined by ZWJ, 8 UTF-16 units.
        let family = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F466}";
        let clusters = all_clusters(family);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].1, 8);
    }

    #[test]
    fn boundaries_cover_start_and_end() {
        assert_eq!(all_boundaries("ab"), vec![0, 1, 2]);
        assert_eq!(all_boundaries("e\u{0301}f"), vec![0, 2, 3]);
        assert_eq!(all_boundaries(""), vec![0]);
    }

    #[test]
    fn unpaired_surrogate_is_rejected_with_offset() {
        let mut seg = Segmenter::new();
        let err = seg.clusters(&[0x61, 0xD800, 0x62]).unwrap_err();
        assert_eq!(err, crate::RowError::MalformedUtf16 { offset: 1 });
    }

    #[test]
    fn thread_local_segmenter_is_reusable() {
        let first = with_segmenter(|seg| seg.clusters(&u16s("ab")).unwrap().count());
        let second = with_segmenter(|seg| seg.clusters(&u16s("\u{4E16}")).unwrap().count());
        assert_eq!(first, 2);
        assert_eq!(second, 1);
    }
}
