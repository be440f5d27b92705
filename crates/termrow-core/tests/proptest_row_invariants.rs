//! Property-based invariant tests for the row engine.
//!
//! These verify structural invariants that must hold for arbitrary valid
//! inputs:
//!
//! 1. After any sequence of writes, the offset table is well-formed:
//!    first entry 0, sentinel equal to the packed text length, both
//!    flag-free, offsets monotone with equality only on trailer entries.
//! 2. The attribute runs always sum to the row width.
//! 3. Round-trip: filling a row and summing the iterator's column spans
//!    yields exactly the row width.
//! 4. Idempotence: repeating a write reproduces an identical row.
//! 5. Resize to the same width is a no-op; resize in general keeps the
//!    offset table well-formed.
//! 6. Stream extraction matches the concatenated row texts.

use proptest::prelude::*;

use termrow_core::{
    BufferTextStream, Row, RowError, TextAttribute, TextSource, OFFSET_MASK, TRAILER_FLAG,
};

// ── Strategies ──────────────────────────────────────────────────────────

/// Unicode text with a mix of ASCII, CJK, emoji, and combining marks.
fn arb_mixed_text(max_len: usize) -> impl Strategy<Value = String> {
    let ascii = prop::collection::vec(0x20u8..=0x7E, 0..max_len)
        .prop_map(|v| String::from_utf8(v).unwrap());
    let mixed = prop::collection::vec(
        prop_oneof![
            Just("a".to_string()),
            Just("hello".to_string()),
            Just(" ".to_string()),
            Just("\u{4e16}".to_string()),                 // CJK '世'
            Just("\u{754c}".to_string()),                 // CJK '界'
            Just("\u{1f600}".to_string()),                // emoji
            Just("e\u{0301}".to_string()),                // combining accent
            Just("\u{0915}\u{094d}\u{0937}".to_string()), // Devanagari conjunct
        ],
        0..max_len,
    )
    .prop_map(|v| v.join(""));

    prop_oneof![ascii, mixed]
}

fn arb_width() -> impl Strategy<Value = u16> {
    1u16..=40
}

/// A sequence of (column_begin, text) writes.
fn arb_writes(max_ops: usize) -> impl Strategy<Value = Vec<(u16, String)>> {
    prop::collection::vec((0u16..=48, arb_mixed_text(12)), 1..max_ops)
}

fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

/// Assert every structural invariant of a row's offset table and attributes.
fn assert_row_invariants(row: &Row) {
    let offsets = row.char_offsets();
    let width = row.width() as usize;
    assert_eq!(offsets.len(), width + 1);

    assert_eq!(offsets[0], 0, "first offset must be 0 and flag-free");
    assert_eq!(
        offsets[width] & TRAILER_FLAG,
        0,
        "sentinel must never be a trailer"
    );
    assert_eq!(
        (offsets[width] & OFFSET_MASK) as usize,
        row.text().len(),
        "sentinel must equal the packed text length"
    );

    for col in 1..=width {
        let prev = offsets[col - 1] & OFFSET_MASK;
        let cur = offsets[col] & OFFSET_MASK;
        assert!(cur >= prev, "offsets must be monotone at column {col}");
        if cur == prev {
            assert_ne!(
                offsets[col] & TRAILER_FLAG,
                0,
                "equal offsets require the trailer flag at column {col}"
            );
        }
    }

    let attr_total: u16 = row.attributes().runs().iter().map(|r| r.length).sum();
    assert_eq!(attr_total, row.attributes().total());
    assert_eq!(row.attributes().total(), row.width());
}

// ═════════════════════════════════════════════════════════════════════════
// 1+2. Offset and attribute invariants survive arbitrary write sequences
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn invariants_hold_after_any_write_sequence(
        width in arb_width(),
        writes in arb_writes(8),
    ) {
        let mut row = Row::new(width, &TextAttribute::default());
        for (col, text) in writes {
            let units = utf16(&text);
            let mut rest: &[u16] = &units;
            row.replace_characters(col, width, &mut rest).unwrap();
            assert_row_invariants(&row);
        }
    }

    #[test]
    fn streaming_writes_consume_monotonically(
        width in arb_width(),
        text in arb_mixed_text(24),
    ) {
        // Drive one long input through the row the way a streaming caller
        // would: each call must make progress or leave the input for the
        // next row.
        let mut row = Row::new(width, &TextAttribute::default());
        let units = utf16(&text);
        let mut rest: &[u16] = &units;
        let mut col = 0u16;
        while !rest.is_empty() && col < width {
            let before = rest.len();
            col = row.replace_characters(col, width, &mut rest).unwrap();
            assert_row_invariants(&row);
            if rest.len() == before {
                // No progress: a glyph that cannot fit in the remaining
                // columns. The row must say so.
                prop_assert!(col == width || row.dbcs_padded());
                break;
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Round-trip: iterator column spans cover the width exactly
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn iterator_spans_sum_to_width(
        width in arb_width(),
        text in arb_mixed_text(16),
    ) {
        let mut row = Row::new(width, &TextAttribute::default());
        let units = utf16(&text);
        let mut rest: &[u16] = &units;
        row.replace_characters(0, width, &mut rest).unwrap();

        let total: u16 = row.iter().map(|t| t.cols).sum();
        prop_assert_eq!(total, width);

        // Every yielded stack covers 1 or 2 columns, never more.
        for stack in row.iter() {
            prop_assert!(stack.cols == 1 || stack.cols == 2);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn repeated_write_is_idempotent(
        width in arb_width(),
        col in 0u16..=8,
        text in arb_mixed_text(10),
    ) {
        let mut row = Row::new(width, &TextAttribute::default());
        let units = utf16(&text);

        let mut rest: &[u16] = &units;
        row.replace_characters(col, width, &mut rest).unwrap();
        let first = row.clone();

        let mut rest: &[u16] = &units;
        row.replace_characters(col, width, &mut rest).unwrap();
        prop_assert_eq!(row, first);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Resize
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn resize_to_same_width_is_noop(
        width in arb_width(),
        text in arb_mixed_text(10),
    ) {
        let mut row = Row::new(width, &TextAttribute::default());
        let units = utf16(&text);
        let mut rest: &[u16] = &units;
        row.replace_characters(0, width, &mut rest).unwrap();

        let before = row.clone();
        row.resize(width, &TextAttribute::default());
        prop_assert_eq!(row, before);
    }

    #[test]
    fn resize_keeps_invariants(
        width in arb_width(),
        new_width in 0u16..=48,
        text in arb_mixed_text(10),
    ) {
        let mut row = Row::new(width, &TextAttribute::default());
        let units = utf16(&text);
        let mut rest: &[u16] = &units;
        row.replace_characters(0, width, &mut rest).unwrap();

        row.resize(new_width, &TextAttribute::default());
        prop_assert_eq!(row.width(), new_width);
        if new_width > 0 {
            assert_row_invariants(&row);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Stream extraction matches the concatenated rows
// ═════════════════════════════════════════════════════════════════════════

struct RowBuffer(Vec<Row>);

impl TextSource for RowBuffer {
    fn row_count(&self) -> usize {
        self.0.len()
    }

    fn row_text(&self, row: usize) -> &[u16] {
        self.0[row].text()
    }
}

proptest! {
    #[test]
    fn extract_matches_concatenation(
        texts in prop::collection::vec(arb_mixed_text(8), 1..5),
        width in arb_width(),
    ) {
        let mut rows = Vec::new();
        let mut concat: Vec<u16> = Vec::new();
        for text in &texts {
            let mut row = Row::new(width, &TextAttribute::default());
            let units = utf16(text);
            let mut rest: &[u16] = &units;
            row.replace_characters(0, width, &mut rest).unwrap();
            concat.extend_from_slice(row.text());
            rows.push(row);
        }

        let buffer = RowBuffer(rows);
        let mut stream = BufferTextStream::new(&buffer);
        prop_assert_eq!(stream.native_length(), concat.len());

        let start = concat.len() / 3;
        let limit = concat.len();
        let mut dest = vec![0u16; limit - start];
        let n = stream.extract(start, limit, &mut dest).unwrap();
        prop_assert_eq!(n, limit - start);
        prop_assert_eq!(&dest[..], &concat[start..limit]);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Error path: invariants hold even after a rejected write
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn malformed_input_leaves_a_valid_row(
        width in arb_width(),
        prefix in arb_mixed_text(6),
    ) {
        let mut row = Row::new(width, &TextAttribute::default());
        let mut units = utf16(&prefix);
        units.push(0xD800); // unpaired high surrogate
        units.push(0x0301); // a combining mark keeps the tail non-ASCII
        let mut rest: &[u16] = &units;

        match row.replace_characters(0, width, &mut rest) {
            Ok(_) => {}
            Err(err) => {
                let is_malformed = matches!(err, RowError::MalformedUtf16 { .. });
                prop_assert!(is_malformed);
                // Reset state: all spaces.
                prop_assert!(!row.contains_text());
            }
        }
        assert_row_invariants(&row);
    }
}
