//! Tests for the record codec
//!
//! These tests verify:
//! - Encoded size and round trip of valid records
//! - Text bounds, NUL handling and UTF-8 checks
//! - Buffer size checks on both sides
//! - Title hashing and text fitting helpers
//! - Round trip of arbitrary in-bounds records

use proptest::prelude::*;
use recdb::record::{self, Record, AUTHORS_MAX, RECORD_SIZE, SNIPPET_MAX, TITLE_MAX};
use recdb::RecError;

// =============================================================================
// Helper Functions
// =============================================================================

fn full_record() -> Record {
    Record {
        id: 42,
        title: "Écoulements à surface libre".to_string(),
        year: 2019,
        authors: "Doe, J.; Roe, R.".to_string(),
        citations: 17,
        updated_at: 1_614_853_230,
        snippet: "We study free surface flows.".to_string(),
    }
}

fn max_record() -> Record {
    Record {
        id: i32::MIN,
        title: "t".repeat(TITLE_MAX),
        year: i32::MAX,
        authors: "a".repeat(AUTHORS_MAX),
        citations: -1,
        updated_at: i64::MIN,
        snippet: "s".repeat(SNIPPET_MAX),
    }
}

/// Text without NUL bytes, truncated to `max` bytes at a char boundary
fn arb_text(max: usize) -> impl Strategy<Value = String> {
    "[^\\x00]{0,400}".prop_map(move |text| Record::fit_text(&text, max))
}

fn arb_record() -> impl Strategy<Value = Record> {
    (
        any::<i32>(),
        arb_text(TITLE_MAX),
        any::<i32>(),
        arb_text(AUTHORS_MAX),
        any::<i32>(),
        any::<i64>(),
        arb_text(SNIPPET_MAX),
    )
        .prop_map(
            |(id, title, year, authors, citations, updated_at, snippet)| Record {
                id,
                title,
                year,
                authors,
                citations,
                updated_at,
                snippet,
            },
        )
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_record_size() {
    assert_eq!(RECORD_SIZE, 1497);
    assert_eq!(record::encode(&full_record()).unwrap().len(), RECORD_SIZE);
}

#[test]
fn test_roundtrip_full_record() {
    let original = full_record();
    let bytes = record::encode(&original).unwrap();

    assert_eq!(record::decode(&bytes).unwrap(), original);
}

#[test]
fn test_roundtrip_max_length_fields() {
    let original = max_record();
    let bytes = record::encode(&original).unwrap();

    assert_eq!(record::decode(&bytes).unwrap(), original);
}

#[test]
fn test_roundtrip_default_record() {
    let bytes = record::encode(&Record::default()).unwrap();

    assert!(bytes.iter().all(|&b| b == 0));
    assert_eq!(record::decode(&bytes).unwrap(), Record::default());
}

#[test]
fn test_encode_into_larger_buffer() {
    let mut buf = vec![0xAAu8; RECORD_SIZE + 10];
    record::encode_into(&full_record(), &mut buf).unwrap();

    assert_eq!(record::decode(&buf).unwrap(), full_record());
    // Bytes past the record are untouched
    assert!(buf[RECORD_SIZE..].iter().all(|&b| b == 0xAA));
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_encode_rejects_overlong_title() {
    let mut record = full_record();
    record.title = "x".repeat(TITLE_MAX + 1);

    assert!(matches!(record::encode(&record), Err(RecError::Codec(_))));
}

#[test]
fn test_encode_rejects_overlong_snippet() {
    let mut record = full_record();
    record.snippet = "x".repeat(SNIPPET_MAX + 1);

    assert!(matches!(record::validate(&record), Err(RecError::Codec(_))));
}

#[test]
fn test_encode_rejects_nul_in_text() {
    let mut record = full_record();
    record.authors = "a\0b".to_string();

    assert!(matches!(record::encode(&record), Err(RecError::Codec(_))));
}

#[test]
fn test_encode_rejects_short_buffer() {
    let mut buf = vec![0u8; RECORD_SIZE - 1];

    assert!(matches!(
        record::encode_into(&full_record(), &mut buf),
        Err(RecError::Codec(_))
    ));
}

#[test]
fn test_decode_rejects_short_buffer() {
    let bytes = record::encode(&full_record()).unwrap();

    assert!(matches!(
        record::decode(&bytes[..RECORD_SIZE - 1]),
        Err(RecError::Codec(_))
    ));
}

#[test]
fn test_decode_rejects_invalid_utf8() {
    let mut bytes = record::encode(&Record::new(1, "ab")).unwrap();
    // title slot starts right after the id
    bytes[4] = 0xFF;

    assert!(matches!(record::decode(&bytes), Err(RecError::Codec(_))));
}

// =============================================================================
// Helper Tests
// =============================================================================

#[test]
fn test_fit_text_truncates_on_char_boundary() {
    // 'é' is two bytes; a 3-byte budget holds "aé" but not "aéé"
    assert_eq!(Record::fit_text("aéé", 3), "aé");
    assert_eq!(Record::fit_text("short", 100), "short");
    assert_eq!(Record::fit_text("a\0b", 10), "ab");
}

#[test]
fn test_title_hash_is_fnv1a() {
    // FNV-1a 64 offset basis for the empty string
    assert_eq!(record::title_hash(""), 0xcbf2_9ce4_8422_2325u64 as i64);
    assert_eq!(record::title_hash("a"), 0xaf63_dc4c_8601_ec8cu64 as i64);
}

#[test]
fn test_title_hash_distinguishes_titles() {
    let a = Record::new(1, "Deep Learning");
    let b = Record::new(2, "Deep learning");

    assert_eq!(a.title_hash(), record::title_hash("Deep Learning"));
    assert_ne!(a.title_hash(), b.title_hash());
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Any record whose text fits its slot decodes to itself.
    #[test]
    fn prop_roundtrip_bounded_text(original in arb_record()) {
        let bytes = record::encode(&original).unwrap();

        prop_assert_eq!(bytes.len(), RECORD_SIZE);
        prop_assert!(original.title.len() <= TITLE_MAX);
        prop_assert_eq!(record::decode(&bytes).unwrap(), original);
    }
}
