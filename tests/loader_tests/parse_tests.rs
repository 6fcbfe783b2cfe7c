//! Tests for the CSV loader
//!
//! These tests verify:
//! - Field parsing, quoting and NULL handling
//! - Timestamp parsing
//! - Truncation of overlong text
//! - Malformed lines reported with their line number
//! - Bulk loading with skipped, duplicate and rejected lines

use std::io::Cursor;

use recdb::loader::{load_csv, parse_line, LoadReport};
use recdb::record::{TITLE_MAX, SNIPPET_MAX};
use recdb::{Config, Database, RecError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_db(buckets: u64) -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .total_buckets(buckets)
        .build();
    let db = Database::open(config).unwrap();
    (temp_dir, db)
}

fn assert_parse_error(line: &str, expected_line: usize) {
    match parse_line(line, expected_line) {
        Err(RecError::Parse { line, .. }) => assert_eq!(line, expected_line),
        other => panic!("expected parse error for {:?}, got {:?}", line, other),
    }
}

// =============================================================================
// parse_line Tests
// =============================================================================

#[test]
fn test_parse_plain_line() {
    let record = parse_line(
        "12;Sparse Matrices;2004;Smith, A.;33;2021-03-04 10:20:30;Short abstract",
        1,
    )
    .unwrap();

    assert_eq!(record.id, 12);
    assert_eq!(record.title, "Sparse Matrices");
    assert_eq!(record.year, 2004);
    assert_eq!(record.authors, "Smith, A.");
    assert_eq!(record.citations, 33);
    assert_eq!(record.updated_at, 1_614_853_230);
    assert_eq!(record.snippet, "Short abstract");
}

#[test]
fn test_parse_quoted_fields() {
    let record = parse_line(
        r#""7";"Semi;colons and ""quotes""";"1999";"Doe, J.|Roe, R.";"0";"1970-01-01 00:00:00";"x""#,
        1,
    )
    .unwrap();

    assert_eq!(record.id, 7);
    assert_eq!(record.title, r#"Semi;colons and "quotes""#);
    assert_eq!(record.year, 1999);
    assert_eq!(record.authors, "Doe, J.|Roe, R.");
    assert_eq!(record.updated_at, 0);
    assert_eq!(record.snippet, "x");
}

#[test]
fn test_parse_null_and_empty_fields() {
    let record = parse_line("3;NULL;;NULL;NULL;NULL;", 1).unwrap();

    assert_eq!(record.id, 3);
    assert_eq!(record.title, "");
    assert_eq!(record.year, 0);
    assert_eq!(record.authors, "");
    assert_eq!(record.citations, 0);
    assert_eq!(record.updated_at, 0);
    assert_eq!(record.snippet, "");
}

#[test]
fn test_parse_truncates_long_text() {
    let line = format!("1;{};2000;a;1;;{}", "t".repeat(TITLE_MAX + 50), "s".repeat(SNIPPET_MAX * 2));

    let record = parse_line(&line, 1).unwrap();

    assert_eq!(record.title.len(), TITLE_MAX);
    assert_eq!(record.snippet.len(), SNIPPET_MAX);
}

#[test]
fn test_parse_rejects_malformed_lines() {
    // Wrong field counts
    assert_parse_error("1;title;2000", 4);
    assert_parse_error("1;a;2000;b;1;;c;extra", 5);
    // Missing or non-numeric id
    assert_parse_error("NULL;a;2000;b;1;;c", 6);
    assert_parse_error("abc;a;2000;b;1;;c", 7);
    // Non-numeric year and bad timestamp
    assert_parse_error("1;a;20x0;b;1;;c", 8);
    assert_parse_error("1;a;2000;b;1;04/03/2021;c", 9);
    // Unterminated quote
    assert_parse_error(r#"1;"a;2000;b;1;;c"#, 10);
}

// =============================================================================
// load_csv Tests
// =============================================================================

#[test]
fn test_load_csv_counts_outcomes() {
    let (_temp, mut db) = setup_temp_db(16);
    let input = "\
1;First;2001;A;1;2020-01-01 00:00:00;one\r
2;Second;2002;B;2;NULL;two

not;a;valid;line
3;\"Third; with separator\";2003;C;3;;three
";

    let report = load_csv(&mut db, Cursor::new(input)).unwrap();

    assert_eq!(
        report,
        LoadReport {
            loaded: 3,
            skipped: 1,
            duplicates: 0,
            rejected_full: 0,
        }
    );
    assert_eq!(db.get_by_id(1).unwrap().record.unwrap().snippet, "one");
    assert!(db.get_by_title("Third; with separator").unwrap().is_found());
    assert!(db.find_by_id(2).unwrap().is_found());
}

#[test]
fn test_load_csv_reports_full_table() {
    let (_temp, mut db) = setup_temp_db(1);
    let input: String = (1..=5).map(|id| format!("{};T{};2000;A;0;;s\n", id, id)).collect();

    let report = load_csv(&mut db, Cursor::new(input)).unwrap();

    // One bucket holds two records
    assert_eq!(report.loaded, 2);
    assert_eq!(report.rejected_full, 3);
    assert!(db.get_by_id(2).unwrap().is_found());
    assert!(!db.get_by_id(3).unwrap().is_found());
}

#[test]
fn test_load_csv_counts_duplicate_ids() {
    let (_temp, mut db) = setup_temp_db(16);
    let input = "\
5;Original;2001;A;1;;first
5;Replacement;2002;B;2;;second
6;Other;2003;C;3;;third
";

    let report = load_csv(&mut db, Cursor::new(input)).unwrap();

    assert_eq!(report.loaded, 2);
    assert_eq!(report.duplicates, 1);
    assert_eq!(db.find_by_id(5).unwrap().record.unwrap().title, "Original");
    assert_eq!(db.get_by_id(5).unwrap().record.unwrap().title, "Original");
    assert!(!db.get_by_title("Replacement").unwrap().is_found());
}

#[test]
fn test_load_csv_invalid_utf8_is_lossy() {
    let (_temp, mut db) = setup_temp_db(8);
    let mut input = b"9;Caf".to_vec();
    input.push(0xE9);
    input.extend_from_slice(b";2000;A;0;;s\n");

    let report = load_csv(&mut db, Cursor::new(input)).unwrap();

    assert_eq!(report.loaded, 1);
    assert_eq!(db.get_by_id(9).unwrap().record.unwrap().title, "Caf\u{FFFD}");
}
