//! Loader Module
//!
//! Bulk load of `;`-separated article dumps into a [`Database`].
//!
//! ## Line Format
//! ```text
//! id;title;year;authors;citations;updated_at;snippet
//! 1;"A ""quoted"" title";2019;"Doe, J.";12;2021-03-04 10:20:30;"..."
//! ```
//! - Fields may be wrapped in double quotes; `""` inside quotes is a literal quote
//! - `NULL` or an empty field becomes an empty string or zero
//! - `updated_at` is `YYYY-MM-DD HH:MM:SS` in UTC
//! - Text longer than its stored width is truncated at a char boundary

use std::io::BufRead;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::engine::{Database, InsertOutcome};
use crate::error::{RecError, Result};
use crate::record::{Record, AUTHORS_MAX, SNIPPET_MAX, TITLE_MAX};

/// Number of fields in one line
pub const FIELD_COUNT: usize = 7;

/// Timestamp layout of the `updated_at` field
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of a bulk load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records stored and indexed
    pub loaded: u64,

    /// Lines that could not be parsed
    pub skipped: u64,

    /// Parsed records rejected because their id is already stored
    pub duplicates: u64,

    /// Parsed records rejected because the data file is full
    pub rejected_full: u64,
}

/// Parse one line into a record
///
/// `line_no` is only used in error messages.
pub fn parse_line(line: &str, line_no: usize) -> Result<Record> {
    let fields = split_fields(line, line_no)?;
    if fields.len() != FIELD_COUNT {
        return Err(parse_error(
            line_no,
            format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
        ));
    }

    let id = match fields[0].as_deref() {
        Some(text) if !text.trim().is_empty() => parse_int::<i32>(text, "id", line_no)?,
        _ => return Err(parse_error(line_no, "missing id")),
    };

    Ok(Record {
        id,
        title: Record::fit_text(fields[1].as_deref().unwrap_or_default(), TITLE_MAX),
        year: parse_optional_int(fields[2].as_deref(), "year", line_no)?,
        authors: Record::fit_text(fields[3].as_deref().unwrap_or_default(), AUTHORS_MAX),
        citations: parse_optional_int(fields[4].as_deref(), "citations", line_no)?,
        updated_at: parse_timestamp(fields[5].as_deref(), line_no)?,
        snippet: Record::fit_text(fields[6].as_deref().unwrap_or_default(), SNIPPET_MAX),
    })
}

/// Load every line of `reader` into `db`
///
/// Malformed lines are logged and skipped; I/O and storage failures abort the
/// load. Input that is not valid UTF-8 is decoded lossily.
pub fn load_csv<R: BufRead>(db: &mut Database, mut reader: R) -> Result<LoadReport> {
    let mut report = LoadReport::default();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }

        let record = match parse_line(line, line_no) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping malformed line");
                report.skipped += 1;
                continue;
            }
        };

        match db.insert(&record)? {
            InsertOutcome::Stored(_) => report.loaded += 1,
            InsertOutcome::DuplicateId(_) => report.duplicates += 1,
            InsertOutcome::TableFull => report.rejected_full += 1,
        }

        if report.loaded > 0 && report.loaded % 10_000 == 0 {
            debug!(loaded = report.loaded, line = line_no, "load progress");
        }
    }

    info!(
        loaded = report.loaded,
        skipped = report.skipped,
        duplicates = report.duplicates,
        rejected_full = report.rejected_full,
        "load finished"
    );
    Ok(report)
}

// =============================================================================
// Field Parsing
// =============================================================================

/// Split a line on `;` outside quotes. `NULL` fields come back as `None`.
fn split_fields(line: &str, line_no: usize) -> Result<Vec<Option<String>>> {
    let mut fields = Vec::with_capacity(FIELD_COUNT);
    let mut current = String::new();
    let mut quoted = false;
    let mut was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if current.is_empty() && !was_quoted => {
                quoted = true;
                was_quoted = true;
            }
            ';' if !quoted => {
                fields.push(finish_field(&mut current, was_quoted));
                was_quoted = false;
            }
            _ => current.push(ch),
        }
    }

    if quoted {
        return Err(parse_error(line_no, "unterminated quoted field"));
    }
    fields.push(finish_field(&mut current, was_quoted));
    Ok(fields)
}

fn finish_field(current: &mut String, was_quoted: bool) -> Option<String> {
    let field = std::mem::take(current);
    if !was_quoted && field.trim() == "NULL" {
        None
    } else {
        Some(field)
    }
}

fn parse_int<T: std::str::FromStr>(text: &str, name: &str, line_no: usize) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| parse_error(line_no, format!("{} is not an integer: {:?}", name, text)))
}

fn parse_optional_int<T: std::str::FromStr + Default>(
    field: Option<&str>,
    name: &str,
    line_no: usize,
) -> Result<T> {
    match field {
        Some(text) if !text.trim().is_empty() => parse_int(text, name, line_no),
        _ => Ok(T::default()),
    }
}

fn parse_timestamp(field: Option<&str>, line_no: usize) -> Result<i64> {
    let text = match field {
        Some(text) if !text.trim().is_empty() => text.trim(),
        _ => return Ok(0),
    };

    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|e| parse_error(line_no, format!("bad timestamp {:?}: {}", text, e)))
}

fn parse_error(line: usize, reason: impl Into<String>) -> RecError {
    RecError::Parse {
        line,
        reason: reason.into(),
    }
}
