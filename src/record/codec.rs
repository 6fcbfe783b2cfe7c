//! Record codec
//!
//! Fixed-width encode/decode of a [`Record`]. No framing and no version
//! byte: every record occupies exactly [`RECORD_SIZE`] bytes.

use bytes::{Buf, BufMut};

use crate::error::{RecError, Result};

use super::{Record, AUTHORS_MAX, RECORD_SIZE, SNIPPET_MAX, TITLE_MAX};

/// Encode a record into a freshly allocated buffer of [`RECORD_SIZE`] bytes
pub fn encode(record: &Record) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; RECORD_SIZE];
    encode_into(record, &mut buf)?;
    Ok(buf)
}

/// Encode a record into the first [`RECORD_SIZE`] bytes of `buf`
pub fn encode_into(record: &Record, buf: &mut [u8]) -> Result<()> {
    if buf.len() < RECORD_SIZE {
        return Err(RecError::Codec(format!(
            "encode buffer too small: {} bytes, need {}",
            buf.len(),
            RECORD_SIZE
        )));
    }

    validate(record)?;

    let mut out = &mut buf[..RECORD_SIZE];
    out.put_i32_le(record.id);
    put_text(&mut out, &record.title, TITLE_MAX);
    out.put_i32_le(record.year);
    put_text(&mut out, &record.authors, AUTHORS_MAX);
    out.put_i32_le(record.citations);
    out.put_i64_le(record.updated_at);
    put_text(&mut out, &record.snippet, SNIPPET_MAX);

    debug_assert!(out.is_empty());
    Ok(())
}

/// Check that every text field fits its slot
pub fn validate(record: &Record) -> Result<()> {
    check_text("title", &record.title, TITLE_MAX)?;
    check_text("authors", &record.authors, AUTHORS_MAX)?;
    check_text("snippet", &record.snippet, SNIPPET_MAX)
}

/// Decode a record from the first [`RECORD_SIZE`] bytes of `buf`
pub fn decode(buf: &[u8]) -> Result<Record> {
    if buf.len() < RECORD_SIZE {
        return Err(RecError::Codec(format!(
            "decode buffer too small: {} bytes, need {}",
            buf.len(),
            RECORD_SIZE
        )));
    }

    let mut input = &buf[..RECORD_SIZE];
    let id = input.get_i32_le();
    let title = get_text(&mut input, "title", TITLE_MAX)?;
    let year = input.get_i32_le();
    let authors = get_text(&mut input, "authors", AUTHORS_MAX)?;
    let citations = input.get_i32_le();
    let updated_at = input.get_i64_le();
    let snippet = get_text(&mut input, "snippet", SNIPPET_MAX)?;

    Ok(Record {
        id,
        title,
        year,
        authors,
        citations,
        updated_at,
        snippet,
    })
}

/// Write validated `text` into a zero-padded slot of `max + 1` bytes
fn put_text(out: &mut &mut [u8], text: &str, max: usize) {
    let bytes = text.as_bytes();
    out.put_slice(bytes);
    out.put_bytes(0, max + 1 - bytes.len());
}

fn check_text(field: &str, text: &str, max: usize) -> Result<()> {
    let bytes = text.as_bytes();
    if bytes.len() > max {
        return Err(RecError::Codec(format!(
            "{} is {} bytes, max {}",
            field,
            bytes.len(),
            max
        )));
    }
    if bytes.contains(&0) {
        return Err(RecError::Codec(format!("{} contains a NUL byte", field)));
    }
    Ok(())
}

/// Read a NUL-terminated slot of `max + 1` bytes
fn get_text(input: &mut &[u8], field: &str, max: usize) -> Result<String> {
    let slot = &input[..max + 1];
    let len = slot.iter().position(|&b| b == 0).ok_or_else(|| {
        RecError::Codec(format!("{} slot is not NUL terminated", field))
    })?;
    let text = std::str::from_utf8(&slot[..len])
        .map_err(|e| RecError::Codec(format!("{} is not valid UTF-8: {}", field, e)))?
        .to_string();

    input.advance(max + 1);
    Ok(text)
}
