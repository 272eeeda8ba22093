//! Line → record parsing.
//!
//! Two input layouts are accepted: plain NDJSON (one tweet object per line)
//! and the CouchDB view export, where rows sit one per line inside a JSON
//! array, separated by trailing commas, and the last row is followed by the
//! `]}` that closes the array and the envelope.

use serde::Deserialize;
use thiserror::Error;

use super::types::Record;

/// Language code Twitter uses when it could not detect one.
pub const UNDETERMINED: &str = "und";

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("coordinates need lng and lat, got {0} value(s)")]
    Coordinates(usize),
}

#[derive(Debug, Deserialize)]
struct Row {
    doc: Doc,
}

#[derive(Debug, Deserialize)]
struct Doc {
    coordinates: Option<Point>,
    metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
struct Point {
    coordinates: Vec<f64>, // [lng, lat]
}

#[derive(Debug, Deserialize)]
struct Metadata {
    iso_language_code: Option<String>,
}

fn trim_line(text: &str) -> &str {
    let t = text.trim();
    t.strip_suffix(',').unwrap_or(t)
}

fn parse_row(text: &str) -> Result<Row, RecordError> {
    match serde_json::from_str::<Row>(text) {
        Ok(row) => Ok(row),
        Err(err) => match text.strip_suffix("]}") {
            // last row of an array export
            Some(inner) => serde_json::from_str(inner).map_err(|_| err.into()),
            None => Err(err.into()),
        },
    }
}

/// Parse one raw line.
///
/// `Ok(None)` is a well-formed tweet that cannot be counted: no coordinates,
/// or no usable language. `Err` is a line that is not a tweet at all.
pub fn parse_line(raw: &[u8]) -> Result<Option<Record>, RecordError> {
    let text = trim_line(std::str::from_utf8(raw)?);
    if text.is_empty() {
        return Ok(None);
    }
    let row = parse_row(text)?;

    let (Some(point), Some(code)) = (
        row.doc.coordinates,
        row.doc.metadata.and_then(|m| m.iso_language_code),
    ) else {
        return Ok(None);
    };
    let (lng, lat) = match point.coordinates.as_slice() {
        [lng, lat, ..] => (*lng, *lat),
        other => return Err(RecordError::Coordinates(other.len())),
    };
    if code.is_empty() || code == UNDETERMINED {
        return Ok(None);
    }

    Ok(Some(Record {
        lng,
        lat,
        category: code,
    }))
}
