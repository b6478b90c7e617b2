//! Roster and staff/faculty directory sources.
//!
//! Both sources are comma-separated group exports with a header row. Fields
//! may be quoted, and quoted fields may contain commas or line breaks.
//!
//! Loading never fails from the caller's point of view: an unreadable or
//! unparsable export is logged and treated as empty, so a missing roster
//! authorizes nobody instead of stopping the process.

mod roster;
mod staff;

use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::error::{Error, Result};

pub use roster::{PublicUser, Roster, User};
pub use staff::StaffSet;

/// Normalize an identifier for lookup: trimmed and lower-cased.
#[must_use]
pub fn normalize_id(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Read every data row of an export, skipping the header row.
///
/// Blank lines are ignored and rows may have differing field counts.
/// Fields that are not valid UTF-8 are decoded with replacement characters,
/// and a row the parser rejects is skipped on its own. Only a failure to
/// read the underlying source is an error.
fn read_records<R: Read>(reader: R) -> std::result::Result<Vec<StringRecord>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in reader.byte_records() {
        match result {
            Ok(record) => records.push(decode_lossy(&record)),
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => return Err(err),
            Err(err) => debug!("Skipping unparsable export row: {}", err),
        }
    }
    Ok(records)
}

fn decode_lossy(record: &ByteRecord) -> StringRecord {
    record
        .iter()
        .map(|value| String::from_utf8_lossy(value).trim().to_string())
        .collect()
}

/// Open `path` and read its data rows, mapping failures to `MalformedSource`.
fn read_export(path: &Path) -> Result<Vec<StringRecord>> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::malformed_source(path, e.to_string()))?;
    read_records(file).map_err(|e| Error::malformed_source(path, e.to_string()))
}

/// A trimmed, non-empty field at `index`.
fn field(record: &StringRecord, index: usize) -> Option<&str> {
    record
        .get(index)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("  AbC1d "), "abc1d");
        assert_eq!(normalize_id("xyz"), "xyz");
        assert_eq!(normalize_id(""), "");
    }

    #[test]
    fn test_read_records_skips_header_and_blank_lines() {
        let data = "uid,mail\n\nab1c,ab1c@example.edu\n\n";
        let records = read_records(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(field(&records[0], 0), Some("ab1c"));
    }

    #[test]
    fn test_read_records_keeps_quoted_commas_and_newlines() {
        let data = "uid,name\n\"ab1c\",\"Smith, Jane\"\n\"cd2e\",\"Two\nLines\"\n";
        let records = read_records(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(field(&records[0], 1), Some("Smith, Jane"));
        assert_eq!(field(&records[1], 1), Some("Two\nLines"));
    }

    #[test]
    fn test_read_records_decodes_invalid_utf8_lossily() {
        let data: &[u8] = b"uid,name\nab1c,Ann\nzz9z,J\xf6rg\ncd2e,Cy\n";
        let records = read_records(data).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(field(&records[1], 0), Some("zz9z"));
        assert_eq!(field(&records[1], 1), Some("J\u{fffd}rg"));
        assert_eq!(field(&records[2], 1), Some("Cy"));
    }

    #[test]
    fn test_field_rejects_blank_values() {
        let record = StringRecord::from(vec!["ab1c", "   ", ""]);
        assert_eq!(field(&record, 0), Some("ab1c"));
        assert_eq!(field(&record, 1), None);
        assert_eq!(field(&record, 2), None);
        assert_eq!(field(&record, 9), None);
    }

    #[test]
    fn test_read_export_missing_file() {
        let err = read_export(Path::new("/nonexistent/export.csv")).unwrap_err();
        assert!(matches!(err, Error::MalformedSource { .. }));
    }
}
