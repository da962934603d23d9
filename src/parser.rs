//! CSV parser for raw exam-sheet exports.

use csv::ReaderBuilder;
use std::io::Read;
use tracing::debug;

use crate::error::ReportError;
use crate::table::{Cell, RawSheet};

/// Decodes raw CSV bytes into an untyped [`RawSheet`].
///
/// No header row is assumed and records may have differing lengths.
///
/// # Errors
///
/// Returns [`ReportError::EmptyInput`] for empty or whitespace-only input and
/// [`ReportError::UnparsableInput`] for non-UTF-8 bytes or malformed CSV.
pub fn parse_sheet(bytes: &[u8]) -> Result<RawSheet, ReportError> {
    let content = std::str::from_utf8(bytes)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if content.trim().is_empty() {
        return Err(ReportError::EmptyInput);
    }

    let rows = read_records(content.as_bytes())?;
    if rows.is_empty() {
        return Err(ReportError::EmptyInput);
    }

    debug!(rows = rows.len(), "Parsed raw sheet");
    Ok(RawSheet::new(rows))
}

/// Reads every record from `input` as a row of cells.
fn read_records<R: Read>(input: R) -> Result<Vec<Vec<Cell>>, ReportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from_raw).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_bytes_is_empty_input() {
        let result = parse_sheet(&[]);
        assert!(matches!(result, Err(ReportError::EmptyInput)));
    }

    #[test]
    fn test_parse_whitespace_is_empty_input() {
        let result = parse_sheet(b"  \n\n  ");
        assert!(matches!(result, Err(ReportError::EmptyInput)));
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let invalid_bytes = vec![0xFF, 0xFE, 0x00, 0x01];
        let result = parse_sheet(&invalid_bytes);
        assert!(matches!(result, Err(ReportError::UnparsableInput(_))));
    }

    #[test]
    fn test_parse_ragged_rows() {
        let sheet = parse_sheet(b"a,b,c\n1,2\n\"x, y\",,z,w\n").unwrap();

        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.rows[1].len(), 2);
        assert_eq!(sheet.rows[2][0], Cell::Text("x, y".into()));
        assert_eq!(sheet.rows[2][1], Cell::Missing);
        assert_eq!(sheet.width(), 4);
    }

    #[test]
    fn test_parse_strips_bom() {
        let sheet = parse_sheet("\u{feff}Add.ID,Name\n".as_bytes()).unwrap();
        assert_eq!(sheet.rows[0][0], Cell::Text("Add.ID".into()));
    }

    #[test]
    fn test_read_records_invalid_field_is_unparsable() {
        let result = read_records(&b"Add.ID,Name\nA1,\xff\xfe\n"[..]);
        assert!(matches!(result, Err(ReportError::UnparsableInput(_))));
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("connection reset"))
        }
    }

    #[test]
    fn test_read_records_reader_error_is_unparsable() {
        match read_records(BrokenReader) {
            Err(ReportError::UnparsableInput(msg)) => assert!(msg.contains("connection reset")),
            other => panic!("expected UnparsableInput, got {:?}", other),
        }
    }
}
