//! Tabular upload decoding.
//!
//! # Responsibility
//! - Decode CSV and spreadsheet bytes into `RawRecord`s.
//! - Normalize both formats to the same record shape.
//!
//! # Invariants
//! - The first row is the header row; header matching is case-sensitive.
//! - Output order equals source row order; blank rows are skipped.
//! - Empty cells are treated as absent fields.
//! - CSV fields are decoded lossily; only structural errors are malformed.

use super::{ImportError, ImportResult, RecordFormat};
use crate::model::contact::{CellValue, RawRecord};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use log::{error, info};
use std::io::Cursor;
use std::time::Instant;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes `bytes` in the given format into ordered raw records.
///
/// # Errors
/// - `ImportError::MalformedInput` when the bytes are not decodable as the
///   declared format.
pub fn parse_records(bytes: &[u8], format: RecordFormat) -> ImportResult<Vec<RawRecord>> {
    let started_at = Instant::now();
    let result = match format {
        RecordFormat::Csv => parse_csv(bytes),
        RecordFormat::Spreadsheet => parse_spreadsheet(bytes),
    };

    match &result {
        Ok(records) => info!(
            "event=upload_parse module=import status=ok format={} bytes={} rows={} duration_ms={}",
            format.as_str(),
            bytes.len(),
            records.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=upload_parse module=import status=error format={} bytes={} duration_ms={} error={}",
            format.as_str(),
            bytes.len(),
            started_at.elapsed().as_millis(),
            err
        ),
    }

    result
}

fn parse_csv(bytes: &[u8]) -> ImportResult<Vec<RawRecord>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    // invalid UTF-8 becomes U+FFFD; encoding never drops a row
    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|err| ImportError::MalformedInput(format!("unreadable csv header: {err}")))?
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect();

    let mut records = Vec::new();
    for (index, row) in reader.byte_records().enumerate() {
        let row = row
            .map_err(|err| ImportError::MalformedInput(format!("unreadable csv row: {err}")))?;
        if row.iter().all(<[u8]>::is_empty) {
            continue;
        }

        let row_number = row
            .position()
            .map_or(index + 2, |position| position.line() as usize);
        let mut record = RawRecord::new(row_number);
        for (header, field) in headers.iter().zip(row.iter()) {
            if !field.is_empty() {
                let value = String::from_utf8_lossy(field).into_owned();
                record.set_column(header, CellValue::Text(value));
            }
        }
        records.push(record);
    }

    Ok(records)
}

fn parse_spreadsheet(bytes: &[u8]) -> ImportResult<Vec<RawRecord>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| ImportError::MalformedInput(format!("unreadable spreadsheet: {err}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::MalformedInput("spreadsheet has no worksheets".to_string()))?
        .map_err(|err| ImportError::MalformedInput(format!("unreadable worksheet: {err}")))?;

    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows = range.rows();
    let headers: Vec<Option<String>> = match rows.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::new();
    for (index, row) in rows.enumerate() {
        let cells: Vec<Option<CellValue>> = row.iter().map(cell_value).collect();
        if cells.iter().all(Option::is_none) {
            continue;
        }

        // header row is `first_row`, data starts one below; row numbers are 1-based
        let mut record = RawRecord::new(first_row + index + 2);
        for (header, cell) in headers.iter().zip(cells) {
            if let (Some(header), Some(cell)) = (header, cell) {
                record.set_column(header, cell);
            }
        }
        records.push(record);
    }

    Ok(records)
}

fn header_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(value) if value.is_empty() => None,
        Data::String(value) => Some(value.clone()),
        other => Some(other.to_string()),
    }
}

fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(value) if value.is_empty() => None,
        Data::String(value) => Some(CellValue::Text(value.clone())),
        Data::Int(value) => Some(CellValue::Number(*value as f64)),
        Data::Float(value) => Some(CellValue::Number(*value)),
        Data::Bool(value) => Some(CellValue::Bool(*value)),
        Data::DateTimeIso(value) | Data::DurationIso(value) => {
            Some(CellValue::Other(value.clone()))
        }
        Data::DateTime(_) | Data::Error(_) => Some(CellValue::Other(cell.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_records;
    use crate::import::{ImportError, RecordFormat};
    use crate::model::contact::CellValue;

    fn text(value: &str) -> Option<CellValue> {
        Some(CellValue::Text(value.to_string()))
    }

    #[test]
    fn csv_rows_map_known_columns_in_order() {
        let input = b"FirstName,Phone,Notes,Email\nJo,555,call after 5,jo@example.com\nAnn,556,,\n";
        let records = parse_records(input, RecordFormat::Csv).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].first_name, text("Jo"));
        assert_eq!(records[0].phone, text("555"));
        assert_eq!(records[0].notes, text("call after 5"));
        assert_eq!(records[0].row_number, 2);
        assert_eq!(records[1].first_name, text("Ann"));
        assert_eq!(records[1].notes, None);
        assert_eq!(records[1].row_number, 3);
    }

    #[test]
    fn csv_strips_bom_and_skips_blank_rows() {
        let input = b"\xEF\xBB\xBFFirstName,Phone\nJo,555\n,\n\nAnn,556\n";
        let records = parse_records(input, RecordFormat::Csv).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].first_name, text("Jo"));
        assert_eq!(records[1].first_name, text("Ann"));
    }

    #[test]
    fn csv_tolerates_ragged_rows() {
        let input = b"FirstName,Phone,Notes\nJo\nAnn,556,a,extra\n";
        let records = parse_records(input, RecordFormat::Csv).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].phone, None);
        assert_eq!(records[1].notes, text("a"));
    }

    #[test]
    fn csv_duplicate_header_keeps_last_column() {
        let input = b"Phone,FirstName,Phone\n111,Jo,222\n";
        let records = parse_records(input, RecordFormat::Csv).unwrap();
        assert_eq!(records[0].phone, text("222"));
    }

    #[test]
    fn csv_empty_input_yields_no_records() {
        assert!(parse_records(b"", RecordFormat::Csv).unwrap().is_empty());
        assert!(parse_records(b"FirstName,Phone\n", RecordFormat::Csv)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn csv_invalid_utf8_is_decoded_lossily_and_keeps_rows() {
        let input = b"FirstName,Phone,Notes\nJo,555,caf\xe9\nAnn,556,ok\n";
        let records = parse_records(input, RecordFormat::Csv).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].first_name, text("Jo"));
        assert_eq!(records[0].notes, text("caf\u{FFFD}"));
        assert_eq!(records[1].first_name, text("Ann"));
        assert_eq!(records[1].notes, text("ok"));
    }

    #[test]
    fn csv_non_utf8_header_still_maps_known_columns() {
        let input = b"FirstName,Phone,Not\xe9s\nJo,555,x\n";
        let records = parse_records(input, RecordFormat::Csv).unwrap();

        assert_eq!(records[0].first_name, text("Jo"));
        assert_eq!(records[0].notes, None);
    }

    #[test]
    fn garbage_spreadsheet_is_malformed() {
        let err = parse_records(b"definitely not a workbook", RecordFormat::Spreadsheet)
            .unwrap_err();
        assert!(matches!(err, ImportError::MalformedInput(_)));
    }
}
