//! Contact schema validation.
//!
//! # Invariants
//! - Emitted contacts always carry non-empty text `name` and `phone`.
//! - Rows failing the schema are dropped whole, never partially emitted.
//! - Values are taken verbatim; no trimming or normalization.

use super::{ImportError, ImportResult};
use crate::model::contact::{CellValue, RawRecord, ValidatedContact};
use log::debug;

/// Validates one raw record.
///
/// Returns `None` when `FirstName` or `Phone` is missing, empty, or not a
/// string-typed cell. `Notes` of any type is rendered to text; missing notes
/// become an empty string.
pub fn validate_record(record: RawRecord) -> Option<ValidatedContact> {
    let name = required_text(record.first_name.as_ref());
    let phone = required_text(record.phone.as_ref());

    match (name, phone) {
        (Some(name), Some(phone)) => Some(ValidatedContact {
            name: name.to_string(),
            phone: phone.to_string(),
            notes: record
                .notes
                .as_ref()
                .map(CellValue::to_display_string)
                .unwrap_or_default(),
        }),
        _ => {
            debug!(
                "event=record_rejected module=import row={} has_name={} has_phone={}",
                record.row_number,
                name.is_some(),
                phone.is_some()
            );
            None
        }
    }
}

/// Lazily filters raw records to validated contacts, keeping order.
pub fn validate_records<I>(records: I) -> impl Iterator<Item = ValidatedContact>
where
    I: IntoIterator<Item = RawRecord>,
{
    records.into_iter().filter_map(validate_record)
}

/// Collects validated contacts, failing when none survive.
///
/// # Errors
/// - `ImportError::NoValidRecords` when the filtered sequence is empty.
pub fn collect_valid_contacts<I>(records: I) -> ImportResult<Vec<ValidatedContact>>
where
    I: IntoIterator<Item = RawRecord>,
{
    let contacts: Vec<ValidatedContact> = validate_records(records).collect();
    if contacts.is_empty() {
        return Err(ImportError::NoValidRecords);
    }
    Ok(contacts)
}

fn required_text(cell: Option<&CellValue>) -> Option<&str> {
    cell.and_then(CellValue::as_text)
        .filter(|value| !value.is_empty())
}
