//! Contact records flowing from upload to distribution.
//!
//! # Responsibility
//! - Define the fixed raw-record shape produced by the parser.
//! - Define the validated contact consumed by partitioning and persistence.
//!
//! # Invariants
//! - `ValidatedContact::name` and `ValidatedContact::phone` are never empty.

use serde::{Deserialize, Serialize};

/// Header of the contact name column.
pub const COLUMN_FIRST_NAME: &str = "FirstName";
/// Header of the contact phone column.
pub const COLUMN_PHONE: &str = "Phone";
/// Header of the optional notes column.
pub const COLUMN_NOTES: &str = "Notes";

/// One decoded cell, keeping the source cell type.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Dates, durations and error cells, in their display form.
    Other(String),
}

impl CellValue {
    /// Returns the content when this is a string-typed cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Renders any cell to its display string.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Text(value) | Self::Other(value) => value.clone(),
            Self::Number(value) => value.to_string(),
            Self::Bool(value) => value.to_string(),
        }
    }
}

/// One data row, reduced to the known contact columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// 1-based row number in the source, header included.
    pub row_number: usize,
    pub first_name: Option<CellValue>,
    pub phone: Option<CellValue>,
    pub notes: Option<CellValue>,
}

impl RawRecord {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            ..Self::default()
        }
    }

    /// Stores `value` under `column` if it is a known contact column.
    ///
    /// Later writes to the same column replace earlier ones.
    pub fn set_column(&mut self, column: &str, value: CellValue) {
        match column {
            COLUMN_FIRST_NAME => self.first_name = Some(value),
            COLUMN_PHONE => self.phone = Some(value),
            COLUMN_NOTES => self.notes = Some(value),
            _ => {}
        }
    }
}

/// Contact that passed schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedContact {
    pub name: String,
    pub phone: String,
    pub notes: String,
}
