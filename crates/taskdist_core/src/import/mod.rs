//! Upload decoding and contact validation.
//!
//! # Responsibility
//! - Resolve the declared upload format before touching the bytes.
//! - Decode tabular uploads into ordered `RawRecord`s.
//! - Filter raw records down to `ValidatedContact`s.
//!
//! # Invariants
//! - Source row order is preserved from bytes to validated contacts.
//! - Parsing never inspects field contents; validation never decodes bytes.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod parser;
pub mod validate;

pub use parser::parse_records;
pub use validate::{collect_valid_contacts, validate_record, validate_records};

pub type ImportResult<T> = Result<T, ImportError>;

/// Failures raised while turning an upload into validated contacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// Declared format is neither CSV nor a known spreadsheet container.
    UnsupportedFormat(String),
    /// Bytes could not be decoded as tabular data.
    MalformedInput(String),
    /// No row survived validation.
    NoValidRecords,
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat(declared) => {
                write!(f, "unsupported upload format `{declared}`; expected csv or spreadsheet")
            }
            Self::MalformedInput(reason) => write!(f, "malformed upload: {reason}"),
            Self::NoValidRecords => write!(f, "no valid records found in upload"),
        }
    }
}

impl Error for ImportError {}

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// Spreadsheet container (xlsx, xls, xlsm, xlsb, ods); first sheet only.
    Spreadsheet,
}

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];

const CSV_MIME_TYPES: &[&str] = &["text/csv", "application/csv", "text/comma-separated-values"];

const SPREADSHEET_MIME_TYPES: &[&str] = &[
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel.sheet.macroenabled.12",
    "application/vnd.ms-excel.sheet.binary.macroenabled.12",
    "application/vnd.oasis.opendocument.spreadsheet",
];

impl RecordFormat {
    /// Resolves a format from a MIME type, a file extension or a file name.
    ///
    /// Matching is case-insensitive. MIME parameters (`; charset=...`) are
    /// ignored.
    pub fn from_declared(declared: &str) -> ImportResult<Self> {
        let normalized = declared.trim().to_ascii_lowercase();

        if normalized.contains('/') {
            let essence = normalized.split(';').next().unwrap_or_default().trim();
            if CSV_MIME_TYPES.contains(&essence) {
                return Ok(Self::Csv);
            }
            if SPREADSHEET_MIME_TYPES.contains(&essence) {
                return Ok(Self::Spreadsheet);
            }
            return Err(ImportError::UnsupportedFormat(declared.to_string()));
        }

        let extension = normalized.rsplit('.').next().unwrap_or_default();
        if extension == "csv" {
            return Ok(Self::Csv);
        }
        if SPREADSHEET_EXTENSIONS.contains(&extension) {
            return Ok(Self::Spreadsheet);
        }
        Err(ImportError::UnsupportedFormat(declared.to_string()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Spreadsheet => "spreadsheet",
        }
    }
}
