//! Error kinds surfaced by the report pipeline.

use thiserror::Error;

/// Terminal failures for a single run. Every variant is shown to the user
/// as-is; none of them are retried.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("input is empty, check the CSV file")]
    EmptyInput,
    #[error("input is not readable as CSV: {0}")]
    UnparsableInput(String),
    #[error("could not detect header row, ensure the file contains 'Add.ID' as a column name")]
    HeaderNotFound,
    #[error("required column not found: {0}")]
    MissingColumn(String),
    #[error("student not found: {0}")]
    StudentNotFound(String),
}

impl From<csv::Error> for ReportError {
    fn from(e: csv::Error) -> Self {
        ReportError::UnparsableInput(e.to_string())
    }
}

impl From<std::str::Utf8Error> for ReportError {
    fn from(e: std::str::Utf8Error) -> Self {
        ReportError::UnparsableInput(e.to_string())
    }
}
