//! Spreadsheet persistence errors.

use std::path::Path;

use thiserror::Error;

/// Errors raised while reading or writing workbook artifacts.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to read workbook {path}: {message}")]
    WorkbookRead { path: String, message: String },

    #[error("failed to write workbook {path}: {message}")]
    WorkbookWrite { path: String, message: String },

    #[error("worksheet '{0}' not found")]
    SheetMissing(String),

    #[error("roster needs a name column and a password column (or at least two columns)")]
    RosterColumns,

    #[error("student '{0}' not found in the exam workbook")]
    StudentMissing(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub(crate) fn read(path: &Path, message: impl ToString) -> Self {
        LedgerError::WorkbookRead {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn write(path: &Path, message: impl ToString) -> Self {
        LedgerError::WorkbookWrite {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}
