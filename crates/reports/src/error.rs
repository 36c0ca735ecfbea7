//! Report error types.

use thiserror::Error;

/// Errors that can occur while building a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Loading or authorizing the underlying data failed.
    #[error(transparent)]
    Domain(#[from] domain::DomainError),

    /// The workbook could not be written.
    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl From<store::StoreError> for ReportError {
    fn from(e: store::StoreError) -> Self {
        ReportError::Domain(e.into())
    }
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;
