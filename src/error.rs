//! Error types for the xlsxpager library

use thiserror::Error;

/// Result type alias for xlsxpager operations
pub type Result<T> = std::result::Result<T, XlsxError>;

/// Main error type for all paged-read operations
#[derive(Error, Debug)]
pub enum XlsxError {
    /// Caller-supplied argument is unusable (blank path, zero page size, page 0)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The document violates the OOXML structure this reader relies on
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// The document or one of its parts cannot be opened or read
    #[error("Failed to read document: {0}")]
    Resource(String),

    /// Operation attempted after the session released its handles
    #[error("Reader session is closed")]
    Closed,

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for XlsxError {
    fn from(err: zip::result::ZipError) -> Self {
        XlsxError::Resource(err.to_string())
    }
}

impl From<quick_xml::Error> for XlsxError {
    fn from(err: quick_xml::Error) -> Self {
        XlsxError::MalformedDocument(err.to_string())
    }
}
