//! Error types for the sakamichi-blog crate

use thiserror::Error;

use crate::crawler::CrawlError;
use crate::export::ExportError;
use crate::store::StoreError;

/// Result type for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for crate operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Crawling error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Persistence error
    #[error("Store error: {0}")]
    Store(String),

    /// Image export error
    #[error("Export error: {0}")]
    Export(String),
}

impl From<CrawlError> for Error {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::Http(e) => Error::Http(e),
            _ => Error::Crawl(err.to_string()),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(e) => Error::Io(e),
            _ => Error::Store(err.to_string()),
        }
    }
}

impl From<ExportError> for Error {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Io(e) => Error::Io(e),
            _ => Error::Export(err.to_string()),
        }
    }
}
