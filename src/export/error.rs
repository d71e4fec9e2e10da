//! Error types for the export module

use thiserror::Error;

/// Error type for export operations
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid home page URL
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Error during semaphore acquisition
    #[error("Semaphore acquisition error: {0}")]
    Semaphore(String),

    /// Error during task joining
    #[error("Task join error: {0}")]
    TaskJoin(String),
}

impl From<tokio::sync::AcquireError> for ExportError {
    fn from(err: tokio::sync::AcquireError) -> Self {
        Self::Semaphore(format!("Failed to acquire semaphore: {}", err))
    }
}

impl From<tokio::task::JoinError> for ExportError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoin(format!("Failed to join task: {}", err))
    }
}
