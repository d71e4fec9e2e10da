//! Error types for the store module

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for persistence operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A persisted file is not valid JSON for its type
    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        /// File that failed to decode
        path: PathBuf,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },

    /// Serialization of in-memory state failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
