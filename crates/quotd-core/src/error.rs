//! Error types for quotd-core

use thiserror::Error;

/// Result type alias using quotd-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quotd-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Quote not found
    #[error("Quote not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Import batch rejected, nothing was added
    #[error("Import rejected: {0}")]
    ImportRejected(String),

    /// Remote fetch/upload failure
    #[error("Remote error: {0}")]
    Remote(#[from] crate::remote::RemoteError),

    /// A sync attempt is already in flight or awaiting resolution
    #[error("Sync already in progress")]
    SyncInProgress,

    /// Resolution requested while no conflict is pending
    #[error("No pending sync conflict to resolve")]
    NoPendingConflict,
}
