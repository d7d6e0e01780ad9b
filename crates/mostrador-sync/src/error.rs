//! Error types for sync operations.

use thiserror::Error;

/// Errors from the sync engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// HTTP transport failure (connect, timeout, body).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with a non-success status.
    #[error("Remote rejected request: {status} {message}")]
    Remote { status: u16, message: String },

    /// Ledger failure underneath a sync operation.
    #[error(transparent)]
    Db(#[from] mostrador_db::DbError),

    /// A sync cycle is already running.
    #[error("Sync already in progress")]
    AlreadySyncing,

    /// The connectivity gate is closed; nothing was attempted.
    #[error("Device is offline")]
    Offline,

    /// Configuration error.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Creates a Remote error from a status code and response body.
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        SyncError::Remote {
            status,
            message: message.into(),
        }
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
