//! Error types for the notification hook

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the notification hook
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Failed to launch backend: {0}")]
    Spawn(String),

    #[error("Backend timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type alias for notification hook operations
pub type Result<T> = std::result::Result<T, NotifyError>;

impl From<tempfile::PersistError> for NotifyError {
    fn from(e: tempfile::PersistError) -> Self {
        NotifyError::Io(e.error)
    }
}
