//! Error types for folio.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using FolioError.
pub type Result<T> = std::result::Result<T, FolioError>;

/// Errors that can occur in folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Storage errors
    #[error("Database file does not exist: {path}")]
    FileMissing { path: PathBuf },

    #[error("Database file corrupt or unreadable: {path}")]
    FileCorrupt { path: PathBuf },

    #[error("Page not found: {page}")]
    PageNotFound { page: i64 },

    // Lifecycle errors
    #[error("Database {0} already exists")]
    AlreadyExists(String),

    #[error("Database {0} is already open")]
    AlreadyOpen(String),

    #[error("No open database")]
    NotOpen,

    // Query errors
    #[error("Query must not be empty")]
    EmptyQuery,

    // Shell errors
    #[error("Expected {expected} argument(s), but got {got}. Usage: {usage}")]
    BadArgCount {
        expected: usize,
        got: usize,
        usage: String,
    },

    // Ingest errors
    #[error("Malformed XML input: {0}")]
    Xml(String),
}
