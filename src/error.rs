// src/error.rs

use thiserror::Error;

/// Core error types for pkgscout
#[derive(Error, Debug)]
pub enum Error {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding errors (bundle payloads, overlays)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database initialization error
    #[error("Failed to initialize database: {0}")]
    InitError(String),

    /// Database not found
    #[error("Database not found at path: {0}")]
    DatabaseNotFound(String),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A resolution option index outside the offered range
    #[error("Invalid choice {choice}: expected 0..{available}")]
    InvalidChoice { choice: usize, available: usize },
}

/// Result type alias using pkgscout's Error type
pub type Result<T> = std::result::Result<T, Error>;
