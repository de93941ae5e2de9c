//! Common error types for the prospecting workspace

use thiserror::Error;

/// Common result type for prospecting operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the prospecting crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write rejected before persistence
    #[error("Validation error: {0}")]
    Validation(String),

    /// Door status outside the closed taxonomy (legacy or foreign data)
    #[error("Unknown door status: {0}")]
    UnknownStatus(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
