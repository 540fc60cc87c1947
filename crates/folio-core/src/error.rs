//! Error types for Folio.

use thiserror::Error;

/// Core error type for Folio domain operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid timestamp '{value}': {message}")]
    InvalidTimestamp { value: String, message: String },

    #[error("Unknown content kind '{0}'")]
    UnknownKind(String),

    #[error("Unknown file status '{0}'")]
    UnknownStatus(String),
}

/// Result type alias using Folio's Error.
pub type Result<T> = std::result::Result<T, Error>;
