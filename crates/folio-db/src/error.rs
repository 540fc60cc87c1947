//! Database error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Compression error: {0}")]
    Compression(#[from] std::io::Error),

    #[error("Cannot access {}: {source}", path.display())]
    Path {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to store {file_id}: {source}")]
    Write {
        file_id: String,
        #[source]
        source: Box<DbError>,
    },

    #[error("Database error: {0}")]
    Other(String),
}

impl DbError {
    /// The file this error concerns, when known.
    pub fn file_id(&self) -> Option<&str> {
        match self {
            DbError::Write { file_id, .. } => Some(file_id),
            _ => None,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
