//! Error types for the ingestion pipeline.

use serde::Serialize;
use thiserror::Error;

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Remote error for {target}: {message}")]
    Remote { target: String, message: String },

    #[error("Unsupported content type {content_type} for {name}")]
    Unsupported { name: String, content_type: String },

    #[error("Extraction failed for {name}: {message}")]
    Extraction { name: String, message: String },

    #[error("Storage error for {file_id}: {source}")]
    Storage {
        file_id: String,
        #[source]
        source: folio_db::DbError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] folio_config::ConfigError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IngestError {
    pub fn remote(target: impl Into<String>, message: impl ToString) -> Self {
        Self::Remote {
            target: target.into(),
            message: message.to_string(),
        }
    }

    pub fn extraction(name: impl Into<String>, message: impl ToString) -> Self {
        Self::Extraction {
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub fn storage(file_id: impl Into<String>, source: folio_db::DbError) -> Self {
        Self::Storage {
            file_id: file_id.into(),
            source,
        }
    }

    /// The failure class this error is reported under.
    pub fn class(&self) -> FailureClass {
        match self {
            IngestError::Remote { .. } | IngestError::Io(_) => FailureClass::Remote,
            IngestError::Unsupported { .. } => FailureClass::Unsupported,
            IngestError::Extraction { .. } => FailureClass::Extraction,
            IngestError::Storage { .. } | IngestError::Join(_) => FailureClass::Storage,
            IngestError::Config(_) => FailureClass::Startup,
        }
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, IngestError::Remote { .. } | IngestError::Io(_))
    }
}

/// Classes of failure, each with its own recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureClass {
    /// Listing or download failed; retried next cycle.
    Remote,
    /// No extractor for the content type.
    Unsupported,
    /// The document could not be parsed.
    Extraction,
    /// The write was rolled back.
    Storage,
    /// Fatal before the loop starts.
    Startup,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::Remote => "remote",
            FailureClass::Unsupported => "unsupported",
            FailureClass::Extraction => "extraction",
            FailureClass::Storage => "storage",
            FailureClass::Startup => "startup",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
