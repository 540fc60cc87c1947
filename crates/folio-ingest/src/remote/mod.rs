//! Remote folders that can be listed and downloaded from.

mod drive;
mod local;

pub use drive::{DriveAuth, DriveSource};
pub use local::LocalFolderSource;

use crate::error::{IngestError, IngestResult};
use async_trait::async_trait;
use folio_config::{ConfigError, RemoteConfig, RemoteKind};
use folio_core::RemoteItem;
use std::sync::Arc;

pub const MIME_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";

/// Downloaded bytes of a remote item.
///
/// `content_type` is the type of `data`, which differs from the listed type
/// when the remote converts the file on export.
#[derive(Debug, Clone)]
pub struct Download {
    pub data: Vec<u8>,
    pub content_type: String,
}

impl Download {
    pub fn new(data: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A folder with no push notifications: it can only be listed and read.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Short human-readable description, used in logs.
    fn describe(&self) -> String;

    /// List every item in the folder. Pagination is handled internally.
    async fn list_items(&self) -> IngestResult<Vec<RemoteItem>>;

    /// Download one item.
    async fn fetch(&self, item: &RemoteItem) -> IngestResult<Download>;
}

/// Build the remote described by the configuration.
pub fn from_config(config: &RemoteConfig) -> IngestResult<Arc<dyn RemoteSource>> {
    match config.kind {
        RemoteKind::Drive => {
            let folder_id = config
                .folder_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| invalid("remote.folder_id is not set"))?;
            // a key file wins over a static token
            let auth = match config.expanded_credentials_file() {
                Some(path) => DriveAuth::service_account(&path)?,
                None => match config.access_token.as_deref().filter(|t| !t.trim().is_empty()) {
                    Some(token) => DriveAuth::token(token),
                    None => {
                        return Err(invalid(
                            "the drive remote needs remote.credentials_file or remote.access_token",
                        ))
                    }
                },
            };
            Ok(Arc::new(DriveSource::new(
                &config.api_base,
                folder_id,
                auth,
                config.timeout_seconds,
            )?))
        }
        RemoteKind::Local => {
            let path = config
                .expanded_local_path()
                .ok_or_else(|| invalid("remote.local_path is not set"))?;
            Ok(Arc::new(LocalFolderSource::new(
                path,
                &config.ignore_patterns,
            )))
        }
    }
}

fn invalid(message: &str) -> IngestError {
    IngestError::Config(ConfigError::Invalid(message.to_string()))
}

/// Content type for a file name, by extension.
pub fn content_type_for(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pptx" => MIME_PPTX,
        "docx" => MIME_DOCX,
        "pdf" => MIME_PDF,
        "txt" | "text" => MIME_TEXT,
        "md" | "markdown" => MIME_MARKDOWN,
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureClass;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("deck.PPTX"), MIME_PPTX);
        assert_eq!(content_type_for("notes.md"), MIME_MARKDOWN);
        assert_eq!(content_type_for("paper.pdf"), MIME_PDF);
        assert_eq!(content_type_for("archive"), "application/octet-stream");
    }

    #[test]
    fn test_from_config_requires_target() {
        let config = RemoteConfig::default();
        let err = from_config(&config).err().unwrap();
        assert_eq!(err.class(), FailureClass::Startup);

        let local = RemoteConfig {
            kind: RemoteKind::Local,
            local_path: Some("/tmp".to_string()),
            ..RemoteConfig::default()
        };
        assert!(from_config(&local).is_ok());
    }

    #[test]
    fn test_drive_needs_credentials() {
        let mut drive = RemoteConfig {
            folder_id: Some("folder".to_string()),
            ..RemoteConfig::default()
        };
        let err = from_config(&drive).err().unwrap();
        assert_eq!(err.class(), FailureClass::Startup);

        drive.credentials_file = Some("/nonexistent/folio-key.json".to_string());
        let err = from_config(&drive).err().unwrap();
        assert_eq!(err.class(), FailureClass::Startup);

        drive.credentials_file = None;
        drive.access_token = Some("token".to_string());
        assert!(from_config(&drive).is_ok());
    }
}
