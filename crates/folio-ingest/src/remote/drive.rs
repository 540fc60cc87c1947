//! Google Drive v3 folder.

use super::{Download, RemoteSource, MIME_PDF};
use crate::error::{IngestError, IngestResult};
use async_trait::async_trait;
use folio_config::ConfigError;
use folio_core::RemoteItem;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const PAGE_SIZE: u32 = 100;
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, modifiedTime, size)";
const NATIVE_PREFIX: &str = "application/vnd.google-apps.";
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// How requests to Drive are authorized.
#[derive(Clone)]
pub enum DriveAuth {
    /// No `Authorization` header; only useful against a stub API.
    Anonymous,
    /// A bearer token obtained elsewhere.
    Token(String),
    /// Tokens minted and refreshed from a service account key.
    ServiceAccount(Arc<dyn TokenProvider>),
}

impl DriveAuth {
    /// Load a service account key file. A missing or malformed key is a
    /// configuration error.
    pub fn service_account(path: &Path) -> IngestResult<Self> {
        let account = CustomServiceAccount::from_file(path).map_err(|e| {
            IngestError::Config(ConfigError::Invalid(format!(
                "cannot load service account key {}: {}",
                path.display(),
                e
            )))
        })?;
        info!("Using service account key {}", path.display());
        Ok(Self::ServiceAccount(Arc::new(account)))
    }

    /// Static token; a blank token means no authorization.
    pub fn token(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            Self::Anonymous
        } else {
            Self::Token(token)
        }
    }
}

impl fmt::Debug for DriveAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Token(_) => f.write_str("Token(********)"),
            Self::ServiceAccount(_) => f.write_str("ServiceAccount"),
        }
    }
}

/// A Drive folder read through the REST API.
#[derive(Clone)]
pub struct DriveSource {
    client: Client,
    api_base: String,
    folder_id: String,
    auth: DriveAuth,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListPage {
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: String,
    modified_time: String,
    // Drive encodes int64 fields as strings
    size: Option<String>,
}

impl DriveFile {
    fn into_item(self) -> IngestResult<RemoteItem> {
        let size = self.size.as_deref().and_then(|s| s.parse::<i64>().ok());
        let item = RemoteItem::from_rfc3339(self.id, self.name, self.mime_type, &self.modified_time)
            .map_err(|e| IngestError::remote("drive listing", e))?;
        Ok(match size {
            Some(size) => item.with_size(size),
            None => item,
        })
    }
}

impl DriveSource {
    pub fn new(
        api_base: &str,
        folder_id: impl Into<String>,
        auth: DriveAuth,
        timeout_seconds: u64,
    ) -> IngestResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.max(1)))
            .build()
            .map_err(|e| IngestError::remote("drive client", e))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            folder_id: folder_id.into(),
            auth,
        })
    }

    fn list_query(&self) -> String {
        format!(
            "'{}' in parents and trashed=false",
            self.folder_id.replace('\'', "\\'")
        )
    }

    async fn authorized(&self, target: &str, request: RequestBuilder) -> IngestResult<RequestBuilder> {
        match &self.auth {
            DriveAuth::Anonymous => Ok(request),
            DriveAuth::Token(token) => Ok(request.bearer_auth(token)),
            DriveAuth::ServiceAccount(provider) => {
                let token = provider
                    .token(&[DRIVE_SCOPE])
                    .await
                    .map_err(|e| IngestError::remote(target, format!("token refresh failed: {}", e)))?;
                Ok(request.bearer_auth(token.as_str()))
            }
        }
    }

    async fn send(&self, target: &str, request: RequestBuilder) -> IngestResult<Response> {
        let response = self
            .authorized(target, request)
            .await?
            .send()
            .await
            .map_err(|e| IngestError::remote(target, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(IngestError::remote(
                target,
                format!("HTTP {}: {}", status, text.trim()),
            ));
        }

        Ok(response)
    }

    async fn list_page(&self, page_token: Option<&str>) -> IngestResult<FileListPage> {
        let target = format!("drive folder {}", self.folder_id);
        let mut request = self.client.get(format!("{}/files", self.api_base)).query(&[
            ("q", self.list_query()),
            ("pageSize", PAGE_SIZE.to_string()),
            ("fields", LIST_FIELDS.to_string()),
        ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = self.send(&target, request).await?;
        response
            .json::<FileListPage>()
            .await
            .map_err(|e| IngestError::remote(target, e))
    }
}

/// Whether Drive stores the item in its own format, which must be exported.
fn is_native(content_type: &str) -> bool {
    content_type.starts_with(NATIVE_PREFIX)
}

#[async_trait]
impl RemoteSource for DriveSource {
    fn describe(&self) -> String {
        format!("drive folder {}", self.folder_id)
    }

    async fn list_items(&self) -> IngestResult<Vec<RemoteItem>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(page_token.as_deref()).await?;
            debug!("Drive page with {} files", page.files.len());

            for file in page.files {
                items.push(file.into_item()?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn fetch(&self, item: &RemoteItem) -> IngestResult<Download> {
        let target = format!("{} ({})", item.name, item.id);

        let (request, content_type) = if is_native(&item.content_type) {
            debug!("Exporting {} as PDF", item.name);
            let url = format!("{}/files/{}/export", self.api_base, item.id);
            (
                self.client.get(url).query(&[("mimeType", MIME_PDF)]),
                MIME_PDF.to_string(),
            )
        } else {
            let url = format!("{}/files/{}", self.api_base, item.id);
            (
                self.client.get(url).query(&[("alt", "media")]),
                item.content_type.clone(),
            )
        };

        let response = self.send(&target, request).await?;
        let data = response
            .bytes()
            .await
            .map_err(|e| IngestError::remote(&target, e))?;

        Ok(Download::new(data.to_vec(), content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_listing_page() {
        let json = r#"{
            "nextPageToken": "abc",
            "files": [
                {"id": "1", "name": "deck.pptx",
                 "mimeType": "application/vnd.openxmlformats-officedocument.presentationml.presentation",
                 "modifiedTime": "2024-03-01T10:00:00.000Z", "size": "2048"},
                {"id": "2", "name": "Notes",
                 "mimeType": "application/vnd.google-apps.document",
                 "modifiedTime": "2024-03-01T12:00:00+02:00"}
            ]
        }"#;

        let page: FileListPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));

        let items: Vec<RemoteItem> = page
            .files
            .into_iter()
            .map(|f| f.into_item().unwrap())
            .collect();
        assert_eq!(items[0].size, Some(2048));
        assert_eq!(items[1].size, None);
        assert_eq!(
            items[1].modified_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_last_page_has_no_token() {
        let page: FileListPage = serde_json::from_str(r#"{"files": []}"#).unwrap();
        assert!(page.next_page_token.is_none());
        assert!(page.files.is_empty());
    }

    #[test]
    fn test_bad_timestamp_is_remote_error() {
        let file = DriveFile {
            id: "1".into(),
            name: "x".into(),
            mime_type: "application/pdf".into(),
            modified_time: "yesterday".into(),
            size: None,
        };
        assert!(matches!(file.into_item(), Err(IngestError::Remote { .. })));
    }

    #[test]
    fn test_list_query_and_native_types() {
        let source = DriveSource::new(
            "https://example.test/drive/v3/",
            "fold'er",
            DriveAuth::Anonymous,
            5,
        )
        .unwrap();
        assert_eq!(source.api_base, "https://example.test/drive/v3");
        assert_eq!(source.list_query(), "'fold\\'er' in parents and trashed=false");
        assert!(is_native("application/vnd.google-apps.presentation"));
        assert!(!is_native(MIME_PDF));
    }

    #[test]
    fn test_blank_token_is_anonymous() {
        assert!(matches!(DriveAuth::token("  "), DriveAuth::Anonymous));
        assert!(matches!(DriveAuth::token("abc"), DriveAuth::Token(_)));
        assert_eq!(format!("{:?}", DriveAuth::token("secret")), "Token(********)");
    }

    #[test]
    fn test_unreadable_key_is_config_error() {
        let err = DriveAuth::service_account(Path::new("/nonexistent/folio-key.json"))
            .err()
            .unwrap();
        assert!(matches!(err, IngestError::Config(ConfigError::Invalid(_))));
    }
}
