//! A local directory standing in for the remote folder.

use super::{content_type_for, Download, RemoteSource};
use crate::error::{IngestError, IngestResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::RemoteItem;
use glob::Pattern;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Direct children of a directory, keyed by file name.
#[derive(Debug, Clone)]
pub struct LocalFolderSource {
    root: PathBuf,
    ignore_patterns: Vec<Pattern>,
}

impl LocalFolderSource {
    pub fn new(root: impl Into<PathBuf>, ignore_patterns: &[String]) -> Self {
        let ignore_patterns = ignore_patterns
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Ignoring invalid pattern {:?}: {}", p, e);
                    None
                }
            })
            .collect();

        Self {
            root: root.into(),
            ignore_patterns,
        }
    }

    fn should_ignore(&self, name: &str) -> bool {
        name.starts_with('.') || self.ignore_patterns.iter().any(|p| p.matches(name))
    }

    fn scan(&self) -> IngestResult<Vec<RemoteItem>> {
        if !self.root.is_dir() {
            return Err(IngestError::remote(
                self.describe(),
                "directory does not exist",
            ));
        }

        let mut items = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| IngestError::remote(self.describe(), e))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if self.should_ignore(&name) {
                debug!("Skipping ignored file: {}", name);
                continue;
            }

            let metadata = entry
                .metadata()
                .map_err(|e| IngestError::remote(&name, e))?;
            let modified: DateTime<Utc> = metadata.modified()?.into();

            items.push(
                RemoteItem::new(name.clone(), name.clone(), content_type_for(&name), modified)
                    .with_size(metadata.len() as i64),
            );
        }

        Ok(items)
    }
}

#[async_trait]
impl RemoteSource for LocalFolderSource {
    fn describe(&self) -> String {
        format!("local folder {}", self.root.display())
    }

    async fn list_items(&self) -> IngestResult<Vec<RemoteItem>> {
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.scan()).await?
    }

    async fn fetch(&self, item: &RemoteItem) -> IngestResult<Download> {
        let path = self.root.join(&item.id);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| IngestError::remote(format!("{} ({})", item.name, path.display()), e))?;
        Ok(Download::new(data, item.content_type.clone()))
    }
}
