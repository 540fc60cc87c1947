//! Text extraction from downloaded files.
//!
//! Each [`Extractor`] turns raw bytes into ordered text units; the
//! [`ExtractorRegistry`] picks one by MIME type and wraps the units into a
//! [`ContentDocument`].

mod document;
pub(crate) mod ooxml;
mod pdf;
mod presentation;
mod text;

pub use document::DocumentExtractor;
pub use pdf::PdfExtractor;
pub use presentation::PresentationExtractor;
pub use text::PlainTextExtractor;

use crate::error::{IngestError, IngestResult};
use crate::remote::Download;
use folio_core::{ContentDocument, ContentKind, RemoteItem};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Converts the bytes of one file format into text units.
pub trait Extractor: Send + Sync {
    /// Short name, used in logs.
    fn name(&self) -> &'static str;

    /// MIME types this extractor handles.
    fn supported_types(&self) -> &[&'static str];

    /// Whether units are slides or pages.
    fn kind(&self) -> ContentKind;

    /// Extract unit texts in order. `file_name` is only used in errors.
    fn extract_units(&self, file_name: &str, data: &[u8]) -> IngestResult<Vec<String>>;
}

/// Extractors keyed by the MIME types they accept.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    by_type: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in extractor.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PresentationExtractor);
        registry.register(DocumentExtractor);
        registry.register(PdfExtractor);
        registry.register(PlainTextExtractor);
        registry
    }

    /// Register an extractor for all of its types, replacing earlier ones.
    pub fn register<E: Extractor + 'static>(&mut self, extractor: E) {
        let extractor: Arc<dyn Extractor> = Arc::new(extractor);
        for content_type in extractor.supported_types() {
            self.by_type
                .insert((*content_type).to_string(), Arc::clone(&extractor));
        }
    }

    /// Extractor for a MIME type; parameters such as `charset` are ignored.
    pub fn get(&self, content_type: &str) -> Option<Arc<dyn Extractor>> {
        self.by_type.get(&normalize_type(content_type)).cloned()
    }

    pub fn supports(&self, content_type: &str) -> bool {
        self.get(content_type).is_some()
    }

    /// Sorted list of every registered MIME type.
    pub fn supported_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.by_type.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Extract a downloaded item into a document.
    ///
    /// The download's content type wins over the listed one, since exports
    /// change the format. A document whose units are all blank comes back
    /// with no units.
    pub fn extract(&self, item: &RemoteItem, download: &Download) -> IngestResult<ContentDocument> {
        let extractor = self
            .get(&download.content_type)
            .ok_or_else(|| IngestError::Unsupported {
                name: item.name.clone(),
                content_type: download.content_type.clone(),
            })?;

        let mut units = extractor.extract_units(&item.name, &download.data)?;
        if units.iter().all(|text| text.trim().is_empty()) {
            units.clear();
        }

        debug!(
            "{} extracted {} units from {}",
            extractor.name(),
            units.len(),
            item.name
        );

        Ok(ContentDocument::from_texts(
            item.id.clone(),
            item.name.clone(),
            extractor.kind(),
            units,
        ))
    }
}

fn normalize_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MIME_DOCX, MIME_MARKDOWN, MIME_PDF, MIME_PPTX, MIME_TEXT};
    use chrono::Utc;

    fn item(name: &str, content_type: &str) -> RemoteItem {
        RemoteItem::new(name, name, content_type, Utc::now())
    }

    #[test]
    fn test_defaults_cover_all_formats() {
        let registry = ExtractorRegistry::with_defaults();
        for content_type in [MIME_PPTX, MIME_DOCX, MIME_PDF, MIME_TEXT, MIME_MARKDOWN] {
            assert!(registry.supports(content_type), "{content_type}");
        }
        assert!(registry.supports("text/plain; charset=utf-8"));
        assert!(!registry.supports("video/mp4"));
        assert_eq!(registry.supported_types().len(), 5);
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        let registry = ExtractorRegistry::with_defaults();
        let download = Download::new(vec![0, 1, 2], "video/mp4");
        let err = registry
            .extract(&item("clip.mp4", "video/mp4"), &download)
            .unwrap_err();
        assert!(matches!(err, IngestError::Unsupported { .. }));
        assert!(err.to_string().contains("clip.mp4"));
    }

    #[test]
    fn test_download_type_wins() {
        let registry = ExtractorRegistry::with_defaults();
        let listed = item("Notes", "application/vnd.google-apps.document");
        let download = Download::new(b"exported text".to_vec(), MIME_TEXT);

        let doc = registry.extract(&listed, &download).unwrap();
        assert_eq!(doc.source_id, "Notes");
        assert_eq!(doc.kind, ContentKind::Document);
        assert_eq!(doc.units[0].text, "exported text");
    }

    #[test]
    fn test_blank_document_has_no_units() {
        let registry = ExtractorRegistry::with_defaults();
        let download = Download::new(b"  \n\n ".to_vec(), MIME_TEXT);
        let doc = registry
            .extract(&item("blank.txt", MIME_TEXT), &download)
            .unwrap();
        assert!(doc.is_empty());
    }

    struct Upper;

    impl Extractor for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn supported_types(&self) -> &[&'static str] {
            &["text/x-upper"]
        }

        fn kind(&self) -> ContentKind {
            ContentKind::Presentation
        }

        fn extract_units(&self, _file_name: &str, data: &[u8]) -> IngestResult<Vec<String>> {
            Ok(String::from_utf8_lossy(data)
                .split('|')
                .map(|s| s.to_uppercase())
                .collect())
        }
    }

    #[test]
    fn test_custom_extractor() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Upper);

        let download = Download::new(b"one|two".to_vec(), "text/x-upper");
        let doc = registry
            .extract(&item("x", "text/x-upper"), &download)
            .unwrap();
        assert_eq!(doc.kind, ContentKind::Presentation);
        assert_eq!(doc.units[1].ordinal, 2);
        assert_eq!(doc.units[1].text, "TWO");
    }
}
