//! PDF extractor: one unit per page.

use super::Extractor;
use crate::error::{IngestError, IngestResult};
use crate::remote::MIME_PDF;
use folio_core::ContentKind;
use tracing::debug;

pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn supported_types(&self) -> &[&'static str] {
        &[MIME_PDF]
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Document
    }

    fn extract_units(&self, file_name: &str, data: &[u8]) -> IngestResult<Vec<String>> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(data).map_err(|e| {
            IngestError::extraction(file_name, format!("Failed to extract text from PDF: {}", e))
        })?;

        debug!("Extracted {} pages from {}", pages.len(), file_name);
        Ok(pages.iter().map(|page| clean_page(page)).collect())
    }
}

/// Trim lines and collapse runs of blank lines.
fn clean_page(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .fold(Vec::new(), |mut acc: Vec<&str>, line| {
            let last_was_empty = acc.last().map(|s| s.is_empty()).unwrap_or(true);
            if !(line.is_empty() && last_was_empty) {
                acc.push(line);
            }
            acc
        })
        .join("\n")
        .trim_end()
        .to_string()
}
