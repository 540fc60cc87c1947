//! Word (docx) extractor: the whole body as a single page.

use super::ooxml::{open_package, paragraphs, read_part};
use super::Extractor;
use crate::error::IngestResult;
use crate::remote::MIME_DOCX;
use folio_core::ContentKind;

const BODY_PART: &str = "word/document.xml";

pub struct DocumentExtractor;

impl Extractor for DocumentExtractor {
    fn name(&self) -> &'static str {
        "document"
    }

    fn supported_types(&self) -> &[&'static str] {
        &[MIME_DOCX]
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Document
    }

    fn extract_units(&self, file_name: &str, data: &[u8]) -> IngestResult<Vec<String>> {
        let mut package = open_package(file_name, data)?;
        let xml = read_part(file_name, &mut package, BODY_PART)?;

        // docx carries no reliable page breaks
        let text = paragraphs(file_name, &xml)?
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(vec![text])
    }
}

#[cfg(test)]
mod tests {
    use super::super::ooxml::fixtures::package;
    use super::*;
    use crate::error::IngestError;

    #[test]
    fn test_non_empty_paragraphs_form_one_page() {
        let xml = r#"<w:document xmlns:w="w"><w:body>
            <w:p><w:r><w:t>Title</w:t></w:r></w:p>
            <w:p></w:p>
            <w:p><w:r><w:t xml:space="preserve">Body </w:t></w:r><w:r><w:t>text</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let data = package(&[("word/document.xml", xml)]);

        let units = DocumentExtractor.extract_units("a.docx", &data).unwrap();
        assert_eq!(units, vec!["Title\nBody text"]);
    }

    #[test]
    fn test_missing_body_part() {
        let data = package(&[("word/styles.xml", "<w:styles xmlns:w=\"w\"/>")]);
        let err = DocumentExtractor.extract_units("a.docx", &data).unwrap_err();
        assert!(matches!(err, IngestError::Extraction { .. }));
        assert!(err.to_string().contains("a.docx"));
    }
}
