//! Plain text and markdown extractor.

use super::Extractor;
use crate::error::IngestResult;
use crate::remote::{MIME_MARKDOWN, MIME_TEXT};
use folio_core::ContentKind;
use pulldown_cmark::{Event, Parser, Tag};

/// Text files as a single page. Markdown is reduced to its text.
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    fn looks_like_markdown(data: &str) -> bool {
        data.lines().any(|line| {
            let line = line.trim_start();
            line.starts_with('#') || line.starts_with("```") || line.starts_with("- ")
        })
    }
}

impl Extractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn supported_types(&self) -> &[&'static str] {
        &[MIME_TEXT, MIME_MARKDOWN]
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Document
    }

    fn extract_units(&self, _file_name: &str, data: &[u8]) -> IngestResult<Vec<String>> {
        let content = String::from_utf8_lossy(data);
        let text = if Self::looks_like_markdown(&content) {
            markdown_to_text(&content)
        } else {
            content.trim().to_string()
        };
        Ok(vec![text])
    }
}

/// Strip markdown syntax, keeping headings, paragraphs and list items as lines.
fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::End(Tag::Heading(..)) | Event::End(Tag::Paragraph) => text.push_str("\n\n"),
            Event::End(Tag::CodeBlock(_)) => text.push('\n'),
            Event::Start(Tag::Item) => text.push_str("- "),
            Event::End(Tag::Item) => text.push('\n'),
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            _ => {}
        }
    }

    text.trim().to_string()
}
