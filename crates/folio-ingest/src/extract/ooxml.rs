//! Shared reading of Office Open XML packages.

use crate::error::{IngestError, IngestResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Upper bound on a single XML part read from a package.
pub(crate) const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

pub(crate) type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

pub(crate) fn open_package<'a>(file_name: &str, data: &'a [u8]) -> IngestResult<Package<'a>> {
    ZipArchive::new(Cursor::new(data)).map_err(|e| IngestError::extraction(file_name, e))
}

/// Read one part of the package, refusing parts over the size bound.
pub(crate) fn read_part(
    file_name: &str,
    package: &mut Package<'_>,
    part: &str,
) -> IngestResult<Vec<u8>> {
    let entry = package
        .by_name(part)
        .map_err(|e| IngestError::extraction(file_name, format!("{}: {}", part, e)))?;

    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| IngestError::extraction(file_name, e))?;

    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(IngestError::extraction(
            file_name,
            format!("{} exceeds size limit ({} bytes)", part, MAX_XML_ENTRY_BYTES),
        ));
    }

    Ok(out)
}

/// Text of every `<*:p>` paragraph in an XML part, runs concatenated.
///
/// Paragraphs nested inside another paragraph (text boxes) are folded into
/// the outer one.
pub(crate) fn paragraphs(file_name: &str, xml: &[u8]) -> IngestResult<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => {
                    if depth == 0 {
                        current.clear();
                    }
                    depth += 1;
                }
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"p" if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        out.push(std::mem::take(&mut current));
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" if depth == 0 => out.push(String::new()),
                b"br" | b"cr" if depth > 0 => current.push('\n'),
                b"tab" if depth > 0 => current.push('\t'),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| IngestError::extraction(file_name, e))?;
                current.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(IngestError::extraction(file_name, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

/// Attributes of every element with the given local name, in document
/// order. Keys keep their namespace prefix, e.g. `r:id`.
pub(crate) fn element_attributes(
    file_name: &str,
    xml: &[u8],
    local_name: &[u8],
) -> IngestResult<Vec<Vec<(String, String)>>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == local_name => {
                let mut attrs = Vec::new();
                for attr in e.attributes() {
                    let attr = attr.map_err(|err| IngestError::extraction(file_name, err))?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .unescape_value()
                        .map_err(|err| IngestError::extraction(file_name, err))?
                        .into_owned();
                    attrs.push((key, value));
                }
                out.push(attrs);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(IngestError::extraction(file_name, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

/// Resolve a relationship target against the directory of its source part.
pub(crate) fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_runs_are_joined() {
        let xml = br#"<w:document xmlns:w="w"><w:body>
            <w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>
            <w:p/>
            <w:p><w:r><w:t>Fish &amp; chips</w:t></w:r></w:p>
        </w:body></w:document>"#;

        let paragraphs = paragraphs("x.docx", xml).unwrap();
        assert_eq!(paragraphs, vec!["Hello world", "", "Fish & chips"]);
    }

    #[test]
    fn test_element_attributes() {
        let xml = br#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst>
            <p:sldId id="256" r:id="rId3"/><p:sldId id="257" r:id="rId2"></p:sldId>
        </p:sldIdLst></p:presentation>"#;

        let ids = element_attributes("x.pptx", xml, b"sldId").unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0][1], ("r:id".to_string(), "rId3".to_string()));
        assert_eq!(ids[1][0], ("id".to_string(), "257".to_string()));
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("ppt", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_target("ppt/slides", "../media/a.png"), "ppt/media/a.png");
        assert_eq!(resolve_target("ppt", "/ppt/slides/slide2.xml"), "ppt/slides/slide2.xml");
    }

    #[test]
    fn test_line_breaks_inside_paragraph() {
        let xml = br#"<a:p xmlns:a="a"><a:r><a:t>one</a:t></a:r><a:br/><a:r><a:t>two</a:t></a:r></a:p>"#;
        assert_eq!(paragraphs("x", xml).unwrap(), vec!["one\ntwo"]);
    }

    #[test]
    fn test_malformed_xml_is_extraction_error() {
        let err = paragraphs("x.docx", b"<w:p><w:t>open</w:p>").unwrap_err();
        assert!(matches!(err, IngestError::Extraction { .. }));
    }

    #[test]
    fn test_missing_part() {
        let data = fixtures::package(&[("other.xml", "<x/>")]);
        let mut package = open_package("x.docx", &data).unwrap();
        assert!(read_part("x.docx", &mut package, "word/document.xml").is_err());
        assert!(read_part("x.docx", &mut package, "other.xml").is_ok());
    }

    #[test]
    fn test_not_a_zip() {
        assert!(open_package("x.pptx", b"plain bytes").is_err());
    }
}
