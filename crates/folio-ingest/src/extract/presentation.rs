//! PowerPoint (pptx) extractor: one unit per slide.

use super::ooxml::{element_attributes, open_package, paragraphs, read_part, resolve_target, Package};
use super::Extractor;
use crate::error::{IngestError, IngestResult};
use crate::remote::MIME_PPTX;
use folio_core::ContentKind;
use std::collections::HashMap;

const SLIDE_PREFIX: &str = "ppt/slides/slide";
const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

pub struct PresentationExtractor;

impl Extractor for PresentationExtractor {
    fn name(&self) -> &'static str {
        "presentation"
    }

    fn supported_types(&self) -> &[&'static str] {
        &[MIME_PPTX]
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Presentation
    }

    fn extract_units(&self, file_name: &str, data: &[u8]) -> IngestResult<Vec<String>> {
        let mut package = open_package(file_name, data)?;

        let slides = if package.file_names().any(|name| name == PRESENTATION_PART) {
            slides_in_deck_order(file_name, &mut package)?
        } else {
            slides_by_part_name(&package)
        };

        let mut units = Vec::with_capacity(slides.len());
        for part in slides {
            let xml = read_part(file_name, &mut package, &part)?;
            let lines: Vec<String> = paragraphs(file_name, &xml)?
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .collect();
            units.push(lines.join("\n"));
        }

        Ok(units)
    }
}

/// Slide parts in the order `<p:sldIdLst>` shows them, resolved through the
/// presentation relationships.
fn slides_in_deck_order(file_name: &str, package: &mut Package<'_>) -> IngestResult<Vec<String>> {
    let presentation = read_part(file_name, package, PRESENTATION_PART)?;
    let slide_ids = element_attributes(file_name, &presentation, b"sldId")?;
    if slide_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rels = read_part(file_name, package, PRESENTATION_RELS)?;
    let targets: HashMap<String, String> = element_attributes(file_name, &rels, b"Relationship")?
        .into_iter()
        .filter_map(|attrs| {
            let id = attribute(&attrs, "Id")?;
            let target = attribute(&attrs, "Target")?;
            Some((id.to_string(), target.to_string()))
        })
        .collect();

    slide_ids
        .iter()
        .map(|attrs| -> IngestResult<String> {
            // the relationship id is the namespaced `r:id`, not the numeric `id`
            let rel_id = attrs
                .iter()
                .find(|(key, _)| key.ends_with(":id"))
                .map(|(_, value)| value.as_str())
                .ok_or_else(|| IngestError::extraction(file_name, "slide entry without a relationship id"))?;
            let target = targets.get(rel_id).ok_or_else(|| {
                IngestError::extraction(file_name, format!("unknown slide relationship {}", rel_id))
            })?;
            Ok(resolve_target("ppt", target))
        })
        .collect()
}

fn attribute<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Packages without `presentation.xml`: slide10.xml sorts after slide9.xml.
fn slides_by_part_name(package: &Package<'_>) -> Vec<String> {
    let mut slides: Vec<(u32, String)> = package
        .file_names()
        .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
        .collect();
    slides.sort_unstable();
    slides.into_iter().map(|(_, part)| part).collect()
}

/// Number of a `ppt/slides/slideN.xml` part; other parts give `None`.
fn slide_number(part: &str) -> Option<u32> {
    part.strip_prefix(SLIDE_PREFIX)?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::super::ooxml::fixtures::package;
    use super::*;

    fn slide(texts: &[&str]) -> String {
        let body: String = texts
            .iter()
            .map(|t| format!("<a:p><a:r><a:t>{t}</a:t></a:r></a:p>"))
            .collect();
        format!(
            r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree><p:sp><p:txBody>{body}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
        )
    }

    #[test]
    fn test_slides_in_numeric_order() {
        let s1 = slide(&["Intro"]);
        let s2 = slide(&["Methods", "Data"]);
        let s10 = slide(&["Appendix"]);
        let data = package(&[
            ("ppt/slides/slide10.xml", s10.as_str()),
            ("ppt/slides/slide2.xml", s2.as_str()),
            ("ppt/slides/slide1.xml", s1.as_str()),
            ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
        ]);

        let units = PresentationExtractor
            .extract_units("deck.pptx", &data)
            .unwrap();
        assert_eq!(units, vec!["Intro", "Methods\nData", "Appendix"]);
    }

    #[test]
    fn test_slides_follow_deck_order() {
        // slide2.xml was moved in front of slide1.xml
        let s1 = slide(&["Shown second"]);
        let s2 = slide(&["Shown first"]);
        let presentation = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst>
            <p:sldId id="257" r:id="rId3"/>
            <p:sldId id="256" r:id="rId2"/>
        </p:sldIdLst></p:presentation>"#;
        let rels = r#"<Relationships xmlns="rels">
            <Relationship Id="rId1" Type="slideMaster" Target="slideMasters/slideMaster1.xml"/>
            <Relationship Id="rId2" Type="slide" Target="slides/slide1.xml"/>
            <Relationship Id="rId3" Type="slide" Target="/ppt/slides/slide2.xml"/>
        </Relationships>"#;
        let data = package(&[
            ("ppt/presentation.xml", presentation),
            ("ppt/_rels/presentation.xml.rels", rels),
            ("ppt/slides/slide1.xml", s1.as_str()),
            ("ppt/slides/slide2.xml", s2.as_str()),
        ]);

        let units = PresentationExtractor
            .extract_units("deck.pptx", &data)
            .unwrap();
        assert_eq!(units, vec!["Shown first", "Shown second"]);
    }

    #[test]
    fn test_unknown_slide_relationship() {
        let presentation = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst><p:sldId id="256" r:id="rId9"/></p:sldIdLst></p:presentation>"#;
        let data = package(&[
            ("ppt/presentation.xml", presentation),
            ("ppt/_rels/presentation.xml.rels", "<Relationships/>"),
        ]);

        let err = PresentationExtractor
            .extract_units("deck.pptx", &data)
            .unwrap_err();
        assert!(matches!(err, IngestError::Extraction { .. }));
    }

    #[test]
    fn test_empty_slide_keeps_its_position() {
        let s1 = slide(&[]);
        let s2 = slide(&["Second"]);
        let data = package(&[("ppt/slides/slide1.xml", s1.as_str()), ("ppt/slides/slide2.xml", s2.as_str())]);

        let units = PresentationExtractor
            .extract_units("deck.pptx", &data)
            .unwrap();
        assert_eq!(units, vec!["", "Second"]);
    }

    #[test]
    fn test_corrupt_deck() {
        let err = PresentationExtractor
            .extract_units("deck.pptx", b"not a zip")
            .unwrap_err();
        assert!(matches!(err, IngestError::Extraction { .. }));
    }

    #[test]
    fn test_slide_number() {
        assert_eq!(slide_number("ppt/slides/slide12.xml"), Some(12));
        assert_eq!(slide_number("ppt/slides/_rels/slide1.xml.rels"), None);
        assert_eq!(slide_number("ppt/slideLayouts/slideLayout1.xml"), None);
    }
}
