//! Reads text back out of a generated deck.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;

use super::package::{Package, REL_SLIDE};
use super::template::{parse_id_list, presentation_part};
use super::xml::{attr, resolve_entity};
use super::PptxError;

/// Title and body text of one slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideText {
    /// 1-based position in the deck.
    pub number: usize,
    pub title: Option<String>,
    /// Non-empty paragraphs outside the title, in document order.
    pub paragraphs: Vec<String>,
}

/// Extracts per-slide titles and text in presentation order.
pub fn read_slide_texts(bytes: &[u8]) -> Result<Vec<SlideText>, PptxError> {
    let package = Package::from_bytes(bytes)?;
    let presentation = presentation_part(&package)?;
    let pres_xml = package.part_str(&presentation)?;
    let rels = package.resolved_relationships(&presentation)?;

    let order = parse_id_list(&presentation, &pres_xml, b"sldId")?;
    let mut slides = Vec::with_capacity(order.len());
    for rid in order {
        let Some((_, part)) = rels
            .iter()
            .find(|(r, _)| r.id == rid && r.rel_type == REL_SLIDE)
        else {
            continue;
        };
        let xml = package.part_str(part)?;
        let (title, paragraphs) = slide_text(part, &xml)?;
        slides.push(SlideText {
            number: slides.len() + 1,
            title,
            paragraphs,
        });
    }
    Ok(slides)
}

fn slide_text(part: &str, xml: &str) -> Result<(Option<String>, Vec<String>), PptxError> {
    let mut reader = Reader::from_str(xml);
    let mut title = None;
    let mut paragraphs = Vec::new();

    let mut shape_depth = 0usize;
    let mut is_title = false;
    let mut in_text = false;
    let mut current = String::new();
    let mut shape_paras: Vec<String> = Vec::new();

    loop {
        match reader.read_event().map_err(|e| PptxError::xml(part, e))? {
            Event::Start(ref e) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"sp" | b"graphicFrame" if shape_depth == 0 => {
                        shape_depth = 1;
                        is_title = false;
                        shape_paras.clear();
                    }
                    b"t" => in_text = true,
                    _ if shape_depth > 0 => shape_depth += 1,
                    _ => {}
                }
            }
            Event::Empty(ref e) => {
                if e.local_name().as_ref() == b"ph" {
                    let kind = attr(e, b"type");
                    is_title = matches!(kind.as_deref(), Some("title") | Some("ctrTitle"));
                }
            }
            Event::Text(ref t) if in_text => {
                current.push_str(&String::from_utf8_lossy(t));
            }
            Event::GeneralRef(ref r) if in_text => {
                let name = String::from_utf8_lossy(r);
                match resolve_entity(&name) {
                    Some(ch) => current.push(ch),
                    None => {
                        current.push('&');
                        current.push_str(&name);
                        current.push(';');
                    }
                }
            }
            Event::End(ref e) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"t" => in_text = false,
                    b"p" if shape_depth > 0 => {
                        shape_depth -= 1;
                        let text = current.trim().to_string();
                        current.clear();
                        if !text.is_empty() {
                            shape_paras.push(text);
                        }
                    }
                    _ if shape_depth > 0 => {
                        shape_depth -= 1;
                        if shape_depth == 0 {
                            if is_title && title.is_none() {
                                title = Some(shape_paras.join(" "));
                            } else {
                                paragraphs.append(&mut shape_paras);
                            }
                            shape_paras.clear();
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((title, paragraphs))
}
