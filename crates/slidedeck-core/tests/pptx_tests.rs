mod common;

use slidedeck_core::pptx::{read_slide_texts, DeckWriter, Template, FIRST_SLIDE_ID};

/// Three slides written onto the built-in layouts.
fn three_slide_deck() -> Vec<u8> {
    let mut writer = DeckWriter::new(&common::template()).unwrap();
    for title in ["Old one", "Old two", "Old three"] {
        writer.add_slide(1).unwrap().set_title(title);
    }
    writer.to_bytes().unwrap()
}

#[test]
fn test_template_with_slides_is_cleared() {
    let template = Template::from_bytes(&three_slide_deck(), "Used").unwrap();
    assert_eq!(template.layouts().len(), 12);

    let mut writer = DeckWriter::new(&template).unwrap();
    writer.add_slide(0).unwrap().set_title("New");
    let package = writer.finish().unwrap();

    let slide_parts: Vec<&str> = package
        .part_names()
        .filter(|n| n.starts_with("ppt/slides/"))
        .collect();
    assert_eq!(slide_parts.len(), 2, "{slide_parts:?}");
    assert!(slide_parts.contains(&"ppt/slides/slide1.xml"));
    assert!(slide_parts.contains(&"ppt/slides/_rels/slide1.xml.rels"));

    let slide_overrides = package
        .content_type_overrides()
        .unwrap()
        .into_iter()
        .filter(|(part, _)| part.starts_with("ppt/slides/"))
        .count();
    assert_eq!(slide_overrides, 1);

    let presentation = package.part_str("ppt/presentation.xml").unwrap();
    assert_eq!(presentation.matches("<p:sldId ").count(), 1);
    assert!(presentation.contains(&format!(r#"<p:sldId id="{FIRST_SLIDE_ID}""#)));

    let texts = read_slide_texts(&package.to_bytes().unwrap()).unwrap();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].title.as_deref(), Some("New"));
}

#[test]
fn test_slide_ids_are_unique_and_ordered() {
    let template = Template::from_bytes(&three_slide_deck(), "Used").unwrap();
    let mut writer = DeckWriter::new(&template).unwrap();
    for title in ["First", "Second"] {
        writer.add_slide(1).unwrap().set_title(title);
    }
    let package = writer.finish().unwrap();

    let presentation = package.part_str("ppt/presentation.xml").unwrap();
    assert!(presentation.contains(r#"<p:sldId id="256""#));
    assert!(presentation.contains(r#"<p:sldId id="257""#));
    assert!(!presentation.contains(r#"<p:sldId id="258""#));

    let titles: Vec<Option<String>> = read_slide_texts(&package.to_bytes().unwrap())
        .unwrap()
        .into_iter()
        .map(|s| s.title)
        .collect();
    assert_eq!(titles, vec![Some("First".to_string()), Some("Second".to_string())]);
}
