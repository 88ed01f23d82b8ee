mod common;

use slidedeck_core::pptx::{blank_template, BUILTIN_TEMPLATE_NAME};
use slidedeck_core::templates::TemplateError;
use slidedeck_core::TemplateAnalysis;
use tempfile::TempDir;

#[test]
fn test_missing_file_loads_builtin_layouts() {
    let temp = TempDir::new().unwrap();
    let registry = common::registry(&temp);

    let template = registry.load("Minimal").unwrap();
    assert_eq!(template.name(), "Minimal");
    assert_eq!(template.layouts().len(), 12);

    let default = registry.load("").unwrap();
    assert_eq!(default.name(), "Basic");
    assert_eq!(
        registry.load(BUILTIN_TEMPLATE_NAME).unwrap().name(),
        BUILTIN_TEMPLATE_NAME
    );
    assert!(matches!(registry.load("Nope"), Err(TemplateError::Unknown(_))));
}

#[test]
fn test_existing_file_is_opened() {
    let temp = TempDir::new().unwrap();
    let registry = common::registry(&temp);
    let entry = registry.resolve("Basic").unwrap();
    let path = registry.path_for(entry);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, blank_template().unwrap()).unwrap();

    // Opened templates are named after the file
    let template = registry.load("Basic").unwrap();
    assert_eq!(template.name(), "Basic");
    let analysis = TemplateAnalysis::analyze(&template);
    assert!(analysis.layout(9).unwrap().has_chart);
}

#[test]
fn test_corrupt_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let registry = common::registry(&temp);
    let path = registry.path_for(registry.resolve("Minimal").unwrap());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"not a zip").unwrap();

    assert!(matches!(registry.load("Minimal"), Err(TemplateError::Pptx(_))));
    // analyze_all skips it
    let all = registry.analyze_all();
    assert_eq!(all.keys().collect::<Vec<_>>(), vec!["Basic"]);
}

#[test]
fn test_write_analysis() {
    let temp = TempDir::new().unwrap();
    let registry = common::registry(&temp);
    let out = temp.path().join("reports/analysis.json");

    assert_eq!(registry.write_analysis(&out).unwrap(), 2);

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["Basic"]["total_layouts"], 12);
    assert_eq!(json["Minimal"]["template_name"], "Minimal");
    assert!(json["Basic"]["layouts"]["9"].is_object());
}

#[test]
fn test_listings_and_names() {
    let temp = TempDir::new().unwrap();
    let registry = common::registry(&temp);

    assert_eq!(registry.names(), vec!["Basic", "Minimal"]);
    assert_eq!(registry.default_name(), "Basic");
    let listings = registry.listings();
    assert_eq!(listings["Basic"].caption, "Plain layouts");
    assert_eq!(listings["Minimal"].file, "Minimal.pptx");
    assert_eq!(registry.by_index(1).unwrap().name, "Minimal");
    assert_eq!(registry.clamp_index(5), 0);
}
