//! Integration tests for catalog documents and payload parsing.

mod support;

use bundleshop_core::catalog::{
    CatalogDocument, CatalogEntry, CatalogFilter, SaveOutcome, ValidationError, parse_payload,
};
use support::frontend::RecordingFrontend;
use tempfile::TempDir;

const LEGACY_CATALOG: &str = r#"[
  {
    "name": "Krita",
    "description": "Digital painting",
    "appimage_url": "https://example.com/krita.AppImage",
    "icon_url": "https://example.com/krita.png",
    "category": "Graphics",
    "app": "graphics",
    "version": "5.2.2",
    "details": "",
    "license": "GPL-3.0",
    "size": "250 MB",
    "last_updated": "2024-03-01",
    "tags": ["paint", "art"]
  },
  {
    "name": "Inkscape",
    "description": "Vector graphics",
    "bundle_url": "https://example.com/inkscape.AppImage",
    "icon_url": "https://example.com/inkscape.png",
    "category": "Graphics",
    "category_key": "graphics",
    "version": "1.3",
    "details": "",
    "license": "GPL-2.0",
    "size": "120 MB",
    "last_updated": "2024-02-10"
  }
]"#;

#[test]
fn test_legacy_keys_are_accepted_and_rewritten() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("app.json");
    std::fs::write(&file, LEGACY_CATALOG).unwrap();

    let document = CatalogDocument::load(&file).unwrap();
    assert_eq!(
        document.get("Krita").unwrap().bundle_url,
        "https://example.com/krita.AppImage"
    );
    assert_eq!(document.get("Krita").unwrap().category_key, "graphics");

    let frontend = RecordingFrontend::answering(true);
    assert_eq!(
        document.save(&file, &frontend).unwrap(),
        SaveOutcome::Written
    );
    let saved = std::fs::read_to_string(&file).unwrap();
    assert!(saved.contains("\"bundle_url\""));
    assert!(!saved.contains("appimage_url"));
    assert!(saved.starts_with("[\n    {\n        \"name\": \"Krita\""));
    assert!(saved.ends_with("]\n"));
}

#[test]
fn test_editor_round_trip_preserves_order_and_validates() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("app.json");
    std::fs::write(&file, LEGACY_CATALOG).unwrap();
    let frontend = RecordingFrontend::answering(true);

    let mut document = CatalogDocument::load(&file).unwrap();
    let mut krita = document.get("Krita").unwrap().clone();
    krita.version = "5.3.0".to_string();
    document.upsert(krita).unwrap();
    document
        .upsert(CatalogEntry {
            name: "Gimp".to_string(),
            description: "Image editor".to_string(),
            bundle_url: "https://example.com/gimp.AppImage".to_string(),
            category: "Graphics".to_string(),
            category_key: "graphics".to_string(),
            version: "2.10".to_string(),
            ..CatalogEntry::default()
        })
        .unwrap();
    document.save(&file, &frontend).unwrap();
    assert_eq!(frontend.prompts().len(), 1);

    let (entries, rejected) = parse_payload(&std::fs::read(&file).unwrap()).unwrap();
    assert!(rejected.is_empty(), "Unexpected rejections: {rejected:?}");
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Krita", "Inkscape", "Gimp"]);
    assert_eq!(entries[0].version, "5.3.0");
}

#[test]
fn test_payload_skips_bad_records_and_duplicates() {
    let payload = serde_json::json!([
        {"name": "Only a name"},
        serde_json::from_str::<serde_json::Value>(LEGACY_CATALOG).unwrap()[1].clone(),
        serde_json::from_str::<serde_json::Value>(LEGACY_CATALOG).unwrap()[1].clone(),
        "not an object",
    ]);
    let (entries, rejected) = parse_payload(payload.to_string().as_bytes()).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Inkscape");
    let indexes: Vec<_> = rejected.iter().map(|r| r.index).collect();
    assert_eq!(indexes, vec![0, 2, 3]);
    assert!(matches!(
        rejected[1].error,
        ValidationError::DuplicateName { .. }
    ));
    assert_eq!(rejected[2].error, ValidationError::NotAnObject);
}

#[test]
fn test_filter_combines_query_and_category() {
    let (entries, _) = parse_payload(LEGACY_CATALOG.as_bytes()).unwrap();

    let by_tag = CatalogFilter::default().with_query("ART");
    let names: Vec<_> = entries
        .iter()
        .filter(|e| by_tag.matches(e))
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, vec!["Krita"]);

    let other_category = CatalogFilter::new("krita", "office");
    assert!(!entries.iter().any(|e| other_category.matches(e)));
}
