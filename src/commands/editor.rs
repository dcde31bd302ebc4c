//! Catalog file editing for maintainers.

use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use bundleshop_core::catalog::{CatalogDocument, SaveOutcome, parse_payload, validate};
use bundleshop_core::{Frontend, Notice};
use serde_json::Value;

use crate::cli::CatalogCommand;

/// Returns false when `check` rejected records. A declined overwrite is not a
/// failure.
pub fn run_catalog_command(frontend: &dyn Frontend, command: &CatalogCommand) -> Result<bool> {
    match command {
        CatalogCommand::Check { file } => check(file),
        CatalogCommand::Upsert { file, from } => {
            let raw = read_entry_source(from)?;
            upsert(frontend, file, &raw)?;
            Ok(true)
        }
        CatalogCommand::Remove { file, name } => {
            remove(frontend, file, name)?;
            Ok(true)
        }
    }
}

/// Validates every record; returns false when any was rejected.
fn check(file: &Path) -> Result<bool> {
    let raw = std::fs::read(file).with_context(|| format!("cannot read {}", file.display()))?;
    let (entries, rejected) =
        parse_payload(&raw).with_context(|| format!("{} is not a catalog", file.display()))?;
    for record in &rejected {
        let name = record.name.as_deref().unwrap_or("<unnamed>");
        println!("record #{} ({name}): {}", record.index, record.error);
    }
    println!("{} valid, {} rejected", entries.len(), rejected.len());
    Ok(rejected.is_empty())
}

fn read_entry_source(from: &Path) -> Result<String> {
    if from == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    std::fs::read_to_string(from).with_context(|| format!("cannot read {}", from.display()))
}

fn upsert(frontend: &dyn Frontend, file: &Path, raw_entry: &str) -> Result<bool> {
    let value: Value = serde_json::from_str(raw_entry).context("entry is not valid JSON")?;
    let entry = validate(&value)?;
    let name = entry.name.clone();

    let mut document = open_or_new(file)?;
    let replaced = document.get(&name).is_some();
    document.upsert(entry)?;
    if document.save(file, frontend)? == SaveOutcome::Declined {
        return Ok(false);
    }
    let verb = if replaced { "updated" } else { "added" };
    frontend.notify(&Notice::success(format!("{name} {verb} in {}", file.display())));
    Ok(true)
}

fn remove(frontend: &dyn Frontend, file: &Path, name: &str) -> Result<bool> {
    let mut document = CatalogDocument::load(file)?;
    if !document.remove_by_name(name) {
        bail!("no entry named `{name}` in {}", file.display());
    }
    if document.save(file, frontend)? == SaveOutcome::Declined {
        return Ok(false);
    }
    frontend.notify(&Notice::success(format!("{name} removed from {}", file.display())));
    Ok(true)
}

fn open_or_new(file: &Path) -> Result<CatalogDocument> {
    if file.exists() {
        Ok(CatalogDocument::load(file)?)
    } else {
        Ok(CatalogDocument::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    struct Answering {
        answer: bool,
        notices: RefCell<Vec<String>>,
    }

    impl Answering {
        fn new(answer: bool) -> Self {
            Self {
                answer,
                notices: RefCell::new(Vec::new()),
            }
        }
    }

    impl Frontend for Answering {
        fn confirm(&self, _prompt: &str) -> bool {
            self.answer
        }

        fn notify(&self, notice: &Notice) {
            self.notices.borrow_mut().push(notice.message.clone());
        }
    }

    fn entry_json(name: &str, version: &str) -> String {
        serde_json::json!({
            "name": name,
            "description": "Painting",
            "bundle_url": format!("https://example.com/{name}.AppImage"),
            "icon_url": "https://example.com/icon.png",
            "category": "Graphics",
            "category_key": "graphics",
            "version": version,
            "details": "",
            "license": "GPL",
            "size": "200 MB",
            "last_updated": "2024-01-01",
        })
        .to_string()
    }

    #[test]
    fn test_upsert_creates_then_replaces_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("app.json");
        let frontend = Answering::new(true);

        assert!(upsert(&frontend, &file, &entry_json("Krita", "5.1")).unwrap());
        assert!(upsert(&frontend, &file, &entry_json("Inkscape", "1.3")).unwrap());
        assert!(upsert(&frontend, &file, &entry_json("Krita", "5.2")).unwrap());

        let document = CatalogDocument::load(&file).unwrap();
        let names: Vec<_> = document.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Krita", "Inkscape"]);
        assert_eq!(document.get("Krita").unwrap().version, "5.2");
        assert_eq!(
            frontend.notices.borrow().last().unwrap(),
            &format!("Krita updated in {}", file.display())
        );
    }

    #[test]
    fn test_upsert_rejects_invalid_entry() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("app.json");
        let frontend = Answering::new(true);

        let result = upsert(&frontend, &file, r#"{"name": "Krita"}"#);
        assert!(result.is_err());
        assert!(!file.exists());
    }

    #[test]
    fn test_declined_overwrite_keeps_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("app.json");
        assert!(upsert(&Answering::new(true), &file, &entry_json("Krita", "5.1")).unwrap());
        let before = std::fs::read_to_string(&file).unwrap();

        assert!(!remove(&Answering::new(false), &file, "Krita").unwrap());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), before);
    }

    #[test]
    fn test_remove_unknown_name_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("app.json");
        assert!(upsert(&Answering::new(true), &file, &entry_json("Krita", "5.1")).unwrap());

        let error = remove(&Answering::new(true), &file, "Gimp").unwrap_err();
        assert!(error.to_string().contains("no entry named `Gimp`"));
    }

    #[test]
    fn test_check_reports_rejected_records() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("app.json");
        let payload = format!("[{}, {{\"name\": 3}}]", entry_json("Krita", "5.1"));
        std::fs::write(&file, payload).unwrap();

        assert!(!check(&file).unwrap());
    }
}
