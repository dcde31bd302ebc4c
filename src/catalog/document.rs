//! Catalog document as edited by maintainers: load, modify, save.

use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info};

use super::entry::CatalogEntry;
use super::error::DocumentError;
use crate::fs_util::write_atomic;
use crate::frontend::Frontend;

/// What happened on [`CatalogDocument::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// The file existed and the user declined to overwrite it.
    Declined,
}

/// An ordered list of entries backed by a JSON array file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDocument {
    entries: Vec<CatalogEntry>,
}

impl CatalogDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Reads a JSON array of entries. Missing fields default to empty.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the file cannot be read or is not an
    /// array of objects.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let raw = std::fs::read(path).map_err(|e| DocumentError::io(path, e))?;
        let entries: Vec<CatalogEntry> =
            serde_json::from_slice(&raw).map_err(|source| DocumentError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), entries = entries.len(), "loaded catalog document");
        Ok(Self { entries })
    }

    /// Writes the document as pretty-printed UTF-8 JSON.
    ///
    /// Overwriting an existing file requires confirmation from `frontend`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when serialization or the write fails.
    pub fn save(&self, path: &Path, frontend: &dyn Frontend) -> Result<SaveOutcome, DocumentError> {
        if path.exists()
            && !frontend.confirm(&format!("{} already exists. Overwrite it?", path.display()))
        {
            return Ok(SaveOutcome::Declined);
        }

        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.entries
            .serialize(&mut serializer)
            .map_err(DocumentError::Serialize)?;
        buffer.push(b'\n');

        write_atomic(path, &buffer).map_err(|e| DocumentError::io(path, e))?;
        info!(path = %path.display(), entries = self.entries.len(), "saved catalog document");
        Ok(SaveOutcome::Written)
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Replaces the entry with the same name in place, or appends.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::MissingName`] for an entry without a name.
    pub fn upsert(&mut self, entry: CatalogEntry) -> Result<(), DocumentError> {
        if entry.name.trim().is_empty() {
            return Err(DocumentError::MissingName);
        }
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        Ok(())
    }

    /// Removes the named entry; returns whether anything was removed.
    pub fn remove_by_name(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.name != name);
        self.entries.len() != before
    }
}
