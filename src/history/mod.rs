//! Persisted download history.
//!
//! One record per application name, last write wins. The whole table is
//! rewritten (temp file + rename) on every mutation, so the file on disk is
//! always a complete JSON array of records.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::download::DownloadTask;
use crate::fs_util::write_atomic;

/// A terminal or in-progress task snapshot as stored in history.
pub type HistoryRecord = DownloadTask;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to write history to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    records: BTreeMap<String, HistoryRecord>,
}

impl HistoryStore {
    /// Opens the history at `path`.
    ///
    /// A missing file is an empty history. An unreadable or corrupt file is
    /// logged and also treated as empty; it is replaced on the next write.
    #[must_use]
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Self {
        let records = match std::fs::read(path) {
            Ok(raw) => match serde_json::from_slice::<Vec<HistoryRecord>>(&raw) {
                Ok(list) => index_by_name(list),
                Err(error) => {
                    warn!(error = %error, "history file is corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => {
                warn!(error = %error, "cannot read history file, starting empty");
                BTreeMap::new()
            }
        };
        debug!(records = records.len(), "opened history");
        Self {
            path: path.to_path_buf(),
            records,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Upserts `snapshot` by name and persists the table.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] when the table cannot be written. The in-memory
    /// table is updated regardless.
    pub fn record(&mut self, snapshot: &DownloadTask) -> Result<(), HistoryError> {
        self.records
            .insert(snapshot.app_name.clone(), snapshot.clone());
        self.persist()
    }

    /// Empties the table and the file. Active downloads are not affected.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] when the empty table cannot be written.
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.records.clear();
        self.persist()
    }

    #[must_use]
    pub fn get(&self, app_name: &str) -> Option<&HistoryRecord> {
        self.records.get(app_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Persisted records overlaid with `active` tasks, newest first.
    ///
    /// An active task replaces the persisted record of the same name.
    #[must_use]
    pub fn merged(&self, active: &[DownloadTask]) -> Vec<HistoryRecord> {
        let mut merged = self.records.clone();
        for task in active {
            merged.insert(task.app_name.clone(), task.clone());
        }
        let mut records: Vec<_> = merged.into_values().collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    fn persist(&self) -> Result<(), HistoryError> {
        let list: Vec<&HistoryRecord> = self.records.values().collect();
        let json = serde_json::to_vec_pretty(&list)?;
        write_atomic(&self.path, &json).map_err(|source| HistoryError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Later records for a name replace earlier ones.
fn index_by_name(list: Vec<HistoryRecord>) -> BTreeMap<String, HistoryRecord> {
    list.into_iter()
        .map(|record| (record.app_name.clone(), record))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::download::TaskStatus;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn task(name: &str, status: TaskStatus, age_secs: i64) -> DownloadTask {
        let mut task = DownloadTask::new(1, name, "1.0");
        task.status = status;
        task.timestamp = Utc::now() - Duration::seconds(age_secs);
        task
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::open(&temp_dir.path().join("history.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_open_corrupt_file_is_empty_and_rewritten() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();

        let mut store = HistoryStore::open(&path);
        assert!(store.is_empty());

        store.record(&task("Foo", TaskStatus::Completed, 0)).unwrap();
        let reopened = HistoryStore::open(&path);
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_record_is_last_write_wins_and_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        let mut store = HistoryStore::open(&path);

        store.record(&task("Foo", TaskStatus::Starting, 10)).unwrap();
        store.record(&task("Foo", TaskStatus::Completed, 0)).unwrap();

        let reopened = HistoryStore::open(&path);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("Foo").unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_file_is_a_json_array_of_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        let mut store = HistoryStore::open(&path);
        store.record(&task("Foo", TaskStatus::Completed, 0)).unwrap();
        store.record(&task("Bar", TaskStatus::Canceled, 0)).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let records = raw.as_array().expect("history file should be an array");
        assert_eq!(records.len(), 2);
        let mut names: Vec<_> = records
            .iter()
            .map(|r| r["app_name"].as_str().unwrap())
            .collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Bar", "Foo"]);
    }

    #[test]
    fn test_open_keeps_last_record_per_name() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        let older = task("Foo", TaskStatus::Starting, 10);
        let newer = task("Foo", TaskStatus::Completed, 0);
        std::fs::write(&path, serde_json::to_vec(&vec![older, newer]).unwrap()).unwrap();

        let store = HistoryStore::open(&path);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("Foo").unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_open_object_file_is_treated_as_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        std::fs::write(&path, r#"{"Foo": {}}"#).unwrap();
        assert!(HistoryStore::open(&path).is_empty());
    }

    #[test]
    fn test_clear_empties_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        let mut store = HistoryStore::open(&path);
        store.record(&task("Foo", TaskStatus::Completed, 0)).unwrap();

        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
        assert!(HistoryStore::open(&path).is_empty());
    }

    #[test]
    fn test_merged_prefers_active_and_sorts_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = HistoryStore::open(&temp_dir.path().join("history.json"));
        store.record(&task("Foo", TaskStatus::Completed, 100)).unwrap();
        store.record(&task("Bar", TaskStatus::Canceled, 50)).unwrap();

        let active = vec![task("Foo", TaskStatus::Downloading, 0)];
        let merged = store.merged(&active);

        let view: Vec<_> = merged
            .iter()
            .map(|r| (r.app_name.as_str(), r.status.clone()))
            .collect();
        assert_eq!(
            view,
            vec![
                ("Foo", TaskStatus::Downloading),
                ("Bar", TaskStatus::Canceled)
            ]
        );
    }
}
