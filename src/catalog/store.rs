//! Catalog store: remote fetch with cache fallback.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::entry::CatalogEntry;
use super::error::{FetchError, PayloadError, SourceError, ValidationError};
use super::filter::CatalogFilter;
use super::validation::validate;
use crate::download::HttpClient;
use crate::fs_util::write_atomic;

/// Minimum Jaro-Winkler similarity for a "did you mean" hint.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// A record dropped during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Position in the payload array.
    pub index: usize,
    /// The record's name, when it had a readable one.
    pub name: Option<String>,
    pub error: ValidationError,
}

/// Result of loading the catalog.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub entries: Vec<CatalogEntry>,
    /// True when served from the cache after the remote source failed.
    pub stale: bool,
    pub rejected: Vec<RejectedRecord>,
}

/// In-memory catalog, replaced wholesale on every successful load.
#[derive(Debug)]
pub struct CatalogStore {
    client: HttpClient,
    cache_path: PathBuf,
    entries: Vec<CatalogEntry>,
}

impl CatalogStore {
    #[must_use]
    pub fn new(client: HttpClient, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            client,
            cache_path: cache_path.into(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Fetches the catalog from `source_url`, falling back to the cache.
    ///
    /// A successfully parsed payload is written verbatim to the cache.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Unavailable`] when both the remote source and
    /// the cache fail.
    #[instrument(skip(self), fields(cache = %self.cache_path.display()))]
    pub async fn refresh(&mut self, source_url: &str) -> Result<CatalogSnapshot, FetchError> {
        let remote_error = match self.fetch_remote(source_url).await {
            Ok((raw, entries, rejected)) => {
                if let Err(error) = write_atomic(&self.cache_path, &raw) {
                    warn!(path = %self.cache_path.display(), error = %error, "failed to write catalog cache");
                }
                info!(
                    entries = entries.len(),
                    rejected = rejected.len(),
                    "catalog refreshed"
                );
                return Ok(self.replace(entries, rejected, false));
            }
            Err(error) => error,
        };

        warn!(url = source_url, error = %remote_error, "catalog fetch failed, falling back to cache");
        match self.read_cache() {
            Ok((entries, rejected)) => Ok(self.replace(entries, rejected, true)),
            Err(cache_error) => Err(FetchError::Unavailable {
                url: source_url.to_string(),
                remote: Box::new(remote_error),
                cache_path: self.cache_path.clone(),
                cache: Box::new(cache_error),
            }),
        }
    }

    /// Populates the store from the cache without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NoCache`] when the cache is missing or unreadable.
    pub fn load_cached(&mut self) -> Result<CatalogSnapshot, FetchError> {
        match self.read_cache() {
            Ok((entries, rejected)) => Ok(self.replace(entries, rejected, true)),
            Err(cache) => Err(FetchError::NoCache {
                cache_path: self.cache_path.clone(),
                cache: Box::new(cache),
            }),
        }
    }

    async fn fetch_remote(
        &self,
        source_url: &str,
    ) -> Result<(Vec<u8>, Vec<CatalogEntry>, Vec<RejectedRecord>), SourceError> {
        let raw = self.client.fetch_bytes(source_url).await?;
        let (entries, rejected) = parse_payload(&raw)?;
        Ok((raw, entries, rejected))
    }

    fn read_cache(&self) -> Result<(Vec<CatalogEntry>, Vec<RejectedRecord>), SourceError> {
        let raw = std::fs::read(&self.cache_path).map_err(|source| SourceError::Io {
            path: self.cache_path.clone(),
            source,
        })?;
        debug!(bytes = raw.len(), "read catalog cache");
        Ok(parse_payload(&raw)?)
    }

    fn replace(
        &mut self,
        entries: Vec<CatalogEntry>,
        rejected: Vec<RejectedRecord>,
        stale: bool,
    ) -> CatalogSnapshot {
        self.entries.clone_from(&entries);
        CatalogSnapshot {
            entries,
            stale,
            rejected,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Entries matching `filter`, in catalog order.
    #[must_use]
    pub fn filter(&self, filter: &CatalogFilter) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .collect()
    }

    /// Closest catalog name to `name`, for "did you mean" hints.
    #[must_use]
    pub fn suggest(&self, name: &str) -> Option<&str> {
        let wanted = name.to_lowercase();
        self.entries
            .iter()
            .map(|entry| {
                let score = strsim::jaro_winkler(&wanted, &entry.name.to_lowercase());
                (entry.name.as_str(), score)
            })
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(name, _)| name)
    }
}

/// Parses a catalog payload, validating each record independently.
///
/// # Errors
///
/// Returns [`PayloadError`] when the payload is not a JSON array. Invalid
/// records do not fail the payload; they are logged and listed as rejected.
pub fn parse_payload(raw: &[u8]) -> Result<(Vec<CatalogEntry>, Vec<RejectedRecord>), PayloadError> {
    let Value::Array(records) = serde_json::from_slice::<Value>(raw)? else {
        return Err(PayloadError::NotAnArray);
    };

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let outcome = validate(record).and_then(|entry| {
            if seen.insert(entry.name.clone()) {
                Ok(entry)
            } else {
                Err(ValidationError::DuplicateName { name: entry.name })
            }
        });
        match outcome {
            Ok(entry) => entries.push(entry),
            Err(error) => {
                let name = record
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                warn!(index, name = ?name, error = %error, "rejected catalog record");
                rejected.push(RejectedRecord { index, name, error });
            }
        }
    }

    Ok((entries, rejected))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn record(name: &str) -> Value {
        json!({
            "name": name,
            "description": format!("{name} description"),
            "bundle_url": format!("https://example.com/{name}.AppImage"),
            "icon_url": format!("https://example.com/{name}.png"),
            "category": "Utilities",
            "category_key": "utilities",
            "version": "1.0",
            "details": "",
            "license": "MIT",
            "size": "1 MB",
            "last_updated": "2024-01-01",
        })
    }

    #[test]
    fn test_parse_payload_rejects_invalid_and_duplicate_records() {
        let mut broken = record("Broken");
        broken.as_object_mut().unwrap().remove("icon_url");
        let payload = json!([record("Foo"), broken, record("Bar"), record("Foo")]);

        let (entries, rejected) = parse_payload(payload.to_string().as_bytes()).unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Foo", "Bar"]);
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0].index, 1);
        assert_eq!(
            rejected[0].error,
            ValidationError::MissingField { field: "icon_url" }
        );
        assert_eq!(rejected[1].index, 3);
        assert!(matches!(
            rejected[1].error,
            ValidationError::DuplicateName { .. }
        ));
    }

    #[test]
    fn test_parse_payload_rejects_only_the_record_missing_a_field() {
        const REQUIRED: [&str; 11] = [
            "name",
            "description",
            "bundle_url",
            "icon_url",
            "category",
            "category_key",
            "version",
            "details",
            "license",
            "size",
            "last_updated",
        ];

        for field in REQUIRED {
            let mut broken = record("Broken");
            broken.as_object_mut().unwrap().remove(field);
            let payload = json!([record("Foo"), broken, record("Bar")]);

            let (entries, rejected) = parse_payload(payload.to_string().as_bytes()).unwrap();

            let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
            assert_eq!(names, vec!["Foo", "Bar"], "accepted records without {field}");
            assert_eq!(rejected.len(), 1, "rejections without {field}");
            assert_eq!(rejected[0].index, 1);
            assert_eq!(rejected[0].error, ValidationError::MissingField { field });
        }
    }

    #[test]
    fn test_parse_payload_requires_array() {
        assert!(matches!(
            parse_payload(br#"{"name":"Foo"}"#),
            Err(PayloadError::NotAnArray)
        ));
        assert!(matches!(parse_payload(b"not json"), Err(PayloadError::Json(_))));
    }

    #[tokio::test]
    async fn test_refresh_writes_cache_verbatim() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let body = json!([record("Foo")]).to_string();

        Mock::given(method("GET"))
            .and(path("/app.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
            .mount(&mock_server)
            .await;

        let cache = temp_dir.path().join("catalog-cache.json");
        let mut store = CatalogStore::new(HttpClient::new(), &cache);
        let snapshot = store
            .refresh(&format!("{}/app.json", mock_server.uri()))
            .await
            .unwrap();

        assert!(!snapshot.stale);
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(std::fs::read_to_string(&cache).unwrap(), body);
        assert!(store.find("Foo").is_some());
    }

    #[tokio::test]
    async fn test_refresh_non_array_payload_falls_back_to_cache() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("catalog-cache.json");
        std::fs::write(&cache, json!([record("Cached")]).to_string()).unwrap();

        Mock::given(method("GET"))
            .and(path("/app.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"oops":true}"#))
            .mount(&mock_server)
            .await;

        let mut store = CatalogStore::new(HttpClient::new(), &cache);
        let snapshot = store
            .refresh(&format!("{}/app.json", mock_server.uri()))
            .await
            .unwrap();

        assert!(snapshot.stale);
        assert_eq!(snapshot.entries[0].name, "Cached");
        assert!(
            std::fs::read_to_string(&cache).unwrap().contains("Cached"),
            "cache must not be overwritten by a bad payload"
        );
    }

    #[tokio::test]
    async fn test_refresh_without_network_or_cache_fails_with_both_causes() {
        let temp_dir = TempDir::new().unwrap();
        let mut store =
            CatalogStore::new(HttpClient::new(), temp_dir.path().join("catalog-cache.json"));

        let error = store.refresh("not a url").await.unwrap_err();
        let msg = error.to_string();
        assert!(msg.contains("invalid URL"), "Expected remote cause in: {msg}");
        assert!(msg.contains("cannot read"), "Expected cache cause in: {msg}");
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_load_cached_and_suggest() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("catalog-cache.json");
        std::fs::write(&cache, json!([record("Krita"), record("Inkscape")]).to_string()).unwrap();

        let mut store = CatalogStore::new(HttpClient::new(), &cache);
        let snapshot = store.load_cached().unwrap();
        assert!(snapshot.stale);

        assert_eq!(store.suggest("krita"), Some("Krita"));
        assert_eq!(store.suggest("Inkscap"), Some("Inkscape"));
        assert_eq!(store.suggest("zzzz"), None);
        assert_eq!(
            store.filter(&CatalogFilter::default().with_query("ink")).len(),
            1
        );
    }

    #[test]
    fn test_load_cached_missing_file_is_no_cache_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = CatalogStore::new(HttpClient::new(), temp_dir.path().join("absent.json"));
        assert!(matches!(
            store.load_cached(),
            Err(FetchError::NoCache { .. })
        ));
    }
}
