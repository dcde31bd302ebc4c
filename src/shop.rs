//! Application controller.
//!
//! [`Shop`] owns the catalog store, the download manager (and through it the
//! history) and the settings. Frontend actions go through it so that
//! destructive actions are confirmed and every outcome produces a notice.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::catalog::{CatalogEntry, CatalogFilter, CatalogSnapshot, CatalogStore, FetchError};
use crate::config::{self, ConfigError, Settings};
use crate::download::{
    DownloadManager, HttpClient, ManagerError, ManagerEvent, NotFoundError, RemovalError,
};
use crate::frontend::{Frontend, Notice};
use crate::history::{HistoryError, HistoryRecord, HistoryStore};
use crate::install::{self, InstallLayout, InstalledState, LaunchError, MenuIntegration};

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("no app named `{name}` in the catalog{}", hint(.suggestion.as_deref()))]
    UnknownApp {
        name: String,
        suggestion: Option<String>,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Manager(#[from] ManagerError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Removal(#[from] RemovalError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("cannot determine {0}; set HOME or the XDG base directories")]
    NoHome(&'static str),
}

fn hint(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |name| format!(" (did you mean `{name}`?)"))
}

/// Where the shop keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopPaths {
    pub config_file: PathBuf,
    /// History, catalog cache and icons.
    pub data_dir: PathBuf,
    /// Desktop shortcut descriptors.
    pub applications_dir: PathBuf,
}

impl ShopPaths {
    /// Resolves the XDG locations for the current user.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NoHome`] when neither `HOME` nor the XDG
    /// variables are set.
    pub fn from_env() -> Result<Self, ShopError> {
        Ok(Self {
            config_file: config::resolve_config_path()
                .ok_or(ShopError::NoHome("config directory"))?,
            data_dir: config::resolve_data_dir().ok_or(ShopError::NoHome("data directory"))?,
            applications_dir: config::resolve_applications_dir()
                .ok_or(ShopError::NoHome("applications directory"))?,
        })
    }

    /// Everything below one directory.
    #[must_use]
    pub fn under(root: &Path) -> Self {
        Self {
            config_file: root.join("config").join("config.ini"),
            data_dir: root.join("data"),
            applications_dir: root.join("applications"),
        }
    }

    #[must_use]
    pub fn history_file(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }

    #[must_use]
    pub fn catalog_cache(&self) -> PathBuf {
        self.data_dir.join("catalog-cache.json")
    }

    #[must_use]
    pub fn icon_dir(&self) -> PathBuf {
        self.data_dir.join("icons")
    }
}

pub struct Shop<F: Frontend> {
    paths: ShopPaths,
    settings: Settings,
    catalog: CatalogStore,
    manager: DownloadManager,
    frontend: F,
}

impl<F: Frontend> Shop<F> {
    /// Wires the components together from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Client`] when the HTTP client cannot be built.
    pub fn new(
        paths: ShopPaths,
        settings: Settings,
        menu: Arc<dyn MenuIntegration>,
        frontend: F,
    ) -> Result<Self, ShopError> {
        let client = HttpClient::with_timeouts(
            settings.connect_timeout_secs,
            settings.download_timeout_secs,
        )
        .map_err(ShopError::Client)?;
        let layout = InstallLayout::new(
            settings.install_dir.clone(),
            paths.applications_dir.clone(),
            paths.icon_dir(),
        );
        let history = HistoryStore::open(&paths.history_file());
        let catalog = CatalogStore::new(client.clone(), paths.catalog_cache());
        let manager = DownloadManager::new(client, layout, menu, history);
        Ok(Self {
            paths,
            settings,
            catalog,
            manager,
            frontend,
        })
    }

    /// Loads settings from `paths.config_file` and builds the shop.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Config`] when the settings file is unreadable.
    pub fn open(
        paths: ShopPaths,
        menu: Arc<dyn MenuIntegration>,
        frontend: F,
    ) -> Result<Self, ShopError> {
        let settings = Settings::load(&paths.config_file)?;
        Self::new(paths, settings, menu, frontend)
    }

    #[must_use]
    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    #[must_use]
    pub fn paths(&self) -> &ShopPaths {
        &self.paths
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    #[must_use]
    pub fn manager(&self) -> &DownloadManager {
        &self.manager
    }

    /// Fetches the configured catalog, falling back to the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Fetch`] when neither source works.
    #[instrument(skip(self))]
    pub async fn refresh_catalog(&mut self) -> Result<CatalogSnapshot, ShopError> {
        let url = self.settings.catalog_url.clone();
        match self.catalog.refresh(&url).await {
            Ok(snapshot) => {
                if snapshot.stale {
                    self.frontend.notify(&Notice::info(
                        "Catalog source unreachable, showing the cached catalog",
                    ));
                }
                Ok(snapshot)
            }
            Err(error) => {
                self.frontend
                    .notify(&Notice::error(format!("Could not load the catalog: {error}")));
                Err(error.into())
            }
        }
    }

    /// Startup load: refresh when `auto_refresh` is on, otherwise use the
    /// cache and only go to the network when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Fetch`] when no catalog can be loaded.
    pub async fn load_catalog(&mut self) -> Result<CatalogSnapshot, ShopError> {
        if !self.settings.auto_refresh {
            match self.catalog.load_cached() {
                Ok(snapshot) => return Ok(snapshot),
                Err(error) => info!(error = %error, "no cached catalog, fetching"),
            }
        }
        self.refresh_catalog().await
    }

    /// Looks up a catalog entry, with a "did you mean" hint when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::UnknownApp`].
    pub fn entry(&self, name: &str) -> Result<&CatalogEntry, ShopError> {
        self.catalog.find(name).ok_or_else(|| ShopError::UnknownApp {
            name: name.to_string(),
            suggestion: self.catalog.suggest(name).map(str::to_string),
        })
    }

    /// Filtered catalog with the installed state of each entry.
    #[must_use]
    pub fn listing(&self, filter: &CatalogFilter) -> Vec<(&CatalogEntry, InstalledState)> {
        self.catalog
            .filter(filter)
            .into_iter()
            .map(|entry| (entry, self.manager.installed_state(entry)))
            .collect()
    }

    /// Installed state of a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::UnknownApp`].
    pub fn installed_state(&self, name: &str) -> Result<InstalledState, ShopError> {
        Ok(self.manager.installed_state(self.entry(name)?))
    }

    /// Asks for confirmation, then starts the download.
    ///
    /// Returns `Ok(false)` when the user declined.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::UnknownApp`] or [`ShopError::Manager`].
    #[instrument(skip(self))]
    pub fn install(&mut self, name: &str, version: Option<&str>) -> Result<bool, ShopError> {
        let entry = self.entry(name)?.clone();
        let shown_version = version.unwrap_or(entry.version.as_str());
        if !self
            .frontend
            .confirm(&format!("Install {} {shown_version}?", entry.name))
        {
            return Ok(false);
        }

        if let Err(error) = self.manager.start_install(&entry, version) {
            self.frontend.notify(&Notice::error(error.to_string()));
            return Err(error.into());
        }
        if let Some(task) = self.manager.task(&entry.name) {
            self.frontend.task_updated(task);
        }
        Ok(true)
    }

    /// Requests cancellation of an active download.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotFound`] when nothing is downloading under `name`.
    pub fn cancel(&mut self, name: &str) -> Result<(), ShopError> {
        self.manager.cancel(name)?;
        if let Some(task) = self.manager.task(name) {
            self.frontend.task_updated(task);
        }
        Ok(())
    }

    /// Cancels every active download.
    pub fn cancel_all(&mut self) {
        self.manager.cancel_all();
        for task in self.manager.active_tasks() {
            self.frontend.task_updated(&task);
        }
    }

    /// Asks for confirmation, then uninstalls.
    ///
    /// Returns `Ok(false)` when the user declined.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::UnknownApp`] or [`ShopError::Removal`].
    #[instrument(skip(self))]
    pub async fn remove(&mut self, name: &str) -> Result<bool, ShopError> {
        let entry = self.entry(name)?.clone();
        if !self.frontend.confirm(&format!("Remove {}?", entry.name)) {
            return Ok(false);
        }
        match self.manager.remove(&entry).await {
            Ok(()) => {
                self.frontend
                    .notify(&Notice::success(format!("{} removed", entry.name)));
                Ok(true)
            }
            Err(error) => {
                self.frontend.notify(&Notice::error(format!(
                    "Failed to remove {}: {error}",
                    entry.name
                )));
                Err(error.into())
            }
        }
    }

    /// Starts an installed bundle.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::UnknownApp`] or [`ShopError::Launch`].
    pub fn launch(&self, name: &str) -> Result<(), ShopError> {
        let entry = self.entry(name)?;
        install::launch(entry, self.manager.layout())?;
        Ok(())
    }

    /// Waits for the next download event and forwards it to the frontend.
    ///
    /// Returns `None` once nothing is downloading.
    pub async fn next_event(&mut self) -> Option<ManagerEvent> {
        let event = self.manager.next_event().await?;
        self.dispatch(&event);
        Some(event)
    }

    /// Forwards every pending download event without waiting.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.manager.try_next_event() {
            self.dispatch(&event);
            applied += 1;
        }
        applied
    }

    /// Drives downloads until none is active.
    pub async fn wait_for_downloads(&mut self) {
        while self.next_event().await.is_some() {}
    }

    fn dispatch(&self, event: &ManagerEvent) {
        match event {
            ManagerEvent::Updated(task) => self.frontend.task_updated(task),
            ManagerEvent::Finished { task, notice } => {
                self.frontend.task_updated(task);
                self.frontend.notify(notice);
            }
        }
    }

    /// History merged with the live state of active downloads.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryRecord> {
        self.manager.merged_history()
    }

    /// Asks for confirmation, then clears the persisted history.
    ///
    /// Active downloads keep running. Returns `Ok(false)` when declined.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::History`] when the file cannot be written.
    pub fn clear_history(&mut self) -> Result<bool, ShopError> {
        if !self.frontend.confirm("Clear the download history?") {
            return Ok(false);
        }
        self.manager.clear_history()?;
        self.frontend.notify(&Notice::success("Download history cleared"));
        Ok(true)
    }

    /// Changes one setting in memory and persists the file.
    ///
    /// Timeouts and the install directory take effect on the next start.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Config`] for unknown keys, bad values or write
    /// failures.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<(), ShopError> {
        self.settings.set(key, value)?;
        self.settings.save(&self.paths.config_file)?;
        Ok(())
    }

    /// Asks for confirmation, then restores and persists default settings.
    ///
    /// Returns `Ok(false)` when declined.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Config`] when the file cannot be written.
    pub fn reset_settings(&mut self) -> Result<bool, ShopError> {
        if !self.frontend.confirm("Reset all settings to their defaults?") {
            return Ok(false);
        }
        self.settings = Settings::default();
        if let Err(error) = self.settings.save(&self.paths.config_file) {
            warn!(error = %error, "failed to save default settings");
            return Err(error.into());
        }
        self.frontend.notify(&Notice::success("Settings reset"));
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::install::NoMenu;
    use crate::test_support::frontend::RecordingFrontend;
    use tempfile::TempDir;

    fn shop(temp_dir: &TempDir, answer: bool) -> Shop<RecordingFrontend> {
        let paths = ShopPaths::under(temp_dir.path());
        let settings = Settings {
            install_dir: temp_dir.path().join("bin"),
            ..Settings::default()
        };
        let cache = json_catalog(&["Krita", "Inkscape"]);
        std::fs::create_dir_all(&paths.data_dir).unwrap();
        std::fs::write(paths.catalog_cache(), cache).unwrap();

        let mut shop = Shop::new(
            paths,
            settings,
            Arc::new(NoMenu),
            RecordingFrontend::answering(answer),
        )
        .unwrap();
        shop.catalog.load_cached().unwrap();
        shop
    }

    fn json_catalog(names: &[&str]) -> String {
        let records: Vec<_> = names
            .iter()
            .map(|name| {
                serde_json::json!({
                    "name": name,
                    "description": "",
                    "bundle_url": format!("http://127.0.0.1:9/{name}.AppImage"),
                    "icon_url": "",
                    "category": "Graphics",
                    "category_key": "graphics",
                    "version": "1.0",
                    "details": "",
                    "license": "GPL",
                    "size": "1 MB",
                    "last_updated": "2024-01-01",
                })
            })
            .collect();
        serde_json::Value::Array(records).to_string()
    }

    #[test]
    fn test_unknown_app_suggests_closest_name() {
        let temp_dir = TempDir::new().unwrap();
        let shop = shop(&temp_dir, true);
        let error = shop.entry("krta").unwrap_err();
        let msg = error.to_string();
        assert!(msg.contains("did you mean `Krita`"), "Expected suggestion in: {msg}");
    }

    #[test]
    fn test_declined_install_starts_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut shop = shop(&temp_dir, false);
        assert!(!shop.install("Krita", None).unwrap());
        assert!(!shop.manager().has_active());
        assert_eq!(shop.frontend().prompts(), vec!["Install Krita 1.0?".to_string()]);
    }

    #[tokio::test]
    async fn test_declined_remove_keeps_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let mut shop = shop(&temp_dir, false);
        let artifact = shop.manager().layout().artifact_path("Krita");
        std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        std::fs::write(&artifact, b"ELF").unwrap();

        assert!(!shop.remove("Krita").await.unwrap());
        assert!(artifact.exists());
        assert!(shop.frontend().notices().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_remove_notifies() {
        let temp_dir = TempDir::new().unwrap();
        let mut shop = shop(&temp_dir, true);
        let artifact = shop.manager().layout().artifact_path("Krita");
        std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        std::fs::write(&artifact, b"ELF").unwrap();

        assert!(shop.remove("Krita").await.unwrap());
        assert!(!artifact.exists());
        assert_eq!(shop.frontend().notices()[0].message, "Krita removed");
    }

    #[test]
    fn test_reset_settings_requires_confirmation() {
        let temp_dir = TempDir::new().unwrap();
        let mut declined = shop(&temp_dir, false);
        declined.set_setting("theme", "dark").unwrap();
        assert!(!declined.reset_settings().unwrap());
        assert_eq!(declined.settings().theme, config::Theme::Dark);

        let mut confirmed = shop(&temp_dir, true);
        confirmed.set_setting("theme", "dark").unwrap();
        assert!(confirmed.reset_settings().unwrap());
        assert_eq!(confirmed.settings().theme, config::Theme::System);
        let saved = Settings::load(&confirmed.paths().config_file).unwrap();
        assert_eq!(saved.theme, config::Theme::System);
    }

    #[test]
    fn test_listing_reports_installed_state() {
        let temp_dir = TempDir::new().unwrap();
        let shop = shop(&temp_dir, true);
        let artifact = shop.manager().layout().artifact_path("Inkscape");
        std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        std::fs::write(&artifact, b"ELF").unwrap();

        let listing = shop.listing(&CatalogFilter::default());
        let installed: Vec<_> = listing
            .iter()
            .filter(|(_, state)| state.installed)
            .map(|(entry, _)| entry.name.as_str())
            .collect();
        assert_eq!(installed, vec!["Inkscape"]);
    }
}
