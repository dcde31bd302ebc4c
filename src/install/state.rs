//! Installed-state resolution: pure functions of an entry and the layout.

use super::layout::InstallLayout;
use super::shortcut;
use crate::catalog::CatalogEntry;

/// What is on disk for one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledState {
    pub installed: bool,
    pub installed_version: Option<String>,
    pub update_available: bool,
}

/// True when the artifact exists. In-flight partial files never count.
#[must_use]
pub fn is_installed(entry: &CatalogEntry, layout: &InstallLayout) -> bool {
    layout.artifact_path(&entry.name).is_file()
}

/// The installed version, or `None` when not installed.
///
/// Falls back to the catalog's current version when the shortcut descriptor
/// is missing or has no version marker, which reports "no update".
#[must_use]
pub fn installed_version(entry: &CatalogEntry, layout: &InstallLayout) -> Option<String> {
    if !is_installed(entry, layout) {
        return None;
    }
    Some(
        shortcut::read_version(&layout.shortcut_path(&entry.name))
            .unwrap_or_else(|| entry.version.clone()),
    )
}

#[must_use]
pub fn has_update(entry: &CatalogEntry, layout: &InstallLayout) -> bool {
    resolve(entry, layout).update_available
}

#[must_use]
pub fn resolve(entry: &CatalogEntry, layout: &InstallLayout) -> InstalledState {
    let installed_version = installed_version(entry, layout);
    let update_available = installed_version
        .as_deref()
        .is_some_and(|version| version != entry.version);
    InstalledState {
        installed: installed_version.is_some(),
        installed_version,
        update_available,
    }
}
