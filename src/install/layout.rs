//! Where installed bundles, shortcuts and icons live on disk.

use std::path::{Path, PathBuf};

use crate::download::constants::{BUNDLE_EXTENSION, PARTIAL_SUFFIX};

/// Filesystem layout of one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    install_dir: PathBuf,
    applications_dir: PathBuf,
    icon_dir: PathBuf,
}

impl InstallLayout {
    #[must_use]
    pub fn new(
        install_dir: impl Into<PathBuf>,
        applications_dir: impl Into<PathBuf>,
        icon_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            install_dir: install_dir.into(),
            applications_dir: applications_dir.into(),
            icon_dir: icon_dir.into(),
        }
    }

    /// Layout rooted in one directory, with `bin/`, `applications/` and
    /// `icons/` beneath it.
    #[must_use]
    pub fn under(root: &Path) -> Self {
        Self::new(
            root.join("bin"),
            root.join("applications"),
            root.join("icons"),
        )
    }

    #[must_use]
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    #[must_use]
    pub fn applications_dir(&self) -> &Path {
        &self.applications_dir
    }

    #[must_use]
    pub fn icon_dir(&self) -> &Path {
        &self.icon_dir
    }

    /// `install_dir/<name>.AppImage`
    #[must_use]
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.install_dir.join(format!("{name}.{BUNDLE_EXTENSION}"))
    }

    /// `install_dir/.<name>.AppImage.<task-id>.part`; hidden and never
    /// mistaken for an installed artifact.
    #[must_use]
    pub fn partial_path(&self, name: &str, task_id: u64) -> PathBuf {
        self.install_dir
            .join(format!(".{name}.{BUNDLE_EXTENSION}.{task_id}.{PARTIAL_SUFFIX}"))
    }

    /// `applications_dir/<name>.desktop`
    #[must_use]
    pub fn shortcut_path(&self, name: &str) -> PathBuf {
        self.applications_dir.join(format!("{name}.desktop"))
    }

    /// `icon_dir/<name>.png`
    #[must_use]
    pub fn icon_path(&self, name: &str) -> PathBuf {
        self.icon_dir.join(format!("{name}.png"))
    }

    /// Creates every directory of the layout.
    ///
    /// # Errors
    ///
    /// Returns the first directory creation failure.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.install_dir, &self.applications_dir, &self.icon_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
