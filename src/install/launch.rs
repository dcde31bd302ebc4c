//! Launching installed bundles.

use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::info;

use super::layout::InstallLayout;
use crate::catalog::CatalogEntry;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{name} is not installed")]
    NotInstalled { name: String },

    #[error("failed to start {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Starts the installed artifact detached from the caller; returns its pid.
///
/// # Errors
///
/// Returns [`LaunchError::NotInstalled`] when the artifact is absent.
pub fn launch(entry: &CatalogEntry, layout: &InstallLayout) -> Result<u32, LaunchError> {
    let artifact = layout.artifact_path(&entry.name);
    if !artifact.is_file() {
        return Err(LaunchError::NotInstalled {
            name: entry.name.clone(),
        });
    }

    let child = Command::new(&artifact)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            name: entry.name.clone(),
            source,
        })?;

    let pid = child.id();
    info!(name = %entry.name, pid, "launched bundle");
    Ok(pid)
}
