//! Desktop menu registration of shortcut descriptors.
//!
//! Registration is best-effort: callers log a [`MenuError`] and carry on, a
//! bundle is considered installed whether or not the menu knows about it.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Failure to run the menu tool.
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} {action} exited with {status}: {stderr}")]
    Failed {
        program: &'static str,
        action: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Registers and removes shortcut descriptors with the desktop menu.
///
/// # Object Safety
///
/// Uses `async_trait` so the manager can hold an `Arc<dyn MenuIntegration>`.
#[async_trait]
pub trait MenuIntegration: Send + Sync {
    async fn register(&self, shortcut: &Path) -> Result<(), MenuError>;

    async fn unregister(&self, shortcut: &Path) -> Result<(), MenuError>;
}

/// Runs `xdg-desktop-menu install|uninstall --novendor <path>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XdgDesktopMenu;

const XDG_DESKTOP_MENU: &str = "xdg-desktop-menu";

impl XdgDesktopMenu {
    async fn run(action: &'static str, shortcut: &Path) -> Result<(), MenuError> {
        let output = Command::new(XDG_DESKTOP_MENU)
            .arg(action)
            .arg("--novendor")
            .arg(shortcut)
            .output()
            .await
            .map_err(|source| MenuError::Spawn {
                program: XDG_DESKTOP_MENU,
                source,
            })?;

        if output.status.success() {
            debug!(action, path = %shortcut.display(), "menu updated");
            Ok(())
        } else {
            Err(MenuError::Failed {
                program: XDG_DESKTOP_MENU,
                action,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[async_trait]
impl MenuIntegration for XdgDesktopMenu {
    #[instrument(skip(self), fields(path = %shortcut.display()))]
    async fn register(&self, shortcut: &Path) -> Result<(), MenuError> {
        Self::run("install", shortcut).await
    }

    #[instrument(skip(self), fields(path = %shortcut.display()))]
    async fn unregister(&self, shortcut: &Path) -> Result<(), MenuError> {
        Self::run("uninstall", shortcut).await
    }
}

/// Leaves the desktop menu alone. Used for `--no-menu` and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMenu;

#[async_trait]
impl MenuIntegration for NoMenu {
    async fn register(&self, _shortcut: &Path) -> Result<(), MenuError> {
        Ok(())
    }

    async fn unregister(&self, _shortcut: &Path) -> Result<(), MenuError> {
        Ok(())
    }
}
