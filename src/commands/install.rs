//! Install, remove and launch, plus driving downloads to completion.

use std::time::Duration;

use anyhow::{Result, bail};
use bundleshop_core::{CancelToken, ManagerEvent, Shop, TaskStatus};
use tracing::{info, warn};

use crate::cli::InstallArgs;
use crate::terminal::TerminalFrontend;

const EVENT_POLL: Duration = Duration::from_millis(250);

/// Outcome counts of one install run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InstallSummary {
    pub completed: usize,
    pub canceled: usize,
    pub failed: usize,
}

impl InstallSummary {
    fn count(&mut self, status: &TaskStatus) {
        match status {
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Canceled => self.canceled += 1,
            TaskStatus::Failed { .. } => self.failed += 1,
            TaskStatus::Starting | TaskStatus::Downloading | TaskStatus::Canceling => {}
        }
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failed == 0 && self.canceled == 0
    }
}

pub async fn run_install_command(
    shop: &mut Shop<TerminalFrontend>,
    args: &InstallArgs,
) -> Result<InstallSummary> {
    if args.version.is_some() && args.names.len() > 1 {
        bail!("--app-version can only be used with a single application");
    }
    shop.load_catalog().await?;

    let mut started = 0usize;
    for name in &args.names {
        match shop.install(name, args.version.as_deref()) {
            Ok(true) => started += 1,
            Ok(false) => info!(app = %name, "install declined"),
            // Already reported through the frontend; keep going with the rest.
            Err(error) => warn!(app = %name, error = %error, "install not started"),
        }
    }
    if started == 0 {
        return Ok(InstallSummary::default());
    }
    Ok(drive_downloads(shop).await)
}

/// Runs downloads until none is active. The first Ctrl-C cancels them all.
pub async fn drive_downloads(shop: &mut Shop<TerminalFrontend>) -> InstallSummary {
    let interrupted = CancelToken::new();
    let watcher = {
        let interrupted = interrupted.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupted.cancel();
            }
        })
    };

    let mut summary = InstallSummary::default();
    let mut canceling = false;
    while shop.manager().has_active() {
        if interrupted.is_canceled() && !canceling {
            info!("interrupted, canceling downloads");
            shop.cancel_all();
            canceling = true;
        }
        // `next_event` only awaits the channel, so dropping it on timeout
        // loses nothing.
        match tokio::time::timeout(EVENT_POLL, shop.next_event()).await {
            Ok(Some(ManagerEvent::Finished { task, .. })) => summary.count(&task.status),
            Ok(Some(ManagerEvent::Updated(_))) | Err(_) => {}
            Ok(None) => break,
        }
    }
    shop.pump();
    watcher.abort();
    summary
}

pub async fn run_remove_command(shop: &mut Shop<TerminalFrontend>, name: &str) -> Result<()> {
    shop.load_catalog().await?;
    shop.remove(name).await?;
    Ok(())
}

pub async fn run_launch_command(shop: &mut Shop<TerminalFrontend>, name: &str) -> Result<()> {
    shop.load_catalog().await?;
    shop.launch(name)?;
    Ok(())
}
