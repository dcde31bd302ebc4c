//! Background body of one install: stream, finalize, report.
//!
//! Workers never touch the manager's tables. Everything they learn is sent as
//! a [`WorkerMessage`] over the manager's channel, in order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

use super::cancel::CancelToken;
use super::client::{HttpClient, TransferProgress};
use super::error::DownloadError;
use crate::catalog::{CatalogEntry, ResolvedVersion};
use crate::fs_util::{remove_if_exists, write_atomic};
use crate::install::{InstallLayout, MenuIntegration, shortcut};

/// Message from a worker to the owning manager.
#[derive(Debug)]
pub(crate) enum WorkerMessage {
    Progress {
        app_name: String,
        task_id: u64,
        transfer: TransferProgress,
    },
    Finished {
        app_name: String,
        task_id: u64,
        outcome: WorkerOutcome,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WorkerOutcome {
    Completed,
    Canceled,
    Failed(String),
}

/// Everything a worker needs, owned so it can move into the spawned task.
pub(crate) struct InstallJob {
    pub task_id: u64,
    pub entry: CatalogEntry,
    pub target: ResolvedVersion,
    pub layout: InstallLayout,
    pub client: HttpClient,
    pub menu: Arc<dyn MenuIntegration>,
    pub cancel: CancelToken,
}

#[instrument(skip_all, fields(app = %job.entry.name, version = %job.target.version, task_id = job.task_id))]
pub(crate) async fn run(job: InstallJob, sender: UnboundedSender<WorkerMessage>) {
    let outcome = install(&job, &sender).await;
    match &outcome {
        WorkerOutcome::Completed => info!("install completed"),
        WorkerOutcome::Canceled => info!("install canceled"),
        WorkerOutcome::Failed(reason) => warn!(reason = %reason, "install failed"),
    }
    let _ = sender.send(WorkerMessage::Finished {
        app_name: job.entry.name.clone(),
        task_id: job.task_id,
        outcome,
    });
}

async fn install(job: &InstallJob, sender: &UnboundedSender<WorkerMessage>) -> WorkerOutcome {
    let name = &job.entry.name;
    if let Err(error) = job.layout.ensure_dirs() {
        return WorkerOutcome::Failed(
            DownloadError::io(job.layout.install_dir(), error).to_string(),
        );
    }

    let partial = job.layout.partial_path(name, job.task_id);
    let transfer = job
        .client
        .download_to_path(&job.target.bundle_url, &partial, &job.cancel, |transfer| {
            let _ = sender.send(WorkerMessage::Progress {
                app_name: name.clone(),
                task_id: job.task_id,
                transfer,
            });
        })
        .await;

    match transfer {
        Ok(_) if job.cancel.is_canceled() => {
            discard(&partial);
            WorkerOutcome::Canceled
        }
        Ok(_) => match finalize(job, &partial).await {
            Ok(artifact) => {
                debug!(path = %artifact.display(), "artifact in place");
                WorkerOutcome::Completed
            }
            Err(error) => {
                discard(&partial);
                WorkerOutcome::Failed(error.to_string())
            }
        },
        Err(error) if error.is_canceled() => WorkerOutcome::Canceled,
        Err(error) => WorkerOutcome::Failed(error.to_string()),
    }
}

/// Makes the download executable, moves it into place and writes the
/// desktop integration. The artifact is removed if any step after the
/// rename fails.
async fn finalize(job: &InstallJob, partial: &Path) -> Result<PathBuf, DownloadError> {
    mark_executable(partial)
        .await
        .map_err(|e| DownloadError::io(partial, e))?;

    let artifact = job.layout.artifact_path(&job.entry.name);
    tokio::fs::rename(partial, &artifact)
        .await
        .map_err(|e| DownloadError::io(&artifact, e))?;

    fetch_icon(job).await;

    let shortcut_path = match shortcut::write(&job.entry, &job.layout, &job.target.version) {
        Ok(path) => path,
        Err(error) => {
            discard(&artifact);
            return Err(DownloadError::io(job.layout.shortcut_path(&job.entry.name), error));
        }
    };

    if let Err(error) = job.menu.register(&shortcut_path).await {
        warn!(error = %error, "desktop menu registration failed");
    }

    Ok(artifact)
}

#[cfg(unix)]
async fn mark_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await
}

#[cfg(not(unix))]
async fn mark_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Best-effort icon download; failures are logged only.
async fn fetch_icon(job: &InstallJob) {
    if job.entry.icon_url.is_empty() {
        return;
    }
    let icon_path = job.layout.icon_path(&job.entry.name);
    let result = match job.client.fetch_bytes(&job.entry.icon_url).await {
        Ok(bytes) => write_atomic(&icon_path, &bytes).map_err(|e| DownloadError::io(&icon_path, e)),
        Err(error) => Err(error),
    };
    if let Err(error) = result {
        warn!(error = %error, "icon download failed");
    }
}

fn discard(path: &Path) {
    if let Err(error) = remove_if_exists(path) {
        warn!(path = %path.display(), error = %error, "failed to remove file");
    }
}
