//! Download manager: the active-task table and its state machine.
//!
//! # Overview
//!
//! The manager is owned by one interactive context. [`start_install`]
//! spawns one tokio task per download; workers report over an unbounded
//! channel, and the owner drains that channel with [`next_event`] or
//! [`try_next_event`]. Applying a message is the only way the active table
//! and the history change, so there is a single writer.
//!
//! [`start_install`]: DownloadManager::start_install
//! [`next_event`]: DownloadManager::next_event
//! [`try_next_event`]: DownloadManager::try_next_event

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, instrument, warn};

use super::cancel::CancelToken;
use super::client::HttpClient;
use super::error::{ManagerError, NotFoundError, RemovalError};
use super::task::{DownloadTask, TaskStatus};
use super::worker::{self, InstallJob, WorkerMessage, WorkerOutcome};
use crate::catalog::CatalogEntry;
use crate::frontend::Notice;
use crate::fs_util::remove_if_exists;
use crate::history::{HistoryError, HistoryRecord, HistoryStore};
use crate::install::{self, InstallLayout, InstalledState, MenuIntegration};

/// What changed after applying one worker message.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    /// An active task made progress.
    Updated(DownloadTask),
    /// A task reached a terminal state and left the active table.
    Finished { task: DownloadTask, notice: Notice },
}

struct ActiveDownload {
    task: DownloadTask,
    cancel: CancelToken,
}

pub struct DownloadManager {
    client: HttpClient,
    layout: InstallLayout,
    menu: Arc<dyn MenuIntegration>,
    history: HistoryStore,
    active: HashMap<String, ActiveDownload>,
    sender: UnboundedSender<WorkerMessage>,
    receiver: UnboundedReceiver<WorkerMessage>,
    next_task_id: u64,
}

impl std::fmt::Debug for DownloadManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadManager")
            .field("layout", &self.layout)
            .field("active", &self.active.keys().collect::<Vec<_>>())
            .field("history", &self.history.path())
            .finish_non_exhaustive()
    }
}

impl DownloadManager {
    #[must_use]
    pub fn new(
        client: HttpClient,
        layout: InstallLayout,
        menu: Arc<dyn MenuIntegration>,
        history: HistoryStore,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            client,
            layout,
            menu,
            history,
            active: HashMap::new(),
            sender,
            receiver,
            next_task_id: 1,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    #[must_use]
    pub fn installed_state(&self, entry: &CatalogEntry) -> InstalledState {
        install::resolve(entry, &self.layout)
    }

    /// Starts installing `entry` at the selected version.
    ///
    /// `None` selects the entry's current version. Must be called from
    /// within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`ManagerError::UnknownVersion`] when the selector matches nothing.
    /// - [`ManagerError::Conflict`] when a download for the name is active.
    #[instrument(skip(self, entry), fields(app = %entry.name))]
    pub fn start_install(
        &mut self,
        entry: &CatalogEntry,
        version: Option<&str>,
    ) -> Result<(), ManagerError> {
        let target =
            entry
                .resolve_version(version)
                .ok_or_else(|| ManagerError::UnknownVersion {
                    app_name: entry.name.clone(),
                    version: version.unwrap_or_default().to_string(),
                })?;

        if self.active.contains_key(&entry.name) {
            return Err(ManagerError::Conflict {
                app_name: entry.name.clone(),
            });
        }

        let task_id = self.next_task_id;
        self.next_task_id += 1;

        let task = DownloadTask::new(task_id, &entry.name, &target.version);
        self.record_history(&task);

        let cancel = CancelToken::new();
        let job = InstallJob {
            task_id,
            entry: entry.clone(),
            target,
            layout: self.layout.clone(),
            client: self.client.clone(),
            menu: Arc::clone(&self.menu),
            cancel: cancel.clone(),
        };
        self.active
            .insert(entry.name.clone(), ActiveDownload { task, cancel });

        let handle = tokio::spawn(worker::run(job, self.sender.clone()));
        let sender = self.sender.clone();
        let app_name = entry.name.clone();
        tokio::spawn(async move {
            if let Err(error) = handle.await {
                warn!(app = %app_name, error = %error, "download worker stopped unexpectedly");
                let _ = sender.send(WorkerMessage::Finished {
                    app_name,
                    task_id,
                    outcome: WorkerOutcome::Failed(format!("worker stopped: {error}")),
                });
            }
        });

        info!(task_id, "download started");
        Ok(())
    }

    /// Requests cancellation of the active download for `app_name`.
    ///
    /// Returns immediately; the worker stops at its next chunk boundary and
    /// the task finishes as `Canceled` when that message is applied.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no download is active for the name.
    pub fn cancel(&mut self, app_name: &str) -> Result<(), NotFoundError> {
        let active = self.active.get_mut(app_name).ok_or_else(|| NotFoundError {
            app_name: app_name.to_string(),
        })?;
        active.cancel.cancel();
        active.task.mark_canceling();
        info!(app = app_name, "cancellation requested");
        Ok(())
    }

    /// Cancels every active download.
    pub fn cancel_all(&mut self) {
        for active in self.active.values_mut() {
            active.cancel.cancel();
            active.task.mark_canceling();
        }
    }

    /// Uninstalls `entry`: artifact, shortcut, icon and menu entry.
    ///
    /// Only failing to delete an existing artifact is an error; the rest is
    /// best-effort.
    ///
    /// # Errors
    ///
    /// - [`RemovalError::Busy`] while a download for the name is active.
    /// - [`RemovalError::Artifact`] when the artifact cannot be deleted.
    #[instrument(skip(self, entry), fields(app = %entry.name))]
    pub async fn remove(&mut self, entry: &CatalogEntry) -> Result<(), RemovalError> {
        if self.active.contains_key(&entry.name) {
            return Err(RemovalError::Busy {
                app_name: entry.name.clone(),
            });
        }

        let artifact = self.layout.artifact_path(&entry.name);
        remove_if_exists(&artifact)
            .map_err(|source| RemovalError::Artifact {
                path: artifact.clone(),
                source,
            })?;

        let shortcut = self.layout.shortcut_path(&entry.name);
        if shortcut.exists() {
            if let Err(error) = self.menu.unregister(&shortcut).await {
                warn!(error = %error, "desktop menu de-registration failed");
            }
            if let Err(error) = remove_if_exists(&shortcut) {
                warn!(path = %shortcut.display(), error = %error, "failed to delete shortcut");
            }
        }

        let icon = self.layout.icon_path(&entry.name);
        if let Err(error) = remove_if_exists(&icon) {
            warn!(path = %icon.display(), error = %error, "failed to delete cached icon");
        }

        info!("bundle removed");
        Ok(())
    }

    /// Waits for the next worker message and applies it.
    ///
    /// Returns `None` once no download is active and no message is pending.
    pub async fn next_event(&mut self) -> Option<ManagerEvent> {
        loop {
            let message = if self.active.is_empty() {
                self.receiver.try_recv().ok()?
            } else {
                self.receiver.recv().await?
            };
            if let Some(event) = self.apply(message) {
                return Some(event);
            }
        }
    }

    /// Applies the next pending worker message without waiting.
    pub fn try_next_event(&mut self) -> Option<ManagerEvent> {
        loop {
            let message = self.receiver.try_recv().ok()?;
            if let Some(event) = self.apply(message) {
                return Some(event);
            }
        }
    }

    fn apply(&mut self, message: WorkerMessage) -> Option<ManagerEvent> {
        match message {
            WorkerMessage::Progress {
                app_name,
                task_id,
                transfer,
            } => {
                let active = self.current(&app_name, task_id)?;
                active.task.apply_progress(transfer);
                Some(ManagerEvent::Updated(active.task.clone()))
            }
            WorkerMessage::Finished {
                app_name,
                task_id,
                outcome,
            } => {
                self.current(&app_name, task_id)?;
                let mut task = self.active.remove(&app_name)?.task;
                let notice = match outcome {
                    WorkerOutcome::Completed => {
                        task.finish(TaskStatus::Completed);
                        Notice::success(format!(
                            "{} {} installed",
                            task.app_name, task.target_version
                        ))
                    }
                    WorkerOutcome::Canceled => {
                        task.finish(TaskStatus::Canceled);
                        Notice::info(format!("Download of {} canceled", task.app_name))
                    }
                    WorkerOutcome::Failed(reason) => {
                        let notice =
                            Notice::error(format!("Failed to install {}: {reason}", task.app_name));
                        task.finish(TaskStatus::Failed { reason });
                        notice
                    }
                };
                self.record_history(&task);
                Some(ManagerEvent::Finished { task, notice })
            }
        }
    }

    /// The active entry for `app_name`, if it belongs to `task_id`.
    ///
    /// Messages from a task that already left the table are stale.
    fn current(&mut self, app_name: &str, task_id: u64) -> Option<&mut ActiveDownload> {
        let active = self.active.get_mut(app_name)?;
        if active.task.id == task_id {
            Some(active)
        } else {
            debug!(app = app_name, task_id, "ignoring stale worker message");
            None
        }
    }

    fn record_history(&mut self, task: &DownloadTask) {
        if let Err(error) = self.history.record(task) {
            warn!(app = %task.app_name, error = %error, "failed to persist history");
        }
    }

    #[must_use]
    pub fn has_active(&self) -> bool {
        !self.active.is_empty()
    }

    #[must_use]
    pub fn is_active(&self, app_name: &str) -> bool {
        self.active.contains_key(app_name)
    }

    #[must_use]
    pub fn task(&self, app_name: &str) -> Option<&DownloadTask> {
        self.active.get(app_name).map(|active| &active.task)
    }

    /// Snapshot of active tasks, oldest first.
    #[must_use]
    pub fn active_tasks(&self) -> Vec<DownloadTask> {
        let mut tasks: Vec<_> = self.active.values().map(|a| a.task.clone()).collect();
        tasks.sort_by_key(|task| task.id);
        tasks
    }

    #[must_use]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Persisted history overlaid with the live state of active tasks.
    #[must_use]
    pub fn merged_history(&self) -> Vec<HistoryRecord> {
        self.history.merged(&self.active_tasks())
    }

    /// Clears persisted history; active downloads keep running.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] when the history file cannot be written.
    pub fn clear_history(&mut self) -> Result<(), HistoryError> {
        self.history.clear()
    }
}
