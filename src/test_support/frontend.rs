use std::sync::Mutex;

use crate::download::DownloadTask;
use crate::frontend::{Frontend, Notice};

/// Answers every confirmation the same way and records what it was shown.
#[derive(Debug, Default)]
pub struct RecordingFrontend {
    answer: bool,
    prompts: Mutex<Vec<String>>,
    notices: Mutex<Vec<Notice>>,
    updates: Mutex<Vec<DownloadTask>>,
}

#[allow(clippy::unwrap_used)]
impl RecordingFrontend {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<DownloadTask> {
        self.updates.lock().unwrap().clone()
    }
}

#[allow(clippy::unwrap_used)]
impl Frontend for RecordingFrontend {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }

    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }

    fn task_updated(&self, task: &DownloadTask) {
        self.updates.lock().unwrap().push(task.clone());
    }
}
