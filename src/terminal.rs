//! Terminal frontend: y/N prompts, notices on stdout, one progress bar per
//! active download.

use std::collections::HashMap;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Mutex;

use bundleshop_core::{DownloadTask, Frontend, Notice, NoticeKind, TaskStatus};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::debug;

pub(crate) fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_show_progress(stderr_is_terminal: bool, quiet: bool, dumb: bool) -> bool {
    stderr_is_terminal && !quiet && !dumb
}

pub(crate) fn init_tracing(default_level: &str, no_color: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}

pub(crate) fn parse_answer(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub(crate) struct TerminalFrontend {
    assume_yes: bool,
    quiet: bool,
    show_progress: bool,
    progress: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl TerminalFrontend {
    pub(crate) fn new(assume_yes: bool, quiet: bool) -> Self {
        Self {
            assume_yes,
            quiet,
            show_progress: should_show_progress(
                io::stderr().is_terminal(),
                quiet,
                is_dumb_terminal(),
            ),
            progress: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:>16.bold} [{bar:30}] {msg}")
            .map(|style| style.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    fn print_line(&self, line: &str, to_stderr: bool) {
        self.progress.suspend(|| {
            if to_stderr {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        });
    }
}

impl Frontend for TerminalFrontend {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        if !io::stdin().is_terminal() {
            debug!(prompt, "stdin is not a terminal, declining");
            self.print_line(&format!("{prompt} [y/N] no (pass --yes to confirm)"), true);
            return false;
        }
        self.progress.suspend(|| {
            eprint!("{prompt} [y/N] ");
            let _ = io::stderr().flush();
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).is_ok() && parse_answer(&line)
        })
    }

    fn notify(&self, notice: &Notice) {
        match notice.kind {
            NoticeKind::Error => self.print_line(&format!("error: {notice}"), true),
            NoticeKind::Info | NoticeKind::Success if !self.quiet => {
                self.print_line(&notice.message, false);
            }
            NoticeKind::Info | NoticeKind::Success => {}
        }
    }

    fn task_updated(&self, task: &DownloadTask) {
        if !self.show_progress {
            return;
        }
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let bar = bars.entry(task.app_name.clone()).or_insert_with(|| {
            let bar = self.progress.add(ProgressBar::new(100));
            bar.set_style(Self::bar_style());
            bar.set_prefix(task.app_name.clone());
            bar
        });
        bar.set_position(percent(task.progress));
        bar.set_message(task.status_text.clone());

        if task.status.is_terminal() {
            if matches!(task.status, TaskStatus::Completed) {
                bar.finish_with_message(task.status_text.clone());
            } else {
                bar.abandon_with_message(task.status_text.clone());
            }
            bars.remove(&task.app_name);
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(progress: f64) -> u64 {
    (progress.clamp(0.0, 1.0) * 100.0).round() as u64
}
