//! CLI command handlers.

mod catalog;
mod config;
mod editor;
mod history;
mod install;

pub use catalog::{run_info_command, run_list_command, run_refresh_command};
pub use config::run_config_command;
pub use editor::run_catalog_command;
pub use history::run_history_command;
pub use install::{run_install_command, run_launch_command, run_remove_command};
