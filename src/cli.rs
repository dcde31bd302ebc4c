//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Browse, install and manage portable application bundles.
///
/// Bundleshop fetches a hosted catalog of AppImages, installs them under
/// `~/.local/bin/AppImages` with a desktop shortcut, and keeps a download
/// history.
#[derive(Parser, Debug)]
#[command(name = "bundleshop")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Do not register shortcuts with the desktop menu
    #[arg(long, global = true)]
    pub no_menu: bool,

    /// Install directory (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Catalog URL (overrides the config file)
    #[arg(long, global = true, value_name = "URL")]
    pub catalog_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List catalog entries
    List(ListArgs),

    /// Show details of one entry
    Info {
        /// Application name
        name: String,
    },

    /// Download and install one or more applications
    Install(InstallArgs),

    /// Uninstall an application
    Remove {
        /// Application name
        name: String,
    },

    /// Start an installed application
    Launch {
        /// Application name
        name: String,
    },

    /// Fetch the catalog now and update the cache
    Refresh,

    /// Show or clear the download history
    History {
        /// Clear the persisted history
        #[arg(long)]
        clear: bool,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Edit a catalog file
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Case-insensitive text matched against name, description and tags
    #[arg(short, long)]
    pub search: Option<String>,

    /// Category key, or `all`
    #[arg(short, long)]
    pub category: Option<String>,

    /// Only show installed applications
    #[arg(long)]
    pub installed: bool,

    /// Only show applications with an update available
    #[arg(long, conflicts_with = "installed")]
    pub updates: bool,

    /// Refresh the catalog before listing
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Application names
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Install this version instead of the current one (single name only)
    #[arg(long = "app-version", value_name = "VERSION")]
    pub version: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print every setting and the config file path
    Show,
    /// Print one setting
    Get { key: String },
    /// Change one setting
    Set { key: String, value: String },
    /// Restore all defaults
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Validate a catalog file and report rejected records
    Check { file: PathBuf },

    /// Insert or replace an entry read from a JSON object file (`-` for stdin)
    Upsert {
        file: PathBuf,
        #[arg(long, value_name = "ENTRY_JSON")]
        from: PathBuf,
    },

    /// Delete an entry by name
    Remove { file: PathBuf, name: String },
}
