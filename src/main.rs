//! CLI entry point for bundleshop.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use bundleshop_core::{MenuIntegration, NoMenu, Settings, Shop, ShopPaths, XdgDesktopMenu};
use clap::Parser;
use tracing::debug;

mod cli;
mod commands;
mod terminal;

use cli::{Cli, Command};
use terminal::TerminalFrontend;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };
    let no_color = terminal::no_color_env_requested() || terminal::is_dumb_terminal();
    terminal::init_tracing(default_level, no_color);
    debug!(?cli, "CLI arguments parsed");

    let frontend = TerminalFrontend::new(cli.yes, cli.quiet);

    // Editing a catalog file needs neither the network nor the user's paths.
    if let Command::Catalog { command } = &cli.command {
        let ok = commands::run_catalog_command(&frontend, command)?;
        return Ok(exit_code(ok));
    }

    let paths = ShopPaths::from_env()?;
    let mut settings = Settings::load(&paths.config_file)?;
    // Overrides apply to this run only; `config set` persists the file values.
    if !matches!(cli.command, Command::Config { .. }) {
        if let Some(dir) = &cli.install_dir {
            settings.install_dir.clone_from(dir);
        }
        if let Some(url) = &cli.catalog_url {
            settings.catalog_url.clone_from(url);
        }
    }
    let menu: Arc<dyn MenuIntegration> = if cli.no_menu {
        Arc::new(NoMenu)
    } else {
        Arc::new(XdgDesktopMenu)
    };
    let mut shop = Shop::new(paths, settings, menu, frontend)?;

    let ok = match &cli.command {
        Command::List(args) => {
            commands::run_list_command(&mut shop, args).await?;
            true
        }
        Command::Info { name } => {
            commands::run_info_command(&mut shop, name).await?;
            true
        }
        Command::Install(args) => commands::run_install_command(&mut shop, args)
            .await?
            .succeeded(),
        Command::Remove { name } => {
            commands::run_remove_command(&mut shop, name).await?;
            true
        }
        Command::Launch { name } => {
            commands::run_launch_command(&mut shop, name).await?;
            true
        }
        Command::Refresh => {
            commands::run_refresh_command(&mut shop).await?;
            true
        }
        Command::History { clear } => {
            commands::run_history_command(&mut shop, *clear)?;
            true
        }
        Command::Config { command } => {
            commands::run_config_command(&mut shop, command)?;
            true
        }
        Command::Catalog { .. } => true,
    };

    Ok(exit_code(ok))
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
