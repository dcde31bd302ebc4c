//! Config command handlers: show, get, set and reset settings.

use anyhow::{Result, anyhow};
use bundleshop_core::Shop;

use crate::cli::ConfigCommand;
use crate::terminal::TerminalFrontend;

pub fn run_config_command(
    shop: &mut Shop<TerminalFrontend>,
    command: &ConfigCommand,
) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config_path = &shop.paths().config_file;
            println!("config_path = {}", config_path.display());
            println!(
                "config_file = {}",
                if config_path.is_file() {
                    "loaded"
                } else {
                    "not found (using defaults)"
                }
            );
            println!();
            print!("{}", shop.settings().to_ini_string());
        }
        ConfigCommand::Get { key } => {
            let value = shop
                .settings()
                .get(key)
                .ok_or_else(|| anyhow!("unknown setting `{key}`"))?;
            println!("{value}");
        }
        ConfigCommand::Set { key, value } => {
            shop.set_setting(key, value)?;
            if let Some(stored) = shop.settings().get(key) {
                println!("{key} = {stored}");
            }
        }
        ConfigCommand::Reset => {
            shop.reset_settings()?;
        }
    }
    Ok(())
}
