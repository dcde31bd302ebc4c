//! Download history listing and clearing.

use anyhow::Result;
use bundleshop_core::{HistoryRecord, Shop};

use crate::terminal::TerminalFrontend;

pub fn run_history_command(shop: &mut Shop<TerminalFrontend>, clear: bool) -> Result<()> {
    if clear {
        shop.clear_history()?;
        return Ok(());
    }

    let records = shop.history();
    if records.is_empty() {
        println!("No downloads yet");
        return Ok(());
    }
    for record in &records {
        println!("{}", history_row(record));
    }
    Ok(())
}

fn history_row(record: &HistoryRecord) -> String {
    let version = if record.target_version.is_empty() {
        "-"
    } else {
        record.target_version.as_str()
    };
    format!(
        "{}  {:<24} {:<10} {}",
        record.timestamp.format("%Y-%m-%d %H:%M"),
        record.app_name,
        version,
        record.status_text
    )
}
