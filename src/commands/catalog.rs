//! Catalog browsing: list, info and refresh.

use anyhow::Result;
use bundleshop_core::catalog::{ALL_CATEGORIES, CatalogEntry, CatalogFilter, CatalogSnapshot};
use bundleshop_core::{InstalledState, Shop};

use crate::cli::ListArgs;
use crate::terminal::TerminalFrontend;

pub async fn run_refresh_command(shop: &mut Shop<TerminalFrontend>) -> Result<()> {
    let snapshot = shop.refresh_catalog().await?;
    report_snapshot(&snapshot);
    Ok(())
}

pub async fn run_list_command(shop: &mut Shop<TerminalFrontend>, args: &ListArgs) -> Result<()> {
    let snapshot = if args.refresh {
        shop.refresh_catalog().await?
    } else {
        shop.load_catalog().await?
    };
    if !snapshot.rejected.is_empty() {
        tracing::info!(rejected = snapshot.rejected.len(), "some catalog records were skipped");
    }

    let filter = CatalogFilter::new(
        args.search.as_deref().unwrap_or_default(),
        args.category.as_deref().unwrap_or(ALL_CATEGORIES),
    );
    let rows: Vec<String> = shop
        .listing(&filter)
        .into_iter()
        .filter(|(_, state)| !args.installed || state.installed)
        .filter(|(_, state)| !args.updates || state.update_available)
        .map(|(entry, state)| list_row(entry, &state))
        .collect();

    if rows.is_empty() {
        println!("No matching applications");
    }
    for row in rows {
        println!("{row}");
    }
    Ok(())
}

pub async fn run_info_command(shop: &mut Shop<TerminalFrontend>, name: &str) -> Result<()> {
    shop.load_catalog().await?;
    let state = shop.installed_state(name)?;
    let entry = shop.entry(name)?;
    print!("{}", info_text(entry, &state));
    Ok(())
}

fn report_snapshot(snapshot: &CatalogSnapshot) {
    let source = if snapshot.stale { "cache" } else { "network" };
    println!(
        "{} applications loaded from the {source}",
        snapshot.entries.len()
    );
    for rejected in &snapshot.rejected {
        let name = rejected.name.as_deref().unwrap_or("<unnamed>");
        println!("skipped record #{} ({name}): {}", rejected.index, rejected.error);
    }
}

pub(crate) fn state_label(state: &InstalledState) -> String {
    match (&state.installed_version, state.update_available) {
        (Some(version), true) => format!("installed {version}, update available"),
        (Some(version), false) => format!("installed {version}"),
        (None, _) => String::new(),
    }
}

fn list_row(entry: &CatalogEntry, state: &InstalledState) -> String {
    let label = state_label(state);
    let mut row = format!("{:<24} {:<12} {:<14}", entry.name, entry.version, entry.category);
    if !label.is_empty() {
        row.push_str(&format!(" [{label}]"));
    }
    row.trim_end().to_string()
}

fn info_text(entry: &CatalogEntry, state: &InstalledState) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "{} {}", entry.name, entry.version);
    if !entry.description.is_empty() {
        let _ = writeln!(out, "{}", entry.description);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "category     = {} ({})", entry.category, entry.category_key);
    let _ = writeln!(out, "license      = {}", entry.license);
    let _ = writeln!(out, "size         = {}", entry.size);
    let _ = writeln!(out, "last_updated = {}", entry.last_updated);
    if !entry.tags.is_empty() {
        let _ = writeln!(out, "tags         = {}", entry.tags.join(", "));
    }
    let versions: Vec<&str> = entry.versions().collect();
    let _ = writeln!(out, "versions     = {}", versions.join(", "));
    let status = state_label(state);
    let _ = writeln!(
        out,
        "status       = {}",
        if status.is_empty() { "not installed" } else { &status }
    );
    if !entry.details.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", entry.details);
    }
    for shot in &entry.screenshots {
        let _ = writeln!(out, "screenshot: {} {}", shot.url, shot.caption);
    }
    out
}
