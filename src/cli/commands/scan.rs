use std::path::PathBuf;

use console::style;
use tokio::sync::mpsc::unbounded_channel;

use crate::config::AppConfig;
use crate::error::Result;
use crate::scanner::{self, Installation};
use crate::tui;

pub async fn execute(config: &AppConfig, catalog_override: Option<PathBuf>, json: bool) -> Result<()> {
    let catalog_path = catalog_override.unwrap_or_else(|| config.scan_config.clone());
    let catalog = scanner::load_scan_config(&catalog_path);

    if catalog.is_empty() {
        println!(
            "{} Scan catalog {} is empty or missing; run `envvault init` to install the default one.",
            style("!").yellow().bold(),
            style(catalog_path.display()).dim()
        );
        return Ok(());
    }

    let (tx, rx) = unbounded_channel();
    let progress = tokio::spawn(tui::follow_scan_progress(rx, tui::scan_spinner()));

    let results = scanner::scan(&catalog, Some(tx)).await;
    let _ = progress.await;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{}", style("No installations found.").dim());
        return Ok(());
    }

    for (tool, installations) in &results {
        println!();
        println!(
            "{} {}",
            style(tool).bold().cyan(),
            style(format!("({} found)", installations.len())).dim()
        );
        for installation in installations {
            print_installation(installation);
        }
    }

    Ok(())
}

fn print_installation(installation: &Installation) {
    let marker = if installation.is_active() {
        style("●").green()
    } else {
        style("○").dim()
    };
    println!(
        "  {} {}  {}",
        marker,
        installation.install_path.display(),
        style(format!("version {}", installation.version)).dim()
    );

    for (var, status) in &installation.env_status {
        let state = if status.exists && !status.value.is_empty() {
            style(status.value.as_str()).dim().to_string()
        } else {
            style("not set").red().to_string()
        };
        println!("      {} = {}", style(var).cyan(), state);
    }

    for recommendation in &installation.recommendations {
        println!("      {} {}", style("·").dim(), recommendation);
    }
}
