use console::style;
use serde_json::json;
use tokio::sync::mpsc::unbounded_channel;

use crate::backup::{BackupCatalog, BackupEngine};
use crate::cli::commands::proceed_with_elevation;
use crate::config::AppConfig;
use crate::error::Result;
use crate::history;
use crate::tui;

pub async fn create(config: &AppConfig, description: &str, no_elevate: bool) -> Result<()> {
    if !proceed_with_elevation(no_elevate)? {
        return Ok(());
    }

    let backup_dir = config.ensure_backup_dir()?;
    let engine = BackupEngine::new(&backup_dir);

    println!(
        "{} Exporting the environment key...",
        style("→").cyan().bold()
    );

    match engine.create_backup(description).await {
        Some(snapshot) => {
            history::record(
                "backup.create",
                json!({ "file": snapshot.file_name, "description": snapshot.description }),
            );
            println!(
                "{} Snapshot created: {}",
                style("✓").green().bold(),
                style(&snapshot.file_name).cyan()
            );
            println!("  Path: {}", style(snapshot.path.display()).dim());
        }
        None => {
            println!(
                "{} Backup failed; see the log for details.",
                style("✕").red().bold()
            );
        }
    }

    Ok(())
}

pub async fn list(config: &AppConfig, json: bool) -> Result<()> {
    let catalog = BackupCatalog::new(&config.backup_dir);
    let snapshots = catalog.list();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    if snapshots.is_empty() {
        println!(
            "{}",
            style(format!("No snapshots found in {}.", catalog.dir().display())).dim()
        );
        return Ok(());
    }

    println!("{}", style("Snapshots").bold().cyan());
    println!();
    for snapshot in &snapshots {
        let description = if snapshot.description.is_empty() {
            style("(no description)").dim().to_string()
        } else {
            snapshot.description.clone()
        };
        println!(
            "  {}  {}  {}",
            style(snapshot.time()).cyan(),
            description,
            style(&snapshot.file_name).dim()
        );
    }

    Ok(())
}

pub async fn delete(config: &AppConfig, file: &str, yes: bool) -> Result<()> {
    let catalog = BackupCatalog::new(&config.backup_dir);
    let path = catalog.resolve(file);

    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Delete snapshot {}?", path.display()))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", style("Aborted.").dim());
            return Ok(());
        }
    }

    if catalog.delete(&path)? {
        history::record("backup.delete", json!({ "file": file }));
        println!("{} Snapshot deleted.", style("✓").green().bold());
    } else {
        println!(
            "{} Snapshot {} was already gone.",
            style("!").yellow().bold(),
            style(path.display()).dim()
        );
    }

    Ok(())
}

pub async fn restore(config: &AppConfig, file: &str, yes: bool, no_elevate: bool) -> Result<()> {
    let catalog = BackupCatalog::new(&config.backup_dir);
    let path = catalog.resolve(file);

    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Restoring {} overwrites the current system environment variables. Continue?",
                path.display()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", style("Aborted.").dim());
            return Ok(());
        }
    }

    if !proceed_with_elevation(no_elevate)? {
        return Ok(());
    }

    let engine = BackupEngine::new(&config.backup_dir);
    let (tx, rx) = unbounded_channel();

    // The worker restores; this task drains status messages as they
    // arrive rather than interleaving prints into the engine.
    let printer = tokio::spawn(tui::print_restore_status(rx));
    let ok = engine.restore_backup(&path, &tx).await;
    drop(tx);
    let _ = printer.await;

    history::record("backup.restore", json!({ "file": file, "ok": ok }));

    if !ok {
        std::process::exit(1);
    }

    Ok(())
}
