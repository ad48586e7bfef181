use console::style;
use serde_json::json;

use crate::cli::commands::proceed_with_elevation;
use crate::error::Result;
use crate::history;
use crate::store::{self, open_system_store};

pub async fn list(json: bool) -> Result<()> {
    let store = open_system_store()?;
    let vars = store.get_all()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&vars)?);
        return Ok(());
    }

    if vars.is_empty() {
        println!("{}", style("No environment variables found.").dim());
        return Ok(());
    }

    println!("{}", style("System environment variables").bold().cyan());
    println!();
    for (name, value) in &vars {
        println!("  {} = {}", style(name).cyan(), value);
    }
    println!();
    println!("{}", style(format!("{} variables", vars.len())).dim());

    Ok(())
}

pub async fn set(name: &str, value: &str, no_elevate: bool) -> Result<()> {
    if !proceed_with_elevation(no_elevate)? {
        return Ok(());
    }

    let store = open_system_store()?;
    store::set_and_broadcast(store.as_ref(), name, value)?;

    history::record("env.set", json!({ "name": name, "value": value }));

    println!(
        "{} Set {} and broadcast the change.",
        style("✓").green().bold(),
        style(name).cyan()
    );
    println!(
        "  {}",
        style("Open a new terminal for the change to take effect.").dim()
    );

    Ok(())
}

pub async fn delete(name: &str, yes: bool, no_elevate: bool) -> Result<()> {
    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Delete the system variable {name}?"))
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

    let store = open_system_store()?;
    store.delete(name)?;
    store::broadcast::notify_environment_changed();

    history::record("env.delete", json!({ "name": name }));

    println!("{} Deleted {}.", style("✓").green().bold(), style(name).cyan());

    Ok(())
}

pub async fn refresh_path(no_elevate: bool) -> Result<()> {
    if !proceed_with_elevation(no_elevate)? {
        return Ok(());
    }

    let store = open_system_store()?;

    if store::refresh_path(store.as_ref()) {
        history::record("env.refresh_path", json!({}));
        println!(
            "{} PATH cleaned: duplicates, empty segments and dead directories removed.",
            style("✓").green().bold()
        );
    } else {
        println!(
            "{} PATH refresh failed; see the log for details.",
            style("✕").red().bold()
        );
    }

    Ok(())
}
