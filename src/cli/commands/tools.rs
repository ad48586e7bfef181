use console::style;

use crate::config::AppConfig;
use crate::error::Result;
use crate::tools;

pub async fn list(config: &AppConfig) -> Result<()> {
    let catalog = tools::load_catalog(&config.tools_config);

    println!("{}", style("System tools").bold().cyan());
    println!();
    for (id, entry) in &catalog {
        println!(
            "  {:<12} {}  {}",
            style(id).cyan(),
            entry.label,
            style(format!("[{}]", entry.category)).dim()
        );
    }
    println!();
    println!("{}", style("Launch one with `envvault tools open <id>`.").dim());

    Ok(())
}

pub async fn open(config: &AppConfig, id: &str) -> Result<()> {
    let catalog = tools::load_catalog(&config.tools_config);
    tools::launch(&catalog, id)?;

    println!("{} Launched {}.", style("✓").green().bold(), style(id).cyan());
    Ok(())
}
