use console::style;

use crate::config::AppConfig;
use crate::error::Result;

pub async fn show() -> Result<()> {
    let config = AppConfig::load()?;

    println!("{}", style("Configuration").bold().cyan());
    println!();
    println!("  backup_dir:   {}", config.backup_dir.display());
    println!("  scan_config:  {}", config.scan_config.display());
    println!("  tools_config: {}", config.tools_config.display());
    println!();
    println!(
        "{}",
        style(format!("File: {}", AppConfig::config_path().display())).dim()
    );

    Ok(())
}

pub async fn set(key: &str, value: &str) -> Result<()> {
    let mut config = AppConfig::load()?;
    config.set_key(key, value)?;
    config.save()?;

    println!(
        "{} Set {} = {}",
        style("✓").green().bold(),
        style(key).cyan(),
        value
    );

    Ok(())
}
