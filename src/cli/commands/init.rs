use console::style;

use crate::config::AppConfig;
use crate::error::Result;

const DEFAULT_SCAN_CONFIG: &str = include_str!("../../../data/scan_config.json");
const DEFAULT_TOOLS_CONFIG: &str = include_str!("../../../data/tools_config.json");

/// Create the data directory, the default config, and the default
/// catalogs. Existing files are left untouched.
pub async fn execute() -> Result<()> {
    let config = AppConfig::load()?;

    std::fs::create_dir_all(AppConfig::app_dir())?;
    config.ensure_backup_dir()?;

    if !AppConfig::config_path().exists() {
        config.save()?;
        println!(
            "{} Wrote {}",
            style("✓").green().bold(),
            AppConfig::config_path().display()
        );
    }

    if !config.scan_config.exists() {
        std::fs::write(&config.scan_config, DEFAULT_SCAN_CONFIG)?;
        println!(
            "{} Wrote default scan catalog to {}",
            style("✓").green().bold(),
            config.scan_config.display()
        );
    }

    if !config.tools_config.exists() {
        std::fs::write(&config.tools_config, DEFAULT_TOOLS_CONFIG)?;
        println!(
            "{} Wrote default tools catalog to {}",
            style("✓").green().bold(),
            config.tools_config.display()
        );
    }

    println!(
        "{} envvault is ready. Try {} or {}.",
        style("✓").green().bold(),
        style("envvault backup create").cyan(),
        style("envvault scan").cyan()
    );

    Ok(())
}
