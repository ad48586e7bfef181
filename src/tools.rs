//! Catalog of system administration panels and how to launch them.
//!
//! Each entry maps a short id to a launch target. Targets dispatch on
//! suffix: `.msc` snap-ins go through `mmc`, `.cpl` applets through
//! `control`, consoles get their own window, everything else spawns
//! directly. A user catalog file overrides the built-in list.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EnvVaultError, Result};

/// One launchable tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolEntry {
    /// Human-readable label shown in listings.
    pub label: String,
    /// Launch target: an executable name, `*.msc`, `*.cpl`, or a
    /// compound command like `rundll32 sysdm.cpl,EditEnvironmentVariables`.
    pub command: String,
    #[serde(default)]
    pub category: String,
}

pub type ToolsCatalog = BTreeMap<String, ToolEntry>;

/// Built-in catalog, used when no user catalog file exists.
pub fn builtin_catalog() -> ToolsCatalog {
    let entries = [
        ("regedit", "Registry Editor", "regedit", "system"),
        ("services", "Services", "services.msc", "system"),
        ("devices", "Device Manager", "devmgmt.msc", "hardware"),
        ("disks", "Disk Management", "diskmgmt.msc", "hardware"),
        ("events", "Event Viewer", "eventvwr.msc", "system"),
        ("tasks", "Task Manager", "taskmgr", "system"),
        ("sysinfo", "System Information", "msinfo32", "system"),
        ("sysprops", "System Properties", "sysdm.cpl", "config"),
        (
            "envdialog",
            "Environment Variables dialog",
            "rundll32 sysdm.cpl,EditEnvironmentVariables",
            "config",
        ),
        ("network", "Network Connections", "ncpa.cpl", "network"),
        ("firewall", "Windows Firewall", "firewall.cpl", "network"),
        ("power", "Power Options", "powercfg.cpl", "config"),
        ("cmd", "Command Prompt", "cmd", "console"),
        ("powershell", "PowerShell", "powershell", "console"),
    ];

    entries
        .into_iter()
        .map(|(id, label, command, category)| {
            (
                id.to_string(),
                ToolEntry {
                    label: label.to_string(),
                    command: command.to_string(),
                    category: category.to_string(),
                },
            )
        })
        .collect()
}

/// Load the catalog from a user file, falling back to the built-in
/// list when the file is missing or invalid.
pub fn load_catalog(path: &Path) -> ToolsCatalog {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("tools catalog {} is invalid ({e}); using the built-in catalog", path.display());
                builtin_catalog()
            }
        },
        Err(_) => builtin_catalog(),
    }
}

/// Launch a catalog entry by id. The child is detached; only spawn
/// failures are reported.
pub fn launch(catalog: &ToolsCatalog, id: &str) -> Result<()> {
    let entry = catalog.get(id).ok_or_else(|| {
        EnvVaultError::validation(
            "tool",
            format!("unknown tool '{id}'; see `envvault tools list`"),
        )
    })?;

    spawn_target(&entry.command)?;
    info!("launched {id} ({})", entry.command);
    Ok(())
}

#[cfg(windows)]
fn spawn_target(command: &str) -> Result<()> {
    use std::os::windows::process::CommandExt;
    use std::process::Command;

    const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;

    // Compound commands keep their arguments.
    let mut parts = command.split_whitespace();
    let program = parts.next().unwrap_or(command);
    let args: Vec<&str> = parts.collect();

    let spawned = if program.ends_with(".msc") {
        Command::new("mmc").arg(program).args(&args).spawn()
    } else if program.ends_with(".cpl") {
        Command::new("control").arg(program).args(&args).spawn()
    } else if matches!(program, "cmd" | "powershell" | "ipconfig" | "netsh") {
        Command::new(program)
            .args(&args)
            .creation_flags(CREATE_NEW_CONSOLE)
            .spawn()
    } else {
        Command::new(program).args(&args).spawn()
    };

    spawned
        .map(drop)
        .map_err(|e| EnvVaultError::external(command, None, e.to_string()))
}

#[cfg(not(windows))]
fn spawn_target(_command: &str) -> Result<()> {
    Err(EnvVaultError::Unsupported("launching system tools"))
}
