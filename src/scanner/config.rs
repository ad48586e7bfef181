//! Externally supplied scan catalog: which tools to look for, where,
//! and what a healthy install of each looks like. Consumed read-only.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

/// Per-tool scan configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolScanConfig {
    /// Path patterns relative to each drive root. Literal, `*`/`?`
    /// wildcards, or recursive `**` patterns.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Candidate bin dirs relative to an install root. At least one
    /// must exist for a candidate to count as an installation.
    #[serde(default)]
    pub bin_paths: Vec<String>,

    /// Environment variables a healthy install is expected to set.
    #[serde(default)]
    pub env_vars: Vec<String>,

    /// Version probe, e.g. `java -version`, run from the first bin dir.
    #[serde(default)]
    pub version_cmd: Option<String>,

    /// Curated recommendation strings; preferred over generated ones
    /// when they mention the variable or path in question.
    #[serde(default)]
    pub recommendations: Vec<String>,

    /// Directory-name patterns to prune (demo/test/cache dirs and the
    /// like). Tool-specific, not global.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// The whole catalog, keyed by tool display name.
pub type ScanConfig = BTreeMap<String, ToolScanConfig>;

/// Load the catalog. A missing or corrupt file degrades to an empty
/// catalog with a warning — the scanner then simply finds nothing,
/// rather than failing startup.
pub fn load_scan_config(path: &Path) -> ScanConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("scan config {} not readable ({e}); scanning with an empty catalog", path.display());
            return ScanConfig::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("scan config {} is invalid ({e}); scanning with an empty catalog", path.display());
            ScanConfig::new()
        }
    }
}
