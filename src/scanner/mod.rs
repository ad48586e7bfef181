//! Full-drive scan for known developer-tool installations.
//!
//! For every configured tool, every existing drive root is searched by
//! path pattern; each surviving candidate is analyzed against the live
//! environment. One bad tool, drive, or pattern never aborts the scan —
//! whatever was found is still returned.

pub mod analyze;
pub mod config;
pub mod pattern;
pub mod version;

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

pub use analyze::{EnvSnapshot, EnvVarStatus, Installation};
pub use config::{load_scan_config, ScanConfig, ToolScanConfig};

/// Progress event: the scanner moved on to `tool` on `drive`.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub tool: String,
    pub drive: String,
}

/// Scan results keyed by tool name; tools with no findings are absent.
pub type ScanResults = BTreeMap<String, Vec<Installation>>;

/// Existing local drive roots, `A:\` through `Z:\`.
pub fn local_drives() -> Vec<PathBuf> {
    ('A'..='Z')
        .map(|letter| PathBuf::from(format!("{letter}:\\")))
        .filter(|root| root.exists())
        .collect()
}

/// Run a full scan. The environment is captured once up front so every
/// analysis sees the same state. Progress events are optional and
/// dropped receivers are ignored.
pub async fn scan(config: &ScanConfig, progress: Option<UnboundedSender<ScanProgress>>) -> ScanResults {
    scan_roots(config, &local_drives(), &EnvSnapshot::capture(), progress).await
}

/// [`scan`] over explicit roots, with an injected environment snapshot.
pub async fn scan_roots(
    config: &ScanConfig,
    roots: &[PathBuf],
    env: &EnvSnapshot,
    progress: Option<UnboundedSender<ScanProgress>>,
) -> ScanResults {
    let mut results = ScanResults::new();
    // Candidate paths visited anywhere in this run; a path analyzed for
    // one pattern is never re-analyzed for another.
    let mut visited: HashSet<PathBuf> = HashSet::new();

    for (tool, tool_config) in config {
        let mut installations = Vec::new();

        for root in roots {
            if let Some(tx) = &progress {
                let _ = tx.send(ScanProgress {
                    tool: tool.clone(),
                    drive: root.display().to_string(),
                });
            }

            for path_pattern in &tool_config.paths {
                let candidates = resolve_candidates(root, path_pattern).await;

                for candidate in candidates {
                    if !visited.insert(candidate.clone()) {
                        continue;
                    }
                    if pattern::is_excluded(&candidate, &tool_config.exclude_patterns) {
                        debug!("{tool}: skipping excluded dir {}", candidate.display());
                        continue;
                    }

                    if let Some(installation) =
                        analyze::analyze_installation(&candidate, tool, tool_config, env).await
                    {
                        info!(
                            "{tool}: found {} (version {})",
                            installation.install_path.display(),
                            installation.version
                        );
                        installations.push(installation);
                    }
                }
            }
        }

        if !installations.is_empty() {
            results.insert(tool.clone(), installations);
        }
    }

    results
}

/// Resolve one pattern off the async worker; a failed resolution is a
/// skipped pattern, not a failed scan.
async fn resolve_candidates(root: &std::path::Path, path_pattern: &str) -> Vec<PathBuf> {
    let root = root.to_path_buf();
    let owned_pattern = path_pattern.to_owned();

    match tokio::task::spawn_blocking(move || pattern::resolve_pattern(&root, &owned_pattern)).await
    {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(
                "{}",
                crate::error::EnvVaultError::scan_path(path_pattern, e.to_string())
            );
            Vec::new()
        }
    }
}
