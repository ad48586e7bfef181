//! Analysis of one candidate directory: is it a real installation, what
//! version is it, and how does it relate to the live environment.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::scanner::config::ToolScanConfig;
use crate::scanner::version::{self, UNKNOWN_VERSION};
use crate::store::path::split_path;

/// Status of one configured environment variable for an installation.
#[derive(Debug, Clone, Serialize)]
pub struct EnvVarStatus {
    pub exists: bool,
    pub value: String,
    /// Whether any of the installation's bin dirs is a literal member
    /// of the current `Path` list.
    pub in_path: bool,
}

/// A discovered developer-tool instance. Transient: rebuilt on every
/// scan, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Installation {
    pub tool: String,
    pub install_path: PathBuf,
    pub bin_paths: Vec<PathBuf>,
    pub version: String,
    pub env_status: BTreeMap<String, EnvVarStatus>,
    pub recommendations: Vec<String>,
}

impl Installation {
    /// An installation is active when its binaries are reachable
    /// through the current `Path`.
    pub fn is_active(&self) -> bool {
        self.env_status.values().any(|s| s.in_path)
    }
}

/// Point-in-time capture of the process environment, taken once per
/// scan so every analysis sees the same state.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
    path_entries: Vec<String>,
}

impl EnvSnapshot {
    pub fn capture() -> Self {
        let vars: HashMap<String, String> = std::env::vars().collect();
        let path_entries = vars
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("Path"))
            .map(|(_, v)| split_path(v))
            .unwrap_or_default();
        Self { vars, path_entries }
    }

    #[allow(dead_code)]
    pub fn from_parts<I, K, V>(vars: I, path_entries: &[&str]) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            path_entries: path_entries.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Default message when an installation needs no changes.
pub const CONFIG_OK: &str = "Environment configuration looks good; no changes needed";

/// Analyze one candidate directory. `None` means "not an installation":
/// none of the configured bin dirs exist under it.
pub async fn analyze_installation(
    candidate: &Path,
    tool: &str,
    config: &ToolScanConfig,
    env: &EnvSnapshot,
) -> Option<Installation> {
    let bin_paths: Vec<PathBuf> = config
        .bin_paths
        .iter()
        .map(|rel| candidate.join(rel))
        .filter(|p| p.is_dir())
        .collect();

    if bin_paths.is_empty() {
        debug!("{tool}: no bin dirs under {}", candidate.display());
        return None;
    }

    let version = match &config.version_cmd {
        Some(cmd) => version::detect_version(tool, &bin_paths[0], cmd).await,
        None => UNKNOWN_VERSION.to_string(),
    };

    let env_status = check_env_vars(&config.env_vars, &bin_paths, env);
    let recommendations = build_recommendations(config, &env_status, &bin_paths, env);

    Some(Installation {
        tool: tool.to_owned(),
        install_path: candidate.to_path_buf(),
        bin_paths,
        version,
        env_status,
        recommendations,
    })
}

/// Per-variable status against the captured environment.
pub fn check_env_vars(
    env_vars: &[String],
    bin_paths: &[PathBuf],
    env: &EnvSnapshot,
) -> BTreeMap<String, EnvVarStatus> {
    let in_path = bin_paths.iter().any(|bp| {
        let bp = bp.to_string_lossy();
        env.path_entries.iter().any(|entry| entry == bp.as_ref())
    });

    env_vars
        .iter()
        .map(|var| {
            let value = env.get(var).unwrap_or_default().to_owned();
            (
                var.clone(),
                EnvVarStatus {
                    exists: env.get(var).is_some(),
                    value,
                    in_path,
                },
            )
        })
        .collect()
}

/// Actionable configuration advice for one installation.
///
/// Tool-declared recommendation strings win over generated defaults
/// whenever they mention the variable (or `PATH` and the bin dir) in
/// question; declared strings tied to neither are appended as-is.
/// The list is deduplicated preserving first-seen order, and an empty
/// result collapses to [`CONFIG_OK`].
pub fn build_recommendations(
    config: &ToolScanConfig,
    env_status: &BTreeMap<String, EnvVarStatus>,
    bin_paths: &[PathBuf],
    env: &EnvSnapshot,
) -> Vec<String> {
    let declared = &config.recommendations;
    let mut out: Vec<String> = Vec::new();
    let mut push = |rec: String| {
        if !out.contains(&rec) {
            out.push(rec);
        }
    };

    for (var, status) in env_status {
        if !status.exists || status.value.is_empty() {
            let rec = declared
                .iter()
                .find(|r| r.contains(var.as_str()))
                .cloned()
                .unwrap_or_else(|| format!("Set the {var} environment variable"));
            push(rec);
        }
    }

    for bin_path in bin_paths {
        let bp = bin_path.to_string_lossy();
        let reachable = env.path_entries.iter().any(|entry| entry.contains(bp.as_ref()));
        if !reachable {
            let rec = declared
                .iter()
                .find(|r| r.contains("PATH") && r.contains(bp.as_ref()))
                .cloned()
                .unwrap_or_else(|| format!("Add {bp} to the PATH environment variable"));
            push(rec);
        }
    }

    for rec in declared {
        let tied_to_var = env_status.keys().any(|var| rec.contains(var.as_str()));
        if !tied_to_var && !rec.contains("PATH") {
            push(rec.clone());
        }
    }

    if out.is_empty() {
        out.push(CONFIG_OK.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_config(recommendations: &[&str]) -> ToolScanConfig {
        ToolScanConfig {
            bin_paths: vec!["bin".into()],
            env_vars: vec!["JAVA_HOME".into()],
            recommendations: recommendations.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_candidate_without_bin_dirs_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        // The candidate dir itself exists, but has no bin/ under it.
        let config = tool_config(&[]);
        let env = EnvSnapshot::default();

        let result = analyze_installation(dir.path(), "Java", &config, &env).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_analyze_finds_bin_and_reports_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("bin")).unwrap();

        let config = tool_config(&[]);
        let bin = dir.path().join("bin").to_string_lossy().into_owned();
        let env = EnvSnapshot::from_parts(
            [("JAVA_HOME", dir.path().to_string_lossy().as_ref())],
            &[bin.as_str()],
        );

        let installation = analyze_installation(dir.path(), "Java", &config, &env)
            .await
            .unwrap();
        assert_eq!(installation.bin_paths.len(), 1);
        // No version_cmd configured.
        assert_eq!(installation.version, UNKNOWN_VERSION);

        let status = &installation.env_status["JAVA_HOME"];
        assert!(status.exists);
        assert!(status.in_path);
        assert!(installation.is_active());
        assert_eq!(installation.recommendations, vec![CONFIG_OK.to_string()]);
    }

    #[test]
    fn test_env_var_missing_prefers_declared_recommendation_once() {
        let config = tool_config(&["Set JAVA_HOME to your JDK path"]);
        let env = EnvSnapshot::from_parts(std::iter::empty::<(String, String)>(), &[]);

        let mut env_status = BTreeMap::new();
        env_status.insert(
            "JAVA_HOME".to_string(),
            EnvVarStatus {
                exists: false,
                value: String::new(),
                in_path: false,
            },
        );

        let recs = build_recommendations(&config, &env_status, &[], &env);
        assert_eq!(recs, vec!["Set JAVA_HOME to your JDK path".to_string()]);
    }

    #[test]
    fn test_missing_bin_path_generates_path_recommendation() {
        let config = tool_config(&[]);
        let env = EnvSnapshot::from_parts([("JAVA_HOME", r"C:\jdk")], &[r"C:\other"]);

        let env_status = check_env_vars(&config.env_vars, &[PathBuf::from(r"C:\jdk\bin")], &env);
        assert!(!env_status["JAVA_HOME"].in_path);

        let recs = build_recommendations(&config, &env_status, &[PathBuf::from(r"C:\jdk\bin")], &env);
        assert_eq!(
            recs,
            vec![r"Add C:\jdk\bin to the PATH environment variable".to_string()]
        );
    }

    #[test]
    fn test_untied_declared_recommendations_are_appended() {
        let config = ToolScanConfig {
            env_vars: vec!["GOPATH".into()],
            recommendations: vec![
                "Set GOPATH to your workspace".into(),
                "Enable module mode with GO111MODULE=on".into(),
            ],
            ..Default::default()
        };
        let env = EnvSnapshot::from_parts([("GOPATH", r"C:\go")], &[]);

        let env_status = check_env_vars(&config.env_vars, &[], &env);
        let recs = build_recommendations(&config, &env_status, &[], &env);
        // GOPATH is set, so only the untied advice remains.
        assert_eq!(recs, vec!["Enable module mode with GO111MODULE=on".to_string()]);
    }

    #[test]
    fn test_in_path_requires_literal_membership() {
        let env = EnvSnapshot::from_parts(
            std::iter::empty::<(String, String)>(),
            &[r"C:\jdk\bin\extra"],
        );
        let status = check_env_vars(
            &["JAVA_HOME".to_string()],
            &[PathBuf::from(r"C:\jdk\bin")],
            &env,
        );
        // A superset entry is not literal membership.
        assert!(!status["JAVA_HOME"].in_path);
    }

    #[test]
    fn test_env_lookup_is_case_insensitive() {
        let env = EnvSnapshot::from_parts([("java_home", r"C:\jdk")], &[]);
        let status = check_env_vars(&["JAVA_HOME".to_string()], &[], &env);
        assert!(status["JAVA_HOME"].exists);
        assert_eq!(status["JAVA_HOME"].value, r"C:\jdk");
    }
}
