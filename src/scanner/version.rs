//! Version detection for discovered installations.
//!
//! Each tool maps to a typed parse rule through [`rule_for`]; adding a
//! tool means adding a table entry, not another branch in the probe
//! code. The probe itself is bounded — a wedged binary degrades to
//! [`UNKNOWN_VERSION`] instead of wedging the scan.

use std::path::Path;
use std::time::Duration;

use regex_lite::Regex;
use tracing::debug;

/// Fallback when a version cannot be determined.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Deadline for one version probe.
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Which stream the tool prints its version on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputSource {
    Stdout,
    /// `java -version` famously reports on stderr.
    Stderr,
    /// Stdout when non-empty, stderr otherwise.
    Either,
}

/// How to extract the version from the chosen stream.
#[derive(Debug, Clone)]
pub enum Extract {
    /// First capture group of a regex applied to the first line.
    Capture(&'static str),
    /// Trimmed first line with a literal prefix removed (`v14.17.0`).
    StripPrefix(&'static str),
    /// First `X.Y.Z` anywhere, else the first non-empty line.
    SemverOrFirstLine,
}

#[derive(Debug, Clone)]
pub struct ParseRule {
    pub source: OutputSource,
    pub extract: Extract,
}

/// Parse-rule table. Unlisted tools get the generic semver fallback.
pub fn rule_for(tool: &str) -> ParseRule {
    match tool {
        "Java" => ParseRule {
            source: OutputSource::Stderr,
            extract: Extract::Capture(r#"version "([^"]+)""#),
        },
        "Python" => ParseRule {
            source: OutputSource::Stdout,
            extract: Extract::Capture(r"Python (\d+\.\d+\.\d+)"),
        },
        "Node.js" => ParseRule {
            source: OutputSource::Stdout,
            extract: Extract::StripPrefix("v"),
        },
        "Git" => ParseRule {
            source: OutputSource::Stdout,
            extract: Extract::Capture(r"git version (\S+)"),
        },
        _ => ParseRule {
            source: OutputSource::Either,
            extract: Extract::SemverOrFirstLine,
        },
    }
}

/// Apply a tool's parse rule to captured probe output.
pub fn parse_version(tool: &str, stdout: &str, stderr: &str) -> String {
    let rule = rule_for(tool);

    let text = match rule.source {
        OutputSource::Stdout => stdout,
        OutputSource::Stderr => stderr,
        OutputSource::Either => {
            if stdout.trim().is_empty() {
                stderr
            } else {
                stdout
            }
        }
    };

    let extracted = match &rule.extract {
        Extract::Capture(pattern) => {
            let first_line = text.lines().next().unwrap_or_default();
            Regex::new(pattern)
                .ok()
                .and_then(|re| re.captures(first_line).map(|c| c[1].to_string()))
        }
        Extract::StripPrefix(prefix) => {
            let line = text.trim();
            if line.is_empty() {
                None
            } else {
                Some(line.strip_prefix(prefix).unwrap_or(line).to_string())
            }
        }
        Extract::SemverOrFirstLine => {
            let re = Regex::new(r"(\d+\.\d+\.\d+)").expect("semver pattern compiles");
            re.captures(text)
                .map(|c| c[1].to_string())
                .or_else(|| text.lines().map(str::trim).find(|l| !l.is_empty()).map(String::from))
        }
    };

    extracted.unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}

/// Run a tool's version command from `bin_dir` and parse the result.
/// Every failure path — missing binary, spawn error, non-zero exit
/// with no usable output, timeout — degrades to [`UNKNOWN_VERSION`].
pub async fn detect_version(tool: &str, bin_dir: &Path, version_cmd: &str) -> String {
    let mut parts = version_cmd.split_whitespace();
    let Some(program) = parts.next() else {
        return UNKNOWN_VERSION.to_string();
    };
    let args: Vec<&str> = parts.collect();

    // Prefer the binary inside the installation being analyzed; fall
    // back to PATH resolution for tools that only install a launcher
    // there (Docker does this).
    let candidate = bin_dir.join(program);
    let exe = if candidate.exists() || candidate.with_extension("exe").exists() {
        candidate
    } else {
        match which::which(program) {
            Ok(found) => found,
            Err(_) => {
                debug!("{tool}: version binary {program} not found");
                return UNKNOWN_VERSION.to_string();
            }
        }
    };

    let run = tokio::process::Command::new(&exe).args(&args).output();
    let output = match tokio::time::timeout(VERSION_TIMEOUT, run).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            debug!("{tool}: version probe failed to run: {e}");
            return UNKNOWN_VERSION.to_string();
        }
        Err(_) => {
            debug!("{tool}: version probe timed out after {VERSION_TIMEOUT:?}");
            return UNKNOWN_VERSION.to_string();
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    parse_version(tool, &stdout, &stderr)
}
