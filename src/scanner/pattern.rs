//! Wildcard path patterns for the installation scanner.
//!
//! Patterns are drive-relative and use `*`/`?` within a component;
//! `**` matches any number of intermediate directories and is handled
//! as a prefix resolution followed by a recursive walk.

use std::path::{Path, PathBuf};

use regex_lite::Regex;
use tracing::debug;
use walkdir::WalkDir;

/// Compile a wildcard into an anchored, case-insensitive regex.
/// With `cross_components` the `*` also crosses path separators, which
/// is what exclusion patterns like `*demo*` want.
pub fn wildcard_regex(pattern: &str, cross_components: bool) -> Regex {
    let any = if cross_components { ".*" } else { r"[^/\\]*" };
    let one = if cross_components { "." } else { r"[^/\\]" };

    let mut expr = String::from("(?i)^");
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(any),
            '?' => expr.push_str(one),
            c => expr.push_str(&regex_escape(c)),
        }
    }
    expr.push('$');

    // The escape above leaves no way to produce an invalid expression.
    Regex::new(&expr).expect("wildcard compiles")
}

fn regex_escape(c: char) -> String {
    if r".+()[]{}|^$\".contains(c) {
        format!("\\{c}")
    } else {
        c.to_string()
    }
}

/// Whether a single path component matches a wildcard.
pub fn matches_component(name: &str, pattern: &str) -> bool {
    wildcard_regex(pattern, false).is_match(name)
}

/// Whether a full path matches any of the exclusion wildcards.
pub fn is_excluded(path: &Path, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let text = path.to_string_lossy();
    patterns
        .iter()
        .any(|p| wildcard_regex(p, true).is_match(&text))
}

/// Resolve a drive-relative pattern to existing directories.
///
/// `**` splits the pattern into a prefix (resolved component-wise) and a
/// suffix matched against the tail of every directory found by walking
/// beneath each prefix hit.
pub fn resolve_pattern(base: &Path, pattern: &str) -> Vec<PathBuf> {
    let normalized = pattern.replace('\\', "/");
    let normalized = normalized.trim_matches('/');

    if let Some((prefix, suffix)) = normalized.split_once("**") {
        let prefix = prefix.trim_matches('/');
        let roots = if prefix.is_empty() {
            vec![base.to_path_buf()]
        } else {
            resolve_components(base, prefix)
        };
        let suffix: Vec<&str> = suffix
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let mut out = Vec::new();
        for root in roots {
            out.extend(walk_matching(&root, &suffix));
        }
        out
    } else {
        resolve_components(base, normalized)
    }
}

/// Component-wise resolution of a `**`-free pattern.
fn resolve_components(base: &Path, pattern: &str) -> Vec<PathBuf> {
    let mut current = vec![base.to_path_buf()];

    for component in pattern.split('/').filter(|c| !c.is_empty()) {
        let mut next = Vec::new();
        for dir in &current {
            if component.contains(['*', '?']) {
                let entries = match std::fs::read_dir(dir) {
                    Ok(entries) => entries,
                    Err(e) => {
                        debug!("read_dir {} failed: {e}", dir.display());
                        continue;
                    }
                };
                for entry in entries.flatten() {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if matches_component(&name, component) && entry.path().is_dir() {
                        next.push(entry.path());
                    }
                }
            } else {
                let candidate = dir.join(component);
                if candidate.is_dir() {
                    next.push(candidate);
                }
            }
        }
        current = next;
        if current.is_empty() {
            break;
        }
    }

    if pattern.is_empty() {
        Vec::new()
    } else {
        current
    }
}

/// Directories under `root` whose trailing components match `suffix`.
fn walk_matching(root: &Path, suffix: &[&str]) -> Vec<PathBuf> {
    if suffix.is_empty() {
        return vec![root.to_path_buf()];
    }

    WalkDir::new(root)
        .min_depth(suffix.len())
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| {
            let components: Vec<String> = entry
                .path()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if components.len() < suffix.len() {
                return false;
            }
            components[components.len() - suffix.len()..]
                .iter()
                .zip(suffix)
                .all(|(name, pat)| matches_component(name, pat))
        })
        .map(|entry| entry.into_path())
        .collect()
}
