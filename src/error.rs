use std::time::Duration;

use thiserror::Error;

/// Errors raised by envvault operations.
///
/// Low-level adapters (registry store, subprocess wrappers) return these
/// directly. Orchestrators catch at operation granularity and convert to
/// boolean/optional results plus log entries, so the CLI layer inspects
/// return values rather than matching on error variants.
#[derive(Error, Debug)]
pub enum EnvVaultError {
    /// Bad caller input (e.g. an empty variable name). Never retried.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Registry open/read/write/enumerate failure, typically privilege
    /// or corruption. Partial reads are discarded.
    #[error("Environment store access failed during {operation}: {message}")]
    StoreAccess { operation: String, message: String },

    /// An external command (reg.exe, a version probe) exited non-zero.
    #[error("{tool} failed{}: {stderr}", .exit_code.map(|c| format!(" (exit code {c})")).unwrap_or_default())]
    ExternalTool {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// An external command exceeded its deadline. Reported distinctly
    /// from a plain failure so restore can surface the timeout case.
    #[error("{tool} timed out after {elapsed:?}")]
    ExternalToolTimeout { tool: String, elapsed: Duration },

    /// One candidate path or pattern failed to resolve during a scan.
    /// Logged and skipped; never aborts the overall scan.
    #[error("Scan path error at {path}: {message}")]
    ScanPath { path: String, message: String },

    /// The WM_SETTINGCHANGE broadcast failed. Always best-effort:
    /// callers log this and keep their own verdict.
    #[error("Environment change broadcast failed: {0}")]
    Broadcast(String),

    /// The operation requires a Windows host (registry, broadcast,
    /// elevation).
    #[error("{0} is only available on Windows")]
    Unsupported(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("History database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Dialog error: {0}")]
    Dialog(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl EnvVaultError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreAccess {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn external(tool: impl Into<String>, exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn timeout(tool: impl Into<String>, elapsed: Duration) -> Self {
        Self::ExternalToolTimeout {
            tool: tool.into(),
            elapsed,
        }
    }

    pub fn scan_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScanPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from an external command deadline.
    #[allow(dead_code)]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ExternalToolTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, EnvVaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = EnvVaultError::validation("name", "must not be empty");
        assert_eq!(err.to_string(), "Invalid name: must not be empty");
    }

    #[test]
    fn test_external_tool_with_exit_code() {
        let err = EnvVaultError::external("reg import", Some(1), "Access is denied.");
        assert_eq!(
            err.to_string(),
            "reg import failed (exit code 1): Access is denied."
        );
    }

    #[test]
    fn test_external_tool_without_exit_code() {
        let err = EnvVaultError::external("reg export", None, "killed");
        assert_eq!(err.to_string(), "reg export failed: killed");
    }

    #[test]
    fn test_timeout_is_timeout() {
        let err = EnvVaultError::timeout("reg import", Duration::from_secs(10));
        assert!(err.is_timeout());
        assert!(err.to_string().contains("timed out"));

        let err = EnvVaultError::external("reg import", Some(1), "boom");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_store_access_display() {
        let err = EnvVaultError::store("enumerate", "access denied");
        assert_eq!(
            err.to_string(),
            "Environment store access failed during enumerate: access denied"
        );
    }
}
