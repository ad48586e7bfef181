//! Snapshot creation and restore.
//!
//! Export and import are delegated to the privileged `reg.exe` through
//! the [`RegistryIo`] seam, so tests can stub the external tool. Restore
//! reports progress as status strings over an mpsc channel; the terminal
//! message always contains one of the two marker substrings below, which
//! callers substring-match to detect completion — the message text is
//! the status protocol.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, Timelike};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::backup::catalog::{self, Snapshot};
use crate::error::{EnvVaultError, Result};
use crate::store::broadcast;

/// Terminal status marker for a successful restore.
pub const RESTORE_SUCCESS_MARKER: &str = "restore complete";

/// Terminal status marker for a failed restore.
pub const RESTORE_FAILURE_MARKER: &str = "restore failed";

/// First line of a registry export file.
pub const REG_FILE_HEADER: &str = "Windows Registry Editor Version";

/// Import deadline. Fixed protocol constant, matching the historical
/// behavior snapshot consumers rely on.
pub const IMPORT_TIMEOUT: Duration = Duration::from_secs(10);

/// Export deadline. The export path was historically unbounded; see
/// DESIGN.md for the decision to bound it.
pub const EXPORT_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_KEY_PATH: &str =
    r"HKLM\SYSTEM\CurrentControlSet\Control\Session Manager\Environment";

/// External registry export/import tool.
#[async_trait]
pub trait RegistryIo: Send + Sync {
    async fn export_key(&self, key: &str, dest: &Path) -> Result<()>;
    async fn import_file(&self, file: &Path) -> Result<()>;
}

/// Production implementation shelling out to `reg.exe`.
pub struct RegExe;

#[async_trait]
impl RegistryIo for RegExe {
    async fn export_key(&self, key: &str, dest: &Path) -> Result<()> {
        run_reg("reg export", &["export", key, &dest.to_string_lossy(), "/y"]).await
    }

    async fn import_file(&self, file: &Path) -> Result<()> {
        run_reg("reg import", &["import", &file.to_string_lossy()]).await
    }
}

async fn run_reg(label: &str, args: &[&str]) -> Result<()> {
    let output = tokio::process::Command::new("reg")
        .args(args)
        .output()
        .await
        .map_err(|e| EnvVaultError::external(label, None, e.to_string()))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(EnvVaultError::external(
            label,
            output.status.code(),
            if stderr.is_empty() { "unknown error".into() } else { stderr },
        ))
    }
}

/// Orchestrates snapshot creation and restore against the backup dir.
pub struct BackupEngine {
    backup_dir: PathBuf,
    reg: Box<dyn RegistryIo>,
    // At most one restore at a time, regardless of what the front end
    // does with its buttons.
    restore_lock: Mutex<()>,
}

impl BackupEngine {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self::with_registry_io(backup_dir, Box::new(RegExe))
    }

    pub fn with_registry_io(backup_dir: impl Into<PathBuf>, reg: Box<dyn RegistryIo>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            reg,
            restore_lock: Mutex::new(()),
        }
    }

    /// Export the environment key into a new timestamped snapshot.
    /// Any failure logs and returns `None`; a failed export never
    /// leaves a catalog entry behind.
    pub async fn create_backup(&self, description: &str) -> Option<Snapshot> {
        // Truncate to whole seconds: the filename is the identity, and
        // it only carries second precision.
        let now = Local::now().naive_local();
        let stamp = now.with_nanosecond(0).unwrap_or(now);
        let file_name = catalog::snapshot_file_name(stamp, description);
        let dest = self.backup_dir.join(&file_name);

        if let Err(e) = std::fs::create_dir_all(&self.backup_dir) {
            error!("creating backup dir {} failed: {e}", self.backup_dir.display());
            return None;
        }

        let export = tokio::time::timeout(EXPORT_TIMEOUT, self.reg.export_key(ENV_KEY_PATH, &dest));
        match export.await {
            Ok(Ok(())) => {
                info!("exported environment key to {}", dest.display());
                Some(Snapshot {
                    file_name,
                    path: dest,
                    created_at: stamp,
                    description: description.to_owned(),
                })
            }
            Ok(Err(e)) => {
                error!("backup export failed: {e}");
                let _ = std::fs::remove_file(&dest);
                None
            }
            Err(_) => {
                error!("{}", EnvVaultError::timeout("reg export", EXPORT_TIMEOUT));
                let _ = std::fs::remove_file(&dest);
                None
            }
        }
    }

    /// Import a snapshot, then best-effort broadcast the change.
    ///
    /// Emits at least two status messages; the terminal one contains
    /// [`RESTORE_SUCCESS_MARKER`] or [`RESTORE_FAILURE_MARKER`].
    /// Import is bounded by [`IMPORT_TIMEOUT`]; a timeout reports as a
    /// distinct failure message. The broadcast cannot change the
    /// verdict.
    pub async fn restore_backup(&self, path: &Path, status: &UnboundedSender<String>) -> bool {
        let send = |msg: String| {
            debug!("restore status: {msg}");
            // A dropped receiver must not fail the restore itself.
            let _ = status.send(msg);
        };

        let Ok(_guard) = self.restore_lock.try_lock() else {
            send(format!("{RESTORE_FAILURE_MARKER}: another restore is already running"));
            return false;
        };

        send(format!("Validating snapshot {}...", path.display()));
        if !validate_snapshot(path) {
            send(format!(
                "{RESTORE_FAILURE_MARKER}: {} is not a readable registry export",
                path.display()
            ));
            return false;
        }

        send("Importing registry snapshot...".to_string());
        let import = tokio::time::timeout(IMPORT_TIMEOUT, self.reg.import_file(path));
        match import.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("registry import failed: {e}");
                send(format!("{RESTORE_FAILURE_MARKER}: registry import failed: {e}"));
                return false;
            }
            Err(_) => {
                let e = EnvVaultError::timeout("reg import", IMPORT_TIMEOUT);
                error!("{e}");
                send(format!("{RESTORE_FAILURE_MARKER}: {e}"));
                return false;
            }
        }

        // The import decides the verdict; the broadcast is advisory.
        broadcast::notify_environment_changed();

        send(format!(
            "{RESTORE_SUCCESS_MARKER}; open a new terminal to pick up the restored variables, \
             or run a scan if something still looks off"
        ));
        true
    }
}

/// Whether a restore status message is the successful terminal one.
pub fn is_success_status(msg: &str) -> bool {
    msg.contains(RESTORE_SUCCESS_MARKER)
}

/// Whether a restore status message is the failing terminal one.
pub fn is_failure_status(msg: &str) -> bool {
    msg.contains(RESTORE_FAILURE_MARKER)
}

/// Pre-flight snapshot validation: non-empty, and the first line is a
/// registry export header. Export files are UTF-16; both BOM'd UTF-16
/// and plain UTF-8 are accepted.
pub fn validate_snapshot(path: &Path) -> bool {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("reading snapshot {} failed: {e}", path.display());
            return false;
        }
    };

    if bytes.is_empty() {
        warn!("snapshot {} is empty", path.display());
        return false;
    }

    let text = decode_export_text(&bytes);
    let first_line = text.lines().next().unwrap_or_default().trim_start_matches('\u{feff}');
    if first_line.trim().starts_with(REG_FILE_HEADER) {
        true
    } else {
        warn!("snapshot {} has no registry export header", path.display());
        false
    }
}

fn decode_export_text(bytes: &[u8]) -> String {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn decode_utf16(bytes: &[u8], combine: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| combine([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::sync::mpsc::unbounded_channel;
    use tokio::sync::Notify;

    /// Stubbed registry tool with scriptable import behavior.
    struct StubReg {
        import_ok: bool,
        hang_on: Option<Arc<Notify>>,
        entered: Option<Arc<Notify>>,
        imports: AtomicUsize,
    }

    impl StubReg {
        fn succeeding() -> Self {
            Self {
                import_ok: true,
                hang_on: None,
                entered: None,
                imports: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                import_ok: false,
                ..Self::succeeding()
            }
        }
    }

    #[async_trait]
    impl RegistryIo for StubReg {
        async fn export_key(&self, _key: &str, dest: &Path) -> Result<()> {
            std::fs::write(dest, utf16_export(&["\"Path\"=\"C:\\\\a\""])).unwrap();
            Ok(())
        }

        async fn import_file(&self, _file: &Path) -> Result<()> {
            self.imports.fetch_add(1, Ordering::SeqCst);
            if let Some(entered) = &self.entered {
                entered.notify_one();
            }
            if let Some(gate) = &self.hang_on {
                gate.notified().await;
            }
            if self.import_ok {
                Ok(())
            } else {
                Err(EnvVaultError::external("reg import", Some(1), "Access is denied."))
            }
        }
    }

    fn utf16_export(lines: &[&str]) -> Vec<u8> {
        let mut text = format!("{REG_FILE_HEADER} 5.00\r\n\r\n");
        for line in lines {
            text.push_str(line);
            text.push_str("\r\n");
        }
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        bytes
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn test_create_backup_names_follow_protocol() {
        let dir = tempfile::tempdir().unwrap();
        let engine = BackupEngine::with_registry_io(dir.path(), Box::new(StubReg::succeeding()));

        let snapshot = engine.create_backup("before upgrade").await.unwrap();
        assert!(snapshot.path.exists());
        let (stamp, desc) = catalog::parse_snapshot_name(&snapshot.file_name).unwrap();
        assert_eq!(stamp, snapshot.created_at);
        assert_eq!(desc, "before upgrade");
    }

    #[tokio::test]
    async fn test_restore_missing_file_reports_failure_marker() {
        let dir = tempfile::tempdir().unwrap();
        let engine = BackupEngine::with_registry_io(dir.path(), Box::new(StubReg::succeeding()));
        let (tx, mut rx) = unbounded_channel();

        let ok = engine
            .restore_backup(&dir.path().join("missing.reg"), &tx)
            .await;
        assert!(!ok);

        let messages = drain(&mut rx);
        assert!(messages.iter().any(|m| is_failure_status(m)));
        assert!(!messages.iter().any(|m| is_success_status(m)));
    }

    #[tokio::test]
    async fn test_restore_success_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("env_backup_20240115_143022_手动备份.reg");
        std::fs::write(&file, utf16_export(&[])).unwrap();

        let engine = BackupEngine::with_registry_io(dir.path(), Box::new(StubReg::succeeding()));
        let (tx, mut rx) = unbounded_channel();

        assert!(engine.restore_backup(&file, &tx).await);

        let messages = drain(&mut rx);
        assert!(messages.len() >= 2);
        assert!(is_success_status(messages.last().unwrap()));
    }

    #[tokio::test]
    async fn test_restore_import_failure() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("env_backup_20240115_143022_.reg");
        std::fs::write(&file, utf16_export(&[])).unwrap();

        let engine = BackupEngine::with_registry_io(dir.path(), Box::new(StubReg::failing()));
        let (tx, mut rx) = unbounded_channel();

        assert!(!engine.restore_backup(&file, &tx).await);
        let messages = drain(&mut rx);
        assert!(is_failure_status(messages.last().unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_import_timeout_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("env_backup_20240115_143022_.reg");
        std::fs::write(&file, utf16_export(&[])).unwrap();

        let gate = Arc::new(Notify::new());
        let stub = StubReg {
            hang_on: Some(gate),
            ..StubReg::succeeding()
        };
        let engine = BackupEngine::with_registry_io(dir.path(), Box::new(stub));
        let (tx, mut rx) = unbounded_channel();

        // Paused time auto-advances past IMPORT_TIMEOUT while the stub
        // blocks forever.
        assert!(!engine.restore_backup(&file, &tx).await);
        let messages = drain(&mut rx);
        let last = messages.last().unwrap();
        assert!(is_failure_status(last));
        assert!(last.contains("timed out"));
    }

    #[tokio::test]
    async fn test_second_concurrent_restore_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("env_backup_20240115_143022_.reg");
        std::fs::write(&file, utf16_export(&[])).unwrap();

        let gate = Arc::new(Notify::new());
        let entered = Arc::new(Notify::new());
        let stub = StubReg {
            hang_on: Some(gate.clone()),
            entered: Some(entered.clone()),
            ..StubReg::succeeding()
        };
        let engine = Arc::new(BackupEngine::with_registry_io(dir.path(), Box::new(stub)));

        let (tx1, _rx1) = unbounded_channel();
        let first = {
            let engine = engine.clone();
            let file = file.clone();
            tokio::spawn(async move { engine.restore_backup(&file, &tx1).await })
        };

        // Wait until the first restore holds the lock inside import.
        entered.notified().await;

        let (tx2, mut rx2) = unbounded_channel();
        assert!(!engine.restore_backup(&file, &tx2).await);
        let messages = drain(&mut rx2);
        assert!(messages.iter().any(|m| m.contains("already running")));

        gate.notify_one();
        assert!(first.await.unwrap());
    }

    #[test]
    fn test_validate_snapshot_rejects_empty_and_headerless() {
        let dir = tempfile::tempdir().unwrap();

        let empty = dir.path().join("empty.reg");
        std::fs::write(&empty, b"").unwrap();
        assert!(!validate_snapshot(&empty));

        let headerless = dir.path().join("headerless.reg");
        std::fs::write(&headerless, b"[HKEY_LOCAL_MACHINE\\SYSTEM]").unwrap();
        assert!(!validate_snapshot(&headerless));

        let good = dir.path().join("good.reg");
        std::fs::write(&good, utf16_export(&[])).unwrap();
        assert!(validate_snapshot(&good));
    }

    #[test]
    fn test_validate_snapshot_accepts_utf8_export() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("utf8.reg");
        std::fs::write(&file, format!("{REG_FILE_HEADER} 5.00\r\n")).unwrap();
        assert!(validate_snapshot(&file));
    }
}
