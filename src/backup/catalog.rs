//! On-disk snapshot bookkeeping.
//!
//! Snapshot identity lives in the filename:
//! `env_backup_{YYYYMMDD}_{HHMMSS}_{description}.reg`. The pattern is
//! load-bearing for interoperability with existing snapshot files, so
//! both sides of it (building and parsing) stay in this module.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

/// Snapshot file extension, without the dot.
pub const SNAPSHOT_EXT: &str = "reg";

const NAME_PREFIX: &str = "env_backup";

/// One backup of the environment key. Immutable once created; the
/// catalog only indexes it.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub file_name: String,
    pub path: PathBuf,
    pub created_at: NaiveDateTime,
    pub description: String,
}

impl Snapshot {
    /// Embedded timestamp rendered as `YYYY-MM-DD HH:MM:SS`.
    pub fn time(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Build the filename for a snapshot taken at `stamp`.
pub fn snapshot_file_name(stamp: NaiveDateTime, description: &str) -> String {
    format!(
        "{}_{}_{}.{}",
        NAME_PREFIX,
        stamp.format("%Y%m%d_%H%M%S"),
        description,
        SNAPSHOT_EXT
    )
}

/// Parse a snapshot filename into its embedded timestamp and
/// description. Returns `None` for names that do not follow the
/// protocol: fewer than four underscore-delimited segments, or a
/// non-numeric date/time pair.
pub fn parse_snapshot_name(file_name: &str) -> Option<(NaiveDateTime, String)> {
    let stem = file_name.strip_suffix(&format!(".{SNAPSHOT_EXT}"))?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 4 {
        return None;
    }

    let created_at =
        NaiveDateTime::parse_from_str(&format!("{} {}", parts[2], parts[3]), "%Y%m%d %H%M%S")
            .ok()?;
    let description = if parts.len() > 4 {
        parts[4..].join("_")
    } else {
        String::new()
    };

    Some((created_at, description))
}

/// Indexes the backup directory. Pure filesystem reads; snapshots are
/// immutable and operator-driven, so no locking.
pub struct BackupCatalog {
    dir: PathBuf,
}

impl BackupCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All well-formed snapshots, newest first. Filenames that fail the
    /// protocol parse are skipped with a debug log, never an error. A
    /// missing/unreadable directory degrades to an empty list.
    pub fn list(&self) -> Vec<Snapshot> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("listing backups in {} failed: {e}", self.dir.display());
                return Vec::new();
            }
        };

        let mut snapshots: Vec<Snapshot> = entries
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let file_name = entry.file_name().to_string_lossy().into_owned();
                match parse_snapshot_name(&file_name) {
                    Some((created_at, description)) => Some(Snapshot {
                        path: entry.path(),
                        file_name,
                        created_at,
                        description,
                    }),
                    None => {
                        if file_name.ends_with(&format!(".{SNAPSHOT_EXT}")) {
                            debug!("skipping unrecognized snapshot name: {file_name}");
                        }
                        None
                    }
                }
            })
            .collect();

        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        snapshots
    }

    /// Remove a snapshot file. `Ok(false)` when it was already absent.
    pub fn delete(&self, path: &Path) -> crate::error::Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }

    /// Resolve a bare snapshot filename against the backup dir; absolute
    /// paths pass through untouched.
    pub fn resolve(&self, name: &str) -> PathBuf {
        let candidate = Path::new(name);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.dir.join(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn test_parse_well_formed_name() {
        let (stamp, desc) = parse_snapshot_name("env_backup_20240115_143022_manual.reg").unwrap();
        assert_eq!(stamp.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-15 14:30:22");
        assert_eq!(desc, "manual");
    }

    #[test]
    fn test_parse_unicode_description() {
        let (stamp, desc) = parse_snapshot_name("env_backup_20240115_143022_手动备份.reg").unwrap();
        assert_eq!(stamp.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-15 14:30:22");
        assert_eq!(desc, "手动备份");
    }

    #[test]
    fn test_parse_description_with_underscores() {
        let (_, desc) =
            parse_snapshot_name("env_backup_20240115_143022_before_jdk_upgrade.reg").unwrap();
        assert_eq!(desc, "before_jdk_upgrade");
    }

    #[test]
    fn test_parse_empty_description() {
        let (_, desc) = parse_snapshot_name("env_backup_20240115_143022_.reg").unwrap();
        assert_eq!(desc, "");
    }

    #[test]
    fn test_parse_rejects_short_names() {
        assert!(parse_snapshot_name("env_backup_20240115.reg").is_none());
        assert!(parse_snapshot_name("notes.reg").is_none());
        assert!(parse_snapshot_name("env_backup_garbage_here.reg").is_none());
    }

    #[test]
    fn test_parse_rejects_other_extensions() {
        assert!(parse_snapshot_name("env_backup_20240115_143022_x.txt").is_none());
    }

    #[test]
    fn test_name_roundtrip() {
        let stamp = NaiveDateTime::parse_from_str("2024-01-15 14:30:22", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let name = snapshot_file_name(stamp, "手动备份");
        assert_eq!(name, "env_backup_20240115_143022_手动备份.reg");

        let (parsed_stamp, parsed_desc) = parse_snapshot_name(&name).unwrap();
        assert_eq!(parsed_stamp, stamp);
        assert_eq!(parsed_desc, "手动备份");
    }

    #[test]
    fn test_list_sorts_newest_first_and_skips_malformed() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "env_backup_20240115_143022_old.reg");
        touch(dir.path(), "env_backup_20250301_090000_new.reg");
        touch(dir.path(), "env_backup_bogus.reg");
        touch(dir.path(), "unrelated.txt");

        let catalog = BackupCatalog::new(dir.path());
        let snapshots = catalog.list();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].description, "new");
        assert_eq!(snapshots[1].description, "old");
        assert_eq!(snapshots[1].time(), "2024-01-15 14:30:22");
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let catalog = BackupCatalog::new("/definitely/not/here");
        assert!(catalog.list().is_empty());
    }

    #[test]
    fn test_delete_absent_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = BackupCatalog::new(dir.path());

        let target = dir.path().join("env_backup_20240115_143022_x.reg");
        assert!(!catalog.delete(&target).unwrap());

        touch(dir.path(), "env_backup_20240115_143022_x.reg");
        assert!(catalog.delete(&target).unwrap());
        assert!(!target.exists());
    }

    #[test]
    fn test_resolve() {
        let catalog = BackupCatalog::new(r"C:\vault");
        assert_eq!(
            catalog.resolve("env_backup_20240115_143022_.reg"),
            Path::new(r"C:\vault").join("env_backup_20240115_143022_.reg")
        );
    }
}
