//! Operation history ledger.
//!
//! Every backup/restore/set/delete lands here with a timestamp and a
//! JSON details payload. Recording is best-effort by contract: a
//! history failure must never fail the operation it records, so call
//! sites go through [`record`].

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::warn;

use crate::config::AppConfig;
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub details: serde_json::Value,
}

pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    pub fn open() -> Result<Self> {
        let path = Self::db_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        Self::init(conn)
    }

    fn db_path() -> PathBuf {
        AppConfig::app_dir().join("history.db")
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                action TEXT NOT NULL,
                details TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn add_record(&self, action: &str, details: serde_json::Value) -> Result<()> {
        self.conn.execute(
            "INSERT INTO history (timestamp, action, details) VALUES (?1, ?2, ?3)",
            params![Utc::now().to_rfc3339(), action, details.to_string()],
        )?;
        Ok(())
    }

    /// Most recent records first.
    pub fn list(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, action, details FROM history ORDER BY id DESC LIMIT ?1",
        )?;

        let records = stmt
            .query_map(params![limit as i64], |row| {
                let timestamp_str: String = row.get(0)?;
                let action: String = row.get(1)?;
                let details_str: String = row.get(2)?;
                Ok((timestamp_str, action, details_str))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(timestamp_str, action, details_str)| HistoryRecord {
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc)),
                action,
                details: serde_json::from_str(&details_str)
                    .unwrap_or(serde_json::Value::Null),
            })
            .collect();

        Ok(records)
    }

    /// Records at or after `since`, oldest first.
    #[allow(dead_code)]
    pub fn records_since(&self, since: DateTime<Utc>) -> Result<Vec<HistoryRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, action, details FROM history
             WHERE timestamp >= ?1 ORDER BY id ASC",
        )?;

        let records = stmt
            .query_map(params![since.to_rfc3339()], |row| {
                let timestamp_str: String = row.get(0)?;
                let action: String = row.get(1)?;
                let details_str: String = row.get(2)?;
                Ok((timestamp_str, action, details_str))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(timestamp_str, action, details_str)| HistoryRecord {
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc)),
                action,
                details: serde_json::from_str(&details_str)
                    .unwrap_or(serde_json::Value::Null),
            })
            .collect();

        Ok(records)
    }
}

/// Record an operation, swallowing and logging any history failure.
pub fn record(action: &str, details: serde_json::Value) {
    let result = HistoryDb::open().and_then(|db| db.add_record(action, details));
    if let Err(e) = result {
        warn!("recording '{action}' in history failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_db() -> HistoryDb {
        HistoryDb::init(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_add_and_list() {
        let db = test_db();
        db.add_record("backup", json!({"file": "env_backup_20240115_143022_.reg"}))
            .unwrap();
        db.add_record("restore", json!({"ok": true})).unwrap();

        let records = db.list(10).unwrap();
        assert_eq!(records.len(), 2);
        // Newest first.
        assert_eq!(records[0].action, "restore");
        assert_eq!(records[1].action, "backup");
        assert_eq!(records[1].details["file"], "env_backup_20240115_143022_.reg");
    }

    #[test]
    fn test_list_respects_limit() {
        let db = test_db();
        for i in 0..5 {
            db.add_record("set", json!({ "i": i })).unwrap();
        }
        assert_eq!(db.list(3).unwrap().len(), 3);
    }

    #[test]
    fn test_records_since() {
        let db = test_db();
        db.add_record("old", json!({})).unwrap();

        let records = db.records_since(Utc::now() - chrono::Duration::hours(1)).unwrap();
        assert_eq!(records.len(), 1);

        let records = db.records_since(Utc::now() + chrono::Duration::hours(1)).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_malformed_details_degrade_to_null() {
        let db = test_db();
        db.conn
            .execute(
                "INSERT INTO history (timestamp, action, details) VALUES (?1, 'x', 'not json')",
                params![Utc::now().to_rfc3339()],
            )
            .unwrap();
        let records = db.list(1).unwrap();
        assert_eq!(records[0].details, serde_json::Value::Null);
    }
}
