//! Snapshot backup/restore of the system environment key.
//!
//! [`catalog`] owns the on-disk naming protocol and listing; [`engine`]
//! orchestrates export/import through `reg.exe` and reports restore
//! progress over a status channel.

pub mod catalog;
pub mod engine;

pub use catalog::{BackupCatalog, Snapshot};
pub use engine::{
    BackupEngine, RegistryIo, RESTORE_FAILURE_MARKER, RESTORE_SUCCESS_MARKER,
};
