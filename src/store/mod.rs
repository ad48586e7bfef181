//! Adapters over the machine-wide environment variable store.
//!
//! `EnvironmentStore` is the injection seam: production code talks to the
//! registry-backed [`SystemEnvStore`] (Windows only), tests talk to the
//! in-memory [`MemoryStore`]. Pure `Path` handling lives in [`path`] so
//! the cleaning rules stay testable without a registry.

pub mod broadcast;
#[cfg(test)]
pub mod memory;
pub mod path;
#[cfg(windows)]
pub mod registry;

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::error::Result;

#[cfg(test)]
pub use memory::MemoryStore;
#[cfg(windows)]
pub use registry::SystemEnvStore;

/// The name of the `Path` variable. Lookups are case-insensitive since
/// the store enforces case-insensitive-unique names.
pub const PATH_VAR: &str = "Path";

/// Machine-wide environment variable store.
pub trait EnvironmentStore: Send + Sync {
    /// Enumerate every variable. All-or-nothing: a failure mid-way
    /// discards partial results and surfaces as `StoreAccess`.
    fn get_all(&self) -> Result<BTreeMap<String, String>>;

    /// Write/overwrite one variable. Rejects an empty name with
    /// `Validation` before touching the store. No broadcast.
    fn set(&self, name: &str, value: &str) -> Result<()>;

    /// Remove one variable.
    fn delete(&self, name: &str) -> Result<()>;

    /// Emit the system-wide "environment changed" notification.
    /// Implementations may fail; the free functions in this module
    /// wrap this with the swallow-and-log behavior.
    fn notify_change(&self) -> Result<()>;
}

/// Set a variable, then broadcast the change. Broadcast failures are
/// logged and swallowed: they never flip the caller's result.
pub fn set_and_broadcast(store: &dyn EnvironmentStore, name: &str, value: &str) -> Result<()> {
    store.set(name, value)?;
    if let Err(e) = store.notify_change() {
        warn!("environment change broadcast failed (write succeeded): {e}");
    }
    Ok(())
}

/// Rewrite `Path` with duplicates, empty segments and dead directories
/// removed, then broadcast. Best-effort maintenance: any store error
/// degrades to `false` with a log entry rather than propagating.
pub fn refresh_path(store: &dyn EnvironmentStore) -> bool {
    refresh_path_with(store, |p| std::path::Path::new(p).exists())
}

/// [`refresh_path`] with an injected directory-existence predicate.
pub fn refresh_path_with<F>(store: &dyn EnvironmentStore, exists: F) -> bool
where
    F: Fn(&str) -> bool,
{
    let vars = match store.get_all() {
        Ok(vars) => vars,
        Err(e) => {
            warn!("refresh_path: reading the store failed: {e}");
            return false;
        }
    };

    let current = vars
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(PATH_VAR))
        .map(|(_, value)| value.as_str())
        .unwrap_or_default();

    let cleaned = path::clean_path(current, exists);

    if let Err(e) = store.set(PATH_VAR, &cleaned) {
        warn!("refresh_path: writing Path back failed: {e}");
        return false;
    }

    if let Err(e) = store.notify_change() {
        warn!("refresh_path: broadcast failed (write succeeded): {e}");
    }

    info!(
        "refreshed Path: {} -> {} segments",
        path::split_path(current).len(),
        path::split_path(&cleaned).len()
    );
    true
}

/// Open the system store. Off Windows there is nothing to open.
#[cfg(windows)]
pub fn open_system_store() -> Result<Box<dyn EnvironmentStore>> {
    Ok(Box::new(SystemEnvStore::new()))
}

#[cfg(not(windows))]
pub fn open_system_store() -> Result<Box<dyn EnvironmentStore>> {
    Err(crate::error::EnvVaultError::Unsupported(
        "the system environment store",
    ))
}
