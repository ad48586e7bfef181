//! In-memory [`EnvironmentStore`] test fake. Mirrors the registry's
//! case-insensitive name uniqueness and counts broadcasts so tests can
//! assert on them.
//!
//! [`EnvironmentStore`]: crate::store::EnvironmentStore

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{EnvVaultError, Result};
use crate::store::EnvironmentStore;

#[derive(Default)]
pub struct MemoryStore {
    vars: Mutex<BTreeMap<String, String>>,
    broadcast_count: AtomicUsize,
    fail_broadcast: bool,
    fail_reads: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        {
            let mut map = store.vars.lock().unwrap();
            for (k, v) in vars {
                map.insert(k.into(), v.into());
            }
        }
        store
    }

    /// Make `notify_change` fail, to exercise best-effort call sites.
    pub fn failing_broadcast(mut self) -> Self {
        self.fail_broadcast = true;
        self
    }

    /// Make `get_all` fail, to exercise store-error degradation.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Case-insensitive single-variable lookup.
    pub fn get(&self, name: &str) -> Option<String> {
        self.vars
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    pub fn broadcasts(&self) -> usize {
        self.broadcast_count.load(Ordering::SeqCst)
    }
}

impl EnvironmentStore for MemoryStore {
    fn get_all(&self) -> Result<BTreeMap<String, String>> {
        if self.fail_reads {
            return Err(EnvVaultError::store("enumerate", "simulated failure"));
        }
        Ok(self.vars.lock().unwrap().clone())
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(EnvVaultError::validation("name", "must not be empty"));
        }
        let mut vars = self.vars.lock().unwrap();
        // Overwrite under the existing casing when present.
        let key = vars
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
            .unwrap_or_else(|| name.to_owned());
        vars.insert(key, value.to_owned());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(EnvVaultError::validation("name", "must not be empty"));
        }
        let mut vars = self.vars.lock().unwrap();
        let key = vars.keys().find(|k| k.eq_ignore_ascii_case(name)).cloned();
        match key {
            Some(key) => {
                vars.remove(&key);
                Ok(())
            }
            None => Err(EnvVaultError::store(
                "delete",
                format!("no such variable: {name}"),
            )),
        }
    }

    fn notify_change(&self) -> Result<()> {
        if self.fail_broadcast {
            return Err(EnvVaultError::Broadcast("simulated failure".into()));
        }
        self.broadcast_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_case_insensitive() {
        let store = MemoryStore::new();
        store.set("Path", r"C:\a").unwrap();
        store.set("PATH", r"C:\b").unwrap();

        assert_eq!(store.get("path").as_deref(), Some(r"C:\b"));
        assert_eq!(store.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_set_rejects_empty_name() {
        let store = MemoryStore::new();
        let err = store.set("", "x").unwrap_err();
        assert!(matches!(err, EnvVaultError::Validation { .. }));
        let err = store.set("   ", "x").unwrap_err();
        assert!(matches!(err, EnvVaultError::Validation { .. }));
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::with_vars([("JAVA_HOME", r"C:\jdk")]);
        store.delete("java_home").unwrap();
        assert!(store.get("JAVA_HOME").is_none());

        let err = store.delete("JAVA_HOME").unwrap_err();
        assert!(matches!(err, EnvVaultError::StoreAccess { .. }));
    }

    #[test]
    fn test_broadcast_counting() {
        let store = MemoryStore::new();
        assert_eq!(store.broadcasts(), 0);
        store.notify_change().unwrap();
        store.notify_change().unwrap();
        assert_eq!(store.broadcasts(), 2);
    }
}
