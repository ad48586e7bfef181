//! winreg-backed [`EnvironmentStore`] over the machine-wide environment
//! key. Key handles are per-operation: each call opens its own `RegKey`
//! and the handle is released when it drops, on every exit path.

use std::collections::BTreeMap;

use tracing::debug;
use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_READ, KEY_SET_VALUE, REG_EXPAND_SZ, REG_SZ};
use winreg::types::FromRegValue;
use winreg::{RegKey, RegValue};

use crate::error::{EnvVaultError, Result};
use crate::store::{broadcast, path, EnvironmentStore};

/// The system environment key under HKLM.
pub const SYSTEM_ENV_KEY: &str = r"SYSTEM\CurrentControlSet\Control\Session Manager\Environment";

#[derive(Default)]
pub struct SystemEnvStore;

impl SystemEnvStore {
    pub fn new() -> Self {
        Self
    }

    fn open(&self, access: u32, operation: &str) -> Result<RegKey> {
        RegKey::predef(HKEY_LOCAL_MACHINE)
            .open_subkey_with_flags(SYSTEM_ENV_KEY, access)
            .map_err(|e| EnvVaultError::store(operation, e.to_string()))
    }
}

impl EnvironmentStore for SystemEnvStore {
    fn get_all(&self) -> Result<BTreeMap<String, String>> {
        let key = self.open(KEY_READ, "open")?;

        let mut vars = BTreeMap::new();
        for entry in key.enum_values() {
            let (name, value) =
                entry.map_err(|e| EnvVaultError::store("enumerate", e.to_string()))?;
            match String::from_reg_value(&value) {
                Ok(text) => {
                    vars.insert(name, text);
                }
                // Binary/dword values are not environment strings.
                Err(_) => debug!("skipping non-string value {name} ({:?})", value.vtype),
            }
        }

        debug!("read {} environment variables", vars.len());
        Ok(vars)
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(EnvVaultError::validation("name", "must not be empty"));
        }

        let key = self.open(KEY_SET_VALUE, "open for write")?;
        let vtype = if path::has_env_token(value) {
            REG_EXPAND_SZ
        } else {
            REG_SZ
        };
        let raw = RegValue {
            bytes: encode_utf16(value),
            vtype,
        };
        key.set_raw_value(name, &raw)
            .map_err(|e| EnvVaultError::store("write", e.to_string()))?;

        debug!("set {name}");
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(EnvVaultError::validation("name", "must not be empty"));
        }

        let key = self.open(KEY_SET_VALUE, "open for delete")?;
        key.delete_value(name)
            .map_err(|e| EnvVaultError::store("delete", e.to_string()))?;

        debug!("deleted {name}");
        Ok(())
    }

    fn notify_change(&self) -> Result<()> {
        broadcast::broadcast_environment_changed()
    }
}

fn encode_utf16(value: &str) -> Vec<u8> {
    value
        .encode_utf16()
        .chain(Some(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}
