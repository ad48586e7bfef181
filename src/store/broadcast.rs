//! The system-wide "environment changed" notification.
//!
//! Other processes re-read the environment key when they see a
//! `WM_SETTINGCHANGE` broadcast carrying the literal string
//! `Environment`. The broadcast is inherently best-effort:
//! [`notify_environment_changed`] is the fire-and-forget entry point
//! that cannot fail its caller, [`broadcast_environment_changed`] the
//! fallible one for call sites that want the error.

use tracing::warn;

use crate::error::Result;

/// The lParam payload mandated by the notification protocol.
pub const SETTING_NAME: &str = "Environment";

/// Broadcast, swallowing and logging any failure. By signature this can
/// never change the caller's verdict.
pub fn notify_environment_changed() {
    if let Err(e) = broadcast_environment_changed() {
        warn!("environment change broadcast failed: {e}");
    }
}

#[cfg(windows)]
pub fn broadcast_environment_changed() -> Result<()> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;

    use windows::Win32::Foundation::{LPARAM, WPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        SendMessageTimeoutW, HWND_BROADCAST, SMTO_ABORTIFHUNG, WM_SETTINGCHANGE,
    };

    use crate::error::EnvVaultError;

    let payload: Vec<u16> = OsStr::new(SETTING_NAME)
        .encode_wide()
        .chain(Some(0))
        .collect();
    let mut result = 0usize;

    let sent = unsafe {
        SendMessageTimeoutW(
            HWND_BROADCAST,
            WM_SETTINGCHANGE,
            WPARAM(0),
            LPARAM(payload.as_ptr() as isize),
            SMTO_ABORTIFHUNG,
            2000,
            Some(&mut result),
        )
    };

    if sent.0 == 0 {
        Err(EnvVaultError::Broadcast(
            "SendMessageTimeoutW returned 0".into(),
        ))
    } else {
        Ok(())
    }
}

#[cfg(not(windows))]
pub fn broadcast_environment_changed() -> Result<()> {
    Err(crate::error::EnvVaultError::Unsupported(
        "the environment change broadcast",
    ))
}
