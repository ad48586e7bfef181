//! Elevation handling: mutating the machine-wide environment key needs
//! administrator rights, so non-elevated invocations relaunch
//! themselves through the `runas` verb.

use tracing::info;

use crate::error::Result;

/// Whether the current process holds administrator rights.
#[cfg(windows)]
pub fn is_elevated() -> bool {
    use windows::Win32::UI::Shell::IsUserAnAdmin;
    unsafe { IsUserAnAdmin().as_bool() }
}

#[cfg(not(windows))]
pub fn is_elevated() -> bool {
    false
}

/// Relaunch the current executable elevated, forwarding the original
/// arguments. The elevated child is a fresh process; the caller is
/// expected to exit once this returns `Ok`.
#[cfg(windows)]
pub fn relaunch_elevated() -> Result<()> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;

    use windows::core::PCWSTR;
    use windows::Win32::UI::Shell::ShellExecuteW;
    use windows::Win32::UI::WindowsAndMessaging::SW_SHOW;

    use crate::error::EnvVaultError;

    fn to_wide(s: &str) -> Vec<u16> {
        OsStr::new(s).encode_wide().chain(Some(0)).collect()
    }

    fn quote_arg(arg: &str) -> String {
        if arg.contains(' ') || arg.contains('"') {
            format!("\"{}\"", arg.replace('"', "\\\""))
        } else {
            arg.to_string()
        }
    }

    let exe = std::env::current_exe()?;
    let exe_str = exe.to_string_lossy().to_string();
    let args = std::env::args()
        .skip(1)
        .map(|a| quote_arg(&a))
        .collect::<Vec<_>>()
        .join(" ");

    let verb = to_wide("runas");
    let exe_w = to_wide(&exe_str);
    let args_w = to_wide(&args);

    let result = unsafe {
        ShellExecuteW(
            None,
            PCWSTR(verb.as_ptr()),
            PCWSTR(exe_w.as_ptr()),
            if args.is_empty() {
                PCWSTR::null()
            } else {
                PCWSTR(args_w.as_ptr())
            },
            PCWSTR::null(),
            SW_SHOW,
        )
    };

    // Per ShellExecute's contract, values <= 32 are error codes.
    if result.0 as isize <= 32 {
        Err(EnvVaultError::Other(anyhow::anyhow!(
            "ShellExecuteW failed with code {}",
            result.0 as isize
        )))
    } else {
        info!("relaunched elevated: {exe_str}");
        Ok(())
    }
}

#[cfg(not(windows))]
pub fn relaunch_elevated() -> Result<()> {
    Err(crate::error::EnvVaultError::Unsupported("elevation"))
}

/// Ensure the process is elevated. Returns `true` when already elevated;
/// otherwise spawns the elevated copy and returns `false`, telling the
/// caller to exit and let the child take over.
pub fn ensure_elevated() -> Result<bool> {
    if is_elevated() {
        return Ok(true);
    }
    info!("not elevated; requesting administrator rights");
    relaunch_elevated()?;
    Ok(false)
}
