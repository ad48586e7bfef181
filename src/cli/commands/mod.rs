pub mod backup;
pub mod config;
pub mod env;
pub mod history;
pub mod init;
pub mod scan;
pub mod tools;

use console::style;

use crate::error::Result;
use crate::privilege;

/// Gate for commands that write machine-wide state. Returns `true` when
/// the command should proceed in this process; `false` when an elevated
/// copy has been spawned and this one should exit quietly.
pub fn proceed_with_elevation(no_elevate: bool) -> Result<bool> {
    if no_elevate || privilege::is_elevated() {
        return Ok(true);
    }

    println!(
        "{} Administrator rights required; relaunching elevated...",
        style("→").yellow().bold()
    );

    match privilege::ensure_elevated() {
        Ok(true) => Ok(true),
        Ok(false) => Ok(false),
        Err(e) => {
            println!(
                "{} Could not elevate ({e}); continuing without administrator rights.",
                style("!").yellow().bold()
            );
            Ok(true)
        }
    }
}
