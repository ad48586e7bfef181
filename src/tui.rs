//! Terminal rendering of worker progress.
//!
//! Workers never print; they push events over mpsc channels and the
//! command loop drains them here on its own schedule.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::backup::engine::{is_failure_status, is_success_status};
use crate::scanner::ScanProgress;

/// Print restore status messages as they arrive, until the sender side
/// closes. Terminal markers pick the glyph.
pub async fn print_restore_status(mut rx: UnboundedReceiver<String>) {
    while let Some(msg) = rx.recv().await {
        if is_failure_status(&msg) {
            println!("  {} {}", style("✕").red().bold(), style(&msg).red());
        } else if is_success_status(&msg) {
            println!("  {} {}", style("✓").green().bold(), msg);
        } else {
            println!("  {} {}", style("→").cyan().bold(), style(&msg).dim());
        }
    }
}

/// Spinner for the drive scan.
pub fn scan_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("spinner template parses"),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));
    spinner
}

/// Feed scan progress events into the spinner until the scan ends.
pub async fn follow_scan_progress(mut rx: UnboundedReceiver<ScanProgress>, spinner: ProgressBar) {
    while let Some(event) = rx.recv().await {
        spinner.set_message(format!("scanning {} on {}", event.tool, event.drive));
    }
    spinner.finish_and_clear();
}
