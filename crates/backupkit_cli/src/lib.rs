//! `backupkit_cli` v1:
//! The `backup-tree` command-line front end.
//!
//! - `cli`      : clap argument model
//! - `progress` : terminal observer (progress bar / verbose lines)
//! - `summary`  : end-of-run summary text

pub mod cli;
pub mod progress;
pub mod summary;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use backupkit_io_fs::{CopyObserver, copy_tree_with_observer};
use backupkit_log::{EnumLogLevel, init_logging};
use tracing::{debug, warn};

pub use cli::Cli;
pub use progress::ObserverTerminal;
pub use summary::summary_lines;

/// Exit code after an interrupt.
pub const CODE_EXIT_CANCELLED: u8 = 130;

/// Run one copy with parsed arguments.
///
/// Fatal setup failures come back as `Err`; the caller prints them and exits
/// with status 1. Per-item errors only show up in the summary.
pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    init_logging(if cli.debug {
        EnumLogLevel::Debug
    } else {
        EnumLogLevel::Error
    });
    debug!(?cli, "parsed arguments");

    let flag_cancel = Arc::new(AtomicBool::new(false));
    {
        let flag_cancel = Arc::clone(&flag_cancel);
        if let Err(e) = ctrlc::set_handler(move || flag_cancel.store(true, Ordering::SeqCst)) {
            warn!("interrupt handler not installed: {e}");
        }
    }

    let mut spec_cp_options = cli.to_copy_options();
    spec_cp_options.flag_cancel = Some(flag_cancel);

    let mut observer = ObserverTerminal::new(cli.verbose);
    let report = copy_tree_with_observer(
        &cli.source,
        &cli.destination,
        spec_cp_options,
        &mut observer as &mut dyn CopyObserver,
    )?;

    for line in summary_lines(&report) {
        println!("{line}");
    }

    if report.if_cancelled {
        Ok(ExitCode::from(CODE_EXIT_CANCELLED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
