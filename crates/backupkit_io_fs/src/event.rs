//! Per-item events emitted to progress / verbose collaborators.

use std::path::Path;

use crate::report::ReportCopy;
use crate::spec::SpecCopyError;

/// Receiver of run events.
///
/// Methods cannot fail: a collaborator that hits its own error (closed pipe,
/// terminal gone) must swallow it. Every method defaults to a no-op.
pub trait CopyObserver {
    /// Planning finished; `cnt_total` files are eligible.
    fn on_total_known(&mut self, _cnt_total: u64) {}

    /// A directory survived filtering and is being listed.
    fn on_dir_visited(&mut self, _path_rel: &Path) {}

    /// One file copied; `cnt_current` counts successful copies so far.
    fn on_item_copied(&mut self, _cnt_current: u64, _path_rel: &Path) {}

    /// One eligible file failed; the run continues.
    fn on_item_error(&mut self, _error: &SpecCopyError) {}

    /// A directory could not be listed or created. Not counted as an item.
    fn on_dir_error(&mut self, _error: &SpecCopyError) {}

    /// Non-fatal diagnostic, e.g. a malformed rules file.
    fn on_warning(&mut self, _message: &str) {}

    /// Run finished (completed or cancelled).
    fn on_run_complete(&mut self, _report: &ReportCopy) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObserverNoop;

impl CopyObserver for ObserverNoop {}
