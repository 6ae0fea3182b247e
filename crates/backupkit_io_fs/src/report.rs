//! Copy report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::spec::{EnumCopyErrorKind, SpecCopyError};

/// Aggregate counters and diagnostics for one `copy_tree` run.
#[derive(Debug, Default, Clone)]
pub struct ReportCopy {
    /// Number of files that survived filtering (planned copy tasks).
    pub cnt_eligible: u64,
    /// Number of files copied successfully.
    pub cnt_copied: u64,
    /// Number of files removed by the rules.
    pub cnt_skipped: u64,
    /// Number of directories pruned by the rules.
    pub cnt_dirs_pruned: u64,
    /// Number of destination directories ensured.
    pub cnt_dirs_created: u64,
    /// Run stopped early on the cancellation flag.
    pub if_cancelled: bool,
    /// Wall time of planning plus execution.
    pub duration_elapsed: Duration,
    /// Non-fatal diagnostics (rules files, unreadable entries).
    pub warnings: Vec<String>,
    /// Per-entry failures.
    pub errors: Vec<SpecCopyError>,
}

impl ReportCopy {
    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// `true` when no per-item error was recorded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_eligible".to_string(), self.cnt_eligible);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_dirs_pruned".to_string(), self.cnt_dirs_pruned);
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} eligible={} copied={} skipped={} pruned={} errors={} warnings={} elapsed={:.2}s",
            dict_counts["cnt_eligible"],
            dict_counts["cnt_copied"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_dirs_pruned"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"],
            self.duration_elapsed.as_secs_f64()
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator for copy statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportCopyBuilder {
    /// See [`ReportCopy::cnt_eligible`].
    pub cnt_eligible: u64,
    /// See [`ReportCopy::cnt_copied`].
    pub cnt_copied: u64,
    /// See [`ReportCopy::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportCopy::cnt_dirs_pruned`].
    pub cnt_dirs_pruned: u64,
    /// See [`ReportCopy::cnt_dirs_created`].
    pub cnt_dirs_created: u64,
    /// See [`ReportCopy::if_cancelled`].
    pub if_cancelled: bool,
    /// See [`ReportCopy::errors`].
    pub errors: Vec<SpecCopyError>,
    /// See [`ReportCopy::warnings`].
    pub warnings: Vec<String>,
}

impl ReportCopyBuilder {
    pub fn add_copied(&mut self) {
        self.cnt_copied += 1;
    }

    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    pub fn add_dir_pruned(&mut self) {
        self.cnt_dirs_pruned += 1;
    }

    pub fn add_dir_created(&mut self) {
        self.cnt_dirs_created += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, path: PathBuf, kind: EnumCopyErrorKind, exception: String) {
        self.errors.push(SpecCopyError {
            path,
            kind,
            exception,
        });
    }

    /// Finalize builder into immutable report.
    pub fn build(self, duration_elapsed: Duration) -> ReportCopy {
        ReportCopy {
            cnt_eligible: self.cnt_eligible,
            cnt_copied: self.cnt_copied,
            cnt_skipped: self.cnt_skipped,
            cnt_dirs_pruned: self.cnt_dirs_pruned,
            cnt_dirs_created: self.cnt_dirs_created,
            if_cancelled: self.if_cancelled,
            duration_elapsed,
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}
