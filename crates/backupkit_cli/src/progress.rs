//! Progress bar and verbose line output.

use std::io::{self, Write};
use std::path::Path;

use backupkit_io_fs::{CopyObserver, ReportCopy, SpecCopyError};
use indicatif::{ProgressBar, ProgressStyle};

const C_TEMPLATE_BAR: &str = "{msg} [{bar:40.cyan/blue}] {pos}/{len} files ({elapsed_precise})";

/// Event consumer driving the terminal.
///
/// Non-verbose runs show a progress bar; verbose runs hide it and print one
/// line per item instead. Output failures are ignored.
pub struct ObserverTerminal<W: Write> {
    if_verbose: bool,
    bar: ProgressBar,
    out: W,
    cnt_total: Option<u64>,
}

impl ObserverTerminal<io::Stdout> {
    pub fn new(if_verbose: bool) -> Self {
        let bar = if if_verbose {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::with_template(C_TEMPLATE_BAR)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ");
            bar.set_style(style);
            bar.set_message("Copying files");
            bar
        };
        Self::with_parts(if_verbose, bar, io::stdout())
    }
}

impl<W: Write> ObserverTerminal<W> {
    pub fn with_parts(if_verbose: bool, bar: ProgressBar, out: W) -> Self {
        Self {
            if_verbose,
            bar,
            out,
            cnt_total: None,
        }
    }

    /// Consume the observer and hand back the writer.
    pub fn into_writer(self) -> W {
        self.out
    }
}

impl<W: Write> CopyObserver for ObserverTerminal<W> {
    fn on_total_known(&mut self, cnt_total: u64) {
        self.cnt_total = Some(cnt_total);
        self.bar.set_length(cnt_total);
    }

    fn on_item_copied(&mut self, cnt_current: u64, path_rel: &Path) {
        self.bar.inc(1);
        if self.if_verbose {
            let _ = writeln!(
                self.out,
                "[{}/{}] Copied: {}",
                cnt_current,
                self.cnt_total.unwrap_or_default(),
                path_rel.display()
            );
        }
    }

    fn on_item_error(&mut self, error: &SpecCopyError) {
        self.bar.inc(1);
        if self.if_verbose {
            let _ = writeln!(self.out, "Warning: {error}");
        }
    }

    fn on_dir_error(&mut self, error: &SpecCopyError) {
        if self.if_verbose {
            let _ = writeln!(self.out, "Warning: {error}");
        }
    }

    fn on_warning(&mut self, message: &str) {
        if self.if_verbose {
            let _ = writeln!(self.out, "Warning: {message}");
        }
    }

    fn on_run_complete(&mut self, _report: &ReportCopy) {
        self.bar.finish_and_clear();
        let _ = self.out.flush();
    }
}
