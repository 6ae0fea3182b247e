//! End-of-run console summary.

use backupkit_io_fs::ReportCopy;

/// Lines printed to stdout after a completed or cancelled run.
pub fn summary_lines(report: &ReportCopy) -> Vec<String> {
    let mut l_lines = Vec::new();
    if report.if_cancelled {
        l_lines.push("Operation cancelled by user.".to_string());
    }
    if report.cnt_eligible == 0 && !report.if_cancelled {
        l_lines.push("No files to copy.".to_string());
    } else {
        l_lines.push(format!(
            "Copy completed: {} files copied, {} skipped ({:.2}s)",
            report.cnt_copied,
            report.cnt_skipped,
            report.duration_elapsed.as_secs_f64()
        ));
    }
    if !report.is_clean() {
        l_lines.push(format!("Errors encountered: {}", report.errors.len()));
        l_lines.extend(report.errors.iter().map(|e| format!("  {e}")));
    }
    l_lines
}
