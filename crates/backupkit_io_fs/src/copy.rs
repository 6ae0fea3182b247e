//! Copy orchestration: validation, planning, task execution and reporting.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::event::{CopyObserver, ObserverNoop};
use crate::filter::FilterManager;
use crate::plan::{EnumCopyTask, plan_tree};
use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::spec::{CopyTreeError, EnumCopyErrorKind, SpecCopyOptions};
use crate::util::{classify_io_error, copy_file_with_metadata};

/// Copy a directory tree from `dir_source` to `dir_destination`.
///
/// Same as [`copy_tree_with_observer`] without event consumers.
pub fn copy_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_cp_options: SpecCopyOptions,
) -> Result<ReportCopy, CopyTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    copy_tree_with_observer(
        dir_source,
        dir_destination,
        spec_cp_options,
        &mut ObserverNoop,
    )
}

/// Copy a directory tree, honoring per-directory rules files.
///
/// This function performs:
/// 1. Source validation and destination root creation.
/// 2. One preorder walk planning every eligible directory and file.
/// 3. Serial execution of the planned tasks, isolating per-item failures.
/// 4. Report aggregation.
///
/// Returns [`ReportCopy`] when the run completes, even with per-item errors
/// stored in the report. Returns [`CopyTreeError`] only when nothing could be
/// started: the source root is missing, not a directory or unreadable, or the
/// destination root cannot be created.
pub fn copy_tree_with_observer<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_cp_options: SpecCopyOptions,
    observer: &mut dyn CopyObserver,
) -> Result<ReportCopy, CopyTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let t_start = Instant::now();
    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    match fs::metadata(&path_dir_src) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(CopyTreeError::SourceNotDirectory(path_dir_src)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CopyTreeError::SourceNotFound(path_dir_src));
        }
        Err(e) => {
            return Err(CopyTreeError::SourceUnreadable {
                path: path_dir_src,
                source: e,
            });
        }
    }
    if let Err(e) = fs::read_dir(&path_dir_src) {
        return Err(CopyTreeError::SourceUnreadable {
            path: path_dir_src,
            source: e,
        });
    }
    fs::create_dir_all(&path_dir_dst).map_err(|e| CopyTreeError::DestinationInitFailed {
        path: path_dir_dst.clone(),
        source: e,
    })?;

    info!(
        source = %path_dir_src.display(),
        destination = %path_dir_dst.display(),
        if_ignore_rules = spec_cp_options.if_ignore_rules,
        "copy started"
    );

    let mut builder_cp_report = ReportCopyBuilder::default();
    let mut filter_manager = FilterManager::new(&path_dir_src, &spec_cp_options);
    if let (Ok(path_src_abs), Ok(path_dst_abs)) =
        (fs::canonicalize(&path_dir_src), fs::canonicalize(&path_dir_dst))
    {
        if let Ok(path_rel_dst) = path_dst_abs.strip_prefix(&path_src_abs) {
            debug!(destination = %path_rel_dst.display(), "destination nested in source, excluded");
            filter_manager.exclude_destination(path_rel_dst);
        }
    }
    let spec_cp_plan = plan_tree(
        &mut filter_manager,
        &spec_cp_options,
        &mut builder_cp_report,
        observer,
    );
    builder_cp_report.cnt_eligible = spec_cp_plan.cnt_eligible;
    observer.on_total_known(spec_cp_plan.cnt_eligible);

    execute_plan(
        &spec_cp_plan.l_tasks,
        &path_dir_src,
        &path_dir_dst,
        &spec_cp_options,
        &mut builder_cp_report,
        observer,
    );

    let report = builder_cp_report.build(t_start.elapsed());
    info!("{report}");
    observer.on_run_complete(&report);
    Ok(report)
}

/// Execute planned tasks in order.
///
/// A failing task is recorded in `builder_cp_report`, reported through
/// `observer.on_item_error` (files) or `observer.on_dir_error` (directories),
/// and the next task runs. The cancellation flag is
/// polled before every task; already-copied files stay in place.
pub fn execute_plan(
    l_tasks: &[EnumCopyTask],
    path_dir_src: &Path,
    path_dir_dst: &Path,
    spec_cp_options: &SpecCopyOptions,
    builder_cp_report: &mut ReportCopyBuilder,
    observer: &mut dyn CopyObserver,
) {
    for spec_task in l_tasks {
        if spec_cp_options.is_cancelled() {
            warn!("Copy cancelled; remaining tasks skipped.");
            builder_cp_report.if_cancelled = true;
            return;
        }

        let res_task = match spec_task {
            EnumCopyTask::CreateDir(path_rel) => fs::create_dir_all(path_dir_dst.join(path_rel))
                .map(|_| builder_cp_report.add_dir_created())
                .map_err(|e| {
                    (
                        EnumCopyErrorKind::DestinationWriteFailure,
                        format!("Failed to create directory: {e}"),
                    )
                }),
            EnumCopyTask::CopyFile(path_rel) => {
                execute_copy_file(path_rel, path_dir_src, path_dir_dst).map(|_| {
                    builder_cp_report.add_copied();
                    observer.on_item_copied(builder_cp_report.cnt_copied, path_rel);
                })
            }
        };

        if let Err((kind, exception)) = res_task {
            let path_rel = spec_task.path_rel();
            warn!("{} ({kind}): {exception}", path_rel.display());
            builder_cp_report.add_error(path_rel.to_path_buf(), kind, exception);
            if let Some(spec_error) = builder_cp_report.errors.last() {
                match spec_task {
                    EnumCopyTask::CreateDir(_) => observer.on_dir_error(spec_error),
                    EnumCopyTask::CopyFile(_) => observer.on_item_error(spec_error),
                }
            }
        }
    }
}

fn execute_copy_file(
    path_rel: &Path,
    path_dir_src: &Path,
    path_dir_dst: &Path,
) -> Result<(), (EnumCopyErrorKind, String)> {
    let path_file_src = path_dir_src.join(path_rel);
    let path_file_dst = path_dir_dst.join(path_rel);

    if let Some(path_parent_dst) = path_file_dst.parent() {
        fs::create_dir_all(path_parent_dst).map_err(|e| {
            (
                EnumCopyErrorKind::DestinationWriteFailure,
                format!("Failed to create parent directory: {e}"),
            )
        })?;
    }

    copy_file_with_metadata(&path_file_src, &path_file_dst)
        .map_err(|(stage, e)| (classify_io_error(&e, stage), e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use tempfile::TempDir;

    use super::{copy_tree, copy_tree_with_observer, execute_plan};
    use crate::event::CopyObserver;
    use crate::event::testing::ObserverRecording;
    use crate::filter::FilterManager;
    use crate::plan::plan_tree;
    use crate::report::ReportCopyBuilder;
    use crate::spec::{CopyTreeError, EnumCopyErrorKind, SpecCopyOptions};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, txt).expect("write text");
    }

    fn list_tree(root: &Path) -> Vec<String> {
        fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
            let mut l_entries: Vec<_> = fs::read_dir(dir)
                .expect("read dir")
                .map(|e| e.expect("entry").path())
                .collect();
            l_entries.sort();
            for path in l_entries {
                let rel = path
                    .strip_prefix(root)
                    .expect("prefix")
                    .to_string_lossy()
                    .replace('\\', "/");
                if path.is_dir() {
                    out.push(format!("{rel}/"));
                    walk(root, &path, out);
                } else {
                    let body = fs::read_to_string(&path).unwrap_or_default();
                    out.push(format!("{rel}={body}"));
                }
            }
        }
        let mut out = Vec::new();
        walk(root, root, &mut out);
        out
    }

    #[test]
    fn copy_tree_smoke_basic() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        write_text(&src.join("root.txt"), "root");
        write_text(&src.join("a/file1.txt"), "a");
        write_text(&src.join("b/sub/file2.txt"), "b");
        fs::create_dir_all(src.join("empty")).expect("mkdir empty");

        let report = copy_tree(&src, &dst, SpecCopyOptions::default()).expect("copy tree");
        assert_eq!(report.error_count(), 0);
        assert_eq!(report.cnt_eligible, 3);
        assert_eq!(report.cnt_copied, 3);
        assert!(!report.if_cancelled);
        assert_eq!(fs::read_to_string(dst.join("root.txt")).expect("read"), "root");
        assert!(dst.join("a/file1.txt").exists());
        assert!(dst.join("b/sub/file2.txt").exists());
        assert!(dst.join("empty").is_dir());
    }

    #[test]
    fn copy_tree_rules_skip_file_and_prune_directory() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        write_text(&src.join("a/b.txt"), "b");
        write_text(&src.join("a/.ignorecopy"), "*.log\n");
        write_text(&src.join("a/c.log"), "c");
        write_text(&src.join("x/.ignorecopy"), "sub/\n");
        write_text(&src.join("x/sub/y.txt"), "y");

        let report = copy_tree(&src, &dst, SpecCopyOptions::default()).expect("copy tree");
        assert_eq!(report.error_count(), 0);
        assert_eq!(report.cnt_eligible, 1);
        assert!(dst.join("a/b.txt").exists());
        assert!(!dst.join("a/c.log").exists());
        assert!(dst.join("x").is_dir());
        assert!(!dst.join("x/sub").exists());
        assert_eq!(report.cnt_dirs_pruned, 1);
    }

    #[test]
    fn copy_tree_full_override_copies_everything() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        write_text(&src.join(".ignorecopy"), "*\n");
        write_text(&src.join("a/c.log"), "c");
        write_text(&src.join("x/sub/y.txt"), "y");

        let spec_cp_options = SpecCopyOptions {
            if_ignore_rules: true,
            ..SpecCopyOptions::default()
        };
        let report = copy_tree(&src, &dst, spec_cp_options).expect("copy tree");
        assert_eq!(report.cnt_copied, 3);
        assert_eq!(list_tree(&src), list_tree(&dst));
    }

    #[test]
    fn copy_tree_twice_is_idempotent() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        write_text(&src.join(".ignorecopy"), "target/\n*.o\n");
        write_text(&src.join("main.c"), "int main;");
        write_text(&src.join("main.o"), "obj");
        write_text(&src.join("target/debug/bin"), "bin");
        write_text(&src.join("lib/util.c"), "util");

        let report_first = copy_tree(&src, &dst, SpecCopyOptions::default()).expect("first");
        let tree_first = list_tree(&dst);
        let report_second = copy_tree(&src, &dst, SpecCopyOptions::default()).expect("second");
        let tree_second = list_tree(&dst);

        assert_eq!(report_first.cnt_eligible, report_second.cnt_eligible);
        assert_eq!(report_second.error_count(), 0);
        assert_eq!(tree_first, tree_second);
        assert_eq!(tree_first, vec!["lib/", "lib/util.c=util", "main.c=int main;"]);
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_second_run_replaces_read_only_copy() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        let path_file_src = src.join("ro.txt");
        write_text(&path_file_src, "v1");
        fs::set_permissions(&path_file_src, fs::Permissions::from_mode(0o444)).expect("chmod");

        copy_tree(&src, &dst, SpecCopyOptions::default()).expect("first");
        fs::set_permissions(&path_file_src, fs::Permissions::from_mode(0o644)).expect("chmod");
        fs::write(&path_file_src, "v2").expect("rewrite");
        fs::set_permissions(&path_file_src, fs::Permissions::from_mode(0o444)).expect("chmod");

        let report = copy_tree(&src, &dst, SpecCopyOptions::default()).expect("second");
        assert_eq!(report.error_count(), 0);
        assert_eq!(fs::read_to_string(dst.join("ro.txt")).expect("read"), "v2");
    }

    #[test]
    fn vanished_source_is_recorded_and_run_continues() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a.txt"), "a");
        write_text(&src.join("b.txt"), "b");
        write_text(&src.join("c/d.txt"), "d");

        let spec_cp_options = SpecCopyOptions::default();
        let mut filter_manager = FilterManager::new(&src, &spec_cp_options);
        let mut builder = ReportCopyBuilder::default();
        let mut observer = ObserverRecording::default();
        let plan = plan_tree(
            &mut filter_manager,
            &spec_cp_options,
            &mut builder,
            &mut observer,
        );
        fs::remove_file(src.join("a.txt")).expect("remove");

        execute_plan(
            &plan.l_tasks,
            &src,
            &dst,
            &spec_cp_options,
            &mut builder,
            &mut observer,
        );

        assert_eq!(builder.errors.len(), 1);
        assert_eq!(builder.errors[0].path, PathBuf::from("a.txt"));
        assert_eq!(builder.errors[0].kind, EnumCopyErrorKind::NotFound);
        assert!(dst.join("b.txt").exists());
        assert!(dst.join("c/d.txt").exists());
        assert_eq!(
            plan.cnt_eligible as usize,
            observer.l_copied.len() + observer.l_errors.len()
        );
    }

    #[cfg(unix)]
    #[test]
    fn access_denied_file_is_recorded_once() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a.txt"), "a");
        write_text(&src.join("locked.txt"), "secret");
        write_text(&src.join("z.txt"), "z");
        let path_locked = src.join("locked.txt");
        fs::set_permissions(&path_locked, fs::Permissions::from_mode(0o000)).expect("chmod");
        if fs::File::open(&path_locked).is_ok() {
            // Privileged user: permissions are not enforced.
            return;
        }

        let mut observer = ObserverRecording::default();
        let report =
            copy_tree_with_observer(&src, &dst, SpecCopyOptions::default(), &mut observer)
                .expect("copy tree");
        fs::set_permissions(&path_locked, fs::Permissions::from_mode(0o644)).expect("chmod");

        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].path, PathBuf::from("locked.txt"));
        assert_eq!(report.errors[0].kind, EnumCopyErrorKind::AccessDenied);
        assert!(dst.join("a.txt").exists());
        assert!(dst.join("z.txt").exists());
        assert_eq!(observer.cnt_total, Some(3));
        assert_eq!(observer.l_copied.len() + observer.l_errors.len(), 3);
    }

    #[test]
    fn destination_conflict_is_write_failure() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a.txt"), "a");
        write_text(&src.join("b.txt"), "b");
        fs::create_dir_all(dst.join("a.txt")).expect("occupy destination");

        let report = copy_tree(&src, &dst, SpecCopyOptions::default()).expect("copy tree");
        assert_eq!(report.error_count(), 1);
        assert_eq!(
            report.errors[0].kind,
            EnumCopyErrorKind::DestinationWriteFailure
        );
        assert_eq!(report.cnt_copied, 1);
    }

    #[test]
    fn failed_directory_is_not_counted_as_an_item() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("d/x.txt"), "x");
        write_text(&src.join("d/y.txt"), "y");
        write_text(&dst.join("d"), "occupied");

        let mut observer = ObserverRecording::default();
        let report =
            copy_tree_with_observer(&src, &dst, SpecCopyOptions::default(), &mut observer)
                .expect("copy tree");

        assert_eq!(report.cnt_eligible, 2);
        assert_eq!(report.error_count(), 3);
        assert_eq!(observer.l_dir_errors.len(), 1);
        assert_eq!(observer.l_dir_errors[0].path, PathBuf::from("d"));
        assert_eq!(
            report.cnt_eligible as usize,
            observer.l_copied.len() + observer.l_errors.len()
        );
    }

    #[test]
    fn destination_inside_source_is_never_copied_into_itself() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = src.join("backup");
        write_text(&src.join("a.txt"), "a");
        write_text(&src.join("sub/b.txt"), "b");

        let report_first = copy_tree(&src, &dst, SpecCopyOptions::default()).expect("first");
        let tree_first = list_tree(&dst);
        let report_second = copy_tree(&src, &dst, SpecCopyOptions::default()).expect("second");

        assert_eq!(report_first.cnt_eligible, 2);
        assert_eq!(report_second.cnt_eligible, 2);
        assert_eq!(report_second.cnt_dirs_pruned, 1);
        assert!(!dst.join("backup").exists());
        assert_eq!(tree_first, list_tree(&dst));

        let spec_cp_options = SpecCopyOptions {
            if_ignore_rules: true,
            ..SpecCopyOptions::default()
        };
        let report_override = copy_tree(&src, &dst, spec_cp_options).expect("override");
        assert_eq!(report_override.cnt_eligible, 2);
        assert!(!dst.join("backup").exists());
    }

    #[test]
    fn events_are_emitted_in_order() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a.txt"), "a");
        write_text(&src.join("d/b.txt"), "b");

        let mut observer = ObserverRecording::default();
        copy_tree_with_observer(&src, &dst, SpecCopyOptions::default(), &mut observer)
            .expect("copy tree");

        assert_eq!(observer.cnt_total, Some(2));
        assert_eq!(
            observer.l_copied,
            vec![(1, PathBuf::from("a.txt")), (2, PathBuf::from("d/b.txt"))]
        );
        assert_eq!(observer.cnt_complete, 1);
    }

    #[test]
    fn cancellation_stops_between_tasks() {
        struct ObserverCancelAfterFirst {
            flag: Arc<AtomicBool>,
            cnt_copied: u64,
        }

        impl CopyObserver for ObserverCancelAfterFirst {
            fn on_item_copied(&mut self, cnt_current: u64, _path_rel: &Path) {
                self.cnt_copied = cnt_current;
                self.flag.store(true, Ordering::Relaxed);
            }
        }

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        for name in ["a.txt", "b.txt", "c.txt"] {
            write_text(&src.join(name), name);
        }

        let flag = Arc::new(AtomicBool::new(false));
        let spec_cp_options = SpecCopyOptions {
            flag_cancel: Some(flag.clone()),
            ..SpecCopyOptions::default()
        };
        let mut observer = ObserverCancelAfterFirst {
            flag,
            cnt_copied: 0,
        };
        let report = copy_tree_with_observer(&src, &dst, spec_cp_options, &mut observer)
            .expect("copy tree");

        assert!(report.if_cancelled);
        assert_eq!(report.cnt_copied, 1);
        assert_eq!(observer.cnt_copied, 1);
        assert!(dst.join("a.txt").exists());
        assert!(!dst.join("b.txt").exists());
    }

    #[test]
    fn missing_source_is_fatal() {
        let tmp = TempDir::new().expect("tempdir");
        let err = copy_tree(
            tmp.path().join("nope"),
            tmp.path().join("dst"),
            SpecCopyOptions::default(),
        )
        .expect_err("must fail");
        assert!(matches!(err, CopyTreeError::SourceNotFound(_)));
        assert!(!tmp.path().join("dst").exists());
    }

    #[test]
    fn file_source_is_fatal() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("f.txt"), "f");
        let err = copy_tree(
            tmp.path().join("f.txt"),
            tmp.path().join("dst"),
            SpecCopyOptions::default(),
        )
        .expect_err("must fail");
        assert!(matches!(err, CopyTreeError::SourceNotDirectory(_)));
    }

    #[test]
    fn uncreatable_destination_is_fatal() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        write_text(&src.join("a.txt"), "a");
        write_text(&tmp.path().join("blocker"), "file");

        let err = copy_tree(&src, tmp.path().join("blocker/dst"), SpecCopyOptions::default())
            .expect_err("must fail");
        assert!(matches!(err, CopyTreeError::DestinationInitFailed { .. }));
    }
}
