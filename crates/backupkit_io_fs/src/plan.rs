//! Preorder traversal producing the ordered copy tasks.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::event::CopyObserver;
use crate::filter::FilterManager;
use crate::report::ReportCopyBuilder;
use crate::spec::{EnumCopyErrorKind, SpecCopyOptions};
use crate::util::{EnumCopyStage, classify_io_error};

/// One unit of work, always addressed relative to the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumCopyTask {
    /// Ensure the destination directory exists.
    CreateDir(PathBuf),
    /// Copy one file with its metadata.
    CopyFile(PathBuf),
}

impl EnumCopyTask {
    /// Relative path of the task target.
    pub fn path_rel(&self) -> &Path {
        match self {
            Self::CreateDir(path_rel) | Self::CopyFile(path_rel) => path_rel,
        }
    }
}

/// Output of one planning pass.
#[derive(Debug, Default, Clone)]
pub struct SpecCopyPlan {
    /// Tasks in execution order (directory before its files, files before subdirectories).
    pub l_tasks: Vec<EnumCopyTask>,
    /// Number of `CopyFile` tasks.
    pub cnt_eligible: u64,
}

#[derive(Debug, Clone)]
struct SpecPlanEntry {
    name: OsString,
    if_is_dir: bool,
}

struct SpecPlanContext<'a> {
    path_dir_src: PathBuf,
    filter_manager: &'a mut FilterManager,
    spec_cp_options: &'a SpecCopyOptions,
    builder_cp_report: &'a mut ReportCopyBuilder,
    observer: &'a mut dyn CopyObserver,
    spec_cp_plan: SpecCopyPlan,
}

impl SpecPlanContext<'_> {
    fn forward_diagnostics(&mut self) {
        for diag in self.filter_manager.drain_diagnostics() {
            let message = format!("{}: {diag}", EnumCopyErrorKind::MalformedRulesFile);
            self.observer.on_warning(&message);
            self.builder_cp_report.add_warning(message);
        }
    }

    fn record_warning(&mut self, message: String) {
        warn!("{message}");
        self.observer.on_warning(&message);
        self.builder_cp_report.add_warning(message);
    }
}

/// Walk the tree below the filter manager's root and plan the copy.
///
/// Excluded directories are pruned without being listed. Pruned directories and
/// filtered files are counted in `builder_cp_report`; unreadable directories are
/// recorded there as errors and the walk continues with their siblings.
pub fn plan_tree(
    filter_manager: &mut FilterManager,
    spec_cp_options: &SpecCopyOptions,
    builder_cp_report: &mut ReportCopyBuilder,
    observer: &mut dyn CopyObserver,
) -> SpecCopyPlan {
    let mut spec_plan_ctx = SpecPlanContext {
        path_dir_src: filter_manager.root().to_path_buf(),
        filter_manager,
        spec_cp_options,
        builder_cp_report,
        observer,
        spec_cp_plan: SpecCopyPlan::default(),
    };

    walk_directory(Path::new(""), &mut spec_plan_ctx);
    spec_plan_ctx.forward_diagnostics();
    spec_plan_ctx.spec_cp_plan
}

fn walk_directory(path_rel: &Path, spec_plan_ctx: &mut SpecPlanContext<'_>) {
    if spec_plan_ctx.spec_cp_options.is_cancelled() {
        spec_plan_ctx.builder_cp_report.if_cancelled = true;
        return;
    }

    spec_plan_ctx.observer.on_dir_visited(path_rel);
    spec_plan_ctx
        .spec_cp_plan
        .l_tasks
        .push(EnumCopyTask::CreateDir(path_rel.to_path_buf()));

    let path_dir = spec_plan_ctx.path_dir_src.join(path_rel);
    let iter_entries = match fs::read_dir(&path_dir) {
        Ok(iter) => iter,
        Err(e) => {
            let kind = classify_io_error(&e, EnumCopyStage::Source);
            warn!("Failed to read directory {} ({e})", path_dir.display());
            spec_plan_ctx.builder_cp_report.add_error(
                path_rel.to_path_buf(),
                kind,
                format!("Failed to read directory: {e}"),
            );
            if let Some(spec_error) = spec_plan_ctx.builder_cp_report.errors.last() {
                spec_plan_ctx.observer.on_dir_error(spec_error);
            }
            return;
        }
    };

    let mut l_dirs: Vec<SpecPlanEntry> = Vec::new();
    let mut l_files: Vec<SpecPlanEntry> = Vec::new();
    for _entry_res in iter_entries {
        let entry = match _entry_res {
            Ok(v) => v,
            Err(e) => {
                spec_plan_ctx.record_warning(format!(
                    "Failed to read directory entry under {} ({e})",
                    path_dir.display()
                ));
                continue;
            }
        };

        let path_entry = entry.path();
        let cfg_file_type = match entry.file_type() {
            Ok(v) => v,
            Err(e) => {
                spec_plan_ctx
                    .record_warning(format!("Failed to inspect {} ({e})", path_entry.display()));
                continue;
            }
        };

        // Links take the type of their target; dangling links are planned as
        // files and fail when copied.
        let (b_is_dir, b_is_file) = if cfg_file_type.is_symlink() {
            match fs::metadata(&path_entry) {
                Ok(meta) => (meta.is_dir(), meta.is_file()),
                Err(_) => (false, true),
            }
        } else {
            (cfg_file_type.is_dir(), cfg_file_type.is_file())
        };

        if b_is_dir {
            l_dirs.push(SpecPlanEntry {
                name: entry.file_name(),
                if_is_dir: true,
            });
        } else if b_is_file {
            l_files.push(SpecPlanEntry {
                name: entry.file_name(),
                if_is_dir: false,
            });
        } else {
            spec_plan_ctx
                .record_warning(format!("Special file skipped: {}", path_entry.display()));
        }
    }

    l_dirs.sort_by(|a, b| a.name.cmp(&b.name));
    l_files.sort_by(|a, b| a.name.cmp(&b.name));

    for _file_entry in l_files {
        let path_rel_file = path_rel.join(&_file_entry.name);
        if spec_plan_ctx
            .filter_manager
            .decide(&path_rel_file, _file_entry.if_is_dir)
            .is_excluded()
        {
            debug!(path = %path_rel_file.display(), "file filtered");
            spec_plan_ctx.builder_cp_report.add_skipped();
            continue;
        }
        spec_plan_ctx
            .spec_cp_plan
            .l_tasks
            .push(EnumCopyTask::CopyFile(path_rel_file));
        spec_plan_ctx.spec_cp_plan.cnt_eligible += 1;
    }
    spec_plan_ctx.forward_diagnostics();

    for _dir_entry in l_dirs {
        let path_rel_dir = path_rel.join(&_dir_entry.name);
        if spec_plan_ctx
            .filter_manager
            .decide(&path_rel_dir, _dir_entry.if_is_dir)
            .is_excluded()
        {
            debug!(path = %path_rel_dir.display(), "directory pruned");
            spec_plan_ctx.builder_cp_report.add_dir_pruned();
            continue;
        }
        walk_directory(&path_rel_dir, spec_plan_ctx);
        if spec_plan_ctx.builder_cp_report.if_cancelled {
            return;
        }
    }
}
