//! Copy specification models and top-level error types.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Reserved name of the per-directory rules file.
pub const NAME_RULES_FILE_DEFAULT: &str = ".ignorecopy";

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Opinion of one scope (or the composed chain) about a candidate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFilterDecision {
    /// Path is eligible for copying.
    Included,
    /// Path (and, for directories, its whole subtree) is skipped.
    Excluded,
    /// No pattern in scope matched.
    NoOpinion,
}

impl EnumFilterDecision {
    /// Compose decisions ordered from lowest to highest precedence.
    ///
    /// The last decision that is not [`EnumFilterDecision::NoOpinion`] wins.
    pub fn compose<I>(decisions: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        decisions
            .into_iter()
            .filter(|d| *d != Self::NoOpinion)
            .last()
            .unwrap_or(Self::NoOpinion)
    }

    /// Whether the decision removes the path from the copy.
    pub fn is_excluded(self) -> bool {
        self == Self::Excluded
    }
}

/// Per-item failure category recorded in the copy report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyErrorKind {
    /// Permission denied reading a source entry.
    AccessDenied,
    /// Source entry vanished (or was a dangling link) between planning and copying.
    NotFound,
    /// A rules file could not be parsed; the scope degraded to no rules.
    MalformedRulesFile,
    /// Destination could not be written (disk full, permission, path too long).
    DestinationWriteFailure,
}

impl fmt::Display for EnumCopyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let txt = match self {
            Self::AccessDenied => "access denied",
            Self::NotFound => "not found",
            Self::MalformedRulesFile => "malformed rules file",
            Self::DestinationWriteFailure => "destination write failure",
        };
        f.write_str(txt)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `copy_tree`.
#[derive(Debug, Clone)]
pub struct SpecCopyOptions {
    /// Full-override mode: ignore every rules file and copy everything.
    pub if_ignore_rules: bool,
    /// File name of the per-directory rules file.
    pub name_rules_file: String,
    /// Cooperative cancellation flag, polled between directories and tasks.
    pub flag_cancel: Option<Arc<AtomicBool>>,
}

impl Default for SpecCopyOptions {
    fn default() -> Self {
        Self {
            if_ignore_rules: false,
            name_rules_file: NAME_RULES_FILE_DEFAULT.to_string(),
            flag_cancel: None,
        }
    }
}

impl SpecCopyOptions {
    /// `true` once the caller raised the cancellation flag.
    pub fn is_cancelled(&self) -> bool {
        self.flag_cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// One copy failure item with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyError {
    /// Path of the failed item, relative to the source root.
    pub path: PathBuf,
    /// Failure category.
    pub kind: EnumCopyErrorKind,
    /// User-facing error text.
    pub exception: String,
}

impl fmt::Display for SpecCopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path.display(), self.kind, self.exception)
    }
}

/// Recoverable rules-file problem. The affected scope degrades instead of failing.
#[derive(Debug, Error)]
pub enum RulesFileError {
    /// Rules file exists but could not be read.
    #[error("Failed to read rules file {}: {source}", .path.display())]
    Unreadable {
        /// Rules file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Rules file is not valid UTF-8 text.
    #[error("Rules file is not valid UTF-8: {}", .path.display())]
    NotUtf8 {
        /// Rules file path.
        path: PathBuf,
    },
    /// One line does not compile as a glob; only that line is dropped.
    #[error("Invalid pattern `{pattern}` at {}:{line}: {message}", .path.display())]
    InvalidPattern {
        /// Rules file path.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Raw pattern text.
        pattern: String,
        /// Glob compiler message.
        message: String,
    },
}

impl RulesFileError {
    /// Path of the offending rules file.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Unreadable { path, .. }
            | Self::NotUtf8 { path }
            | Self::InvalidPattern { path, .. } => path,
        }
    }
}

/// "Top-level call failed" errors, raised before any copying starts.
#[derive(Debug, Error)]
pub enum CopyTreeError {
    /// Source root does not exist.
    #[error("Source directory does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),
    /// Source path is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Source root exists but cannot be listed.
    #[error("Source directory is not readable: {}: {source}", .path.display())]
    SourceUnreadable {
        /// Source root.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Destination directory initialization failed.
    #[error("Cannot create destination directory {}: {source}", .path.display())]
    DestinationInitFailed {
        /// Destination path that failed initialization.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
