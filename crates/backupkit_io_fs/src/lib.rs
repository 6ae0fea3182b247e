//! `backupkit_io_fs` v1:
//! Filesystem tree copy driven by hierarchical `.ignorecopy` rules.
//!
//! Modules, leaves first:
//! - `pattern` : one glob-style exclusion pattern
//! - `rules`   : ordered patterns of one directory's rules file
//! - `filter`  : effective filter composed from nested scopes
//! - `plan`    : preorder traversal producing copy tasks
//! - `copy`    : validation, task execution and reporting
//! - `event`   : progress / verbose collaborator interface
//! - `spec`    : enums/options/errors
//! - `report`  : run-time report model
//! - `util`    : shared helper functions

pub mod copy;
pub mod event;
pub mod filter;
pub mod pattern;
pub mod plan;
pub mod report;
pub mod rules;
pub mod spec;
mod util;

pub use copy::{copy_tree, copy_tree_with_observer, execute_plan};
pub use event::{CopyObserver, ObserverNoop};
pub use filter::FilterManager;
pub use pattern::SpecPattern;
pub use plan::{EnumCopyTask, SpecCopyPlan, plan_tree};
pub use report::{ReportCopy, ReportCopyBuilder};
pub use rules::SpecRuleSet;
pub use spec::{
    CopyTreeError, EnumCopyErrorKind, EnumFilterDecision, NAME_RULES_FILE_DEFAULT,
    RulesFileError, SpecCopyError, SpecCopyOptions,
};
