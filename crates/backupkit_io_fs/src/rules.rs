//! Rules file loading and per-scope evaluation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::pattern::SpecPattern;
use crate::spec::{EnumFilterDecision, RulesFileError};

/// Ordered patterns loaded from one directory's rules file.
#[derive(Debug, Clone, Default)]
pub struct SpecRuleSet {
    path_dir_scope: PathBuf,
    l_patterns: Vec<SpecPattern>,
}

impl SpecRuleSet {
    /// Load the rules file `name_rules_file` inside `path_dir_scope`.
    ///
    /// A missing file yields an empty rule set. Unreadable or non-UTF-8 files also
    /// yield an empty rule set, together with a diagnostic. Lines that fail to
    /// compile are dropped one by one, each with its own diagnostic.
    pub fn load(path_dir_scope: &Path, name_rules_file: &str) -> (Self, Vec<RulesFileError>) {
        let mut rule_set = Self {
            path_dir_scope: path_dir_scope.to_path_buf(),
            l_patterns: Vec::new(),
        };
        let path_rules = path_dir_scope.join(name_rules_file);

        match fs::metadata(&path_rules) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return (rule_set, Vec::new()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return (rule_set, Vec::new()),
            Err(e) => {
                return (
                    rule_set,
                    vec![RulesFileError::Unreadable {
                        path: path_rules,
                        source: e,
                    }],
                );
            }
        }

        let raw = match fs::read(&path_rules) {
            Ok(v) => v,
            Err(e) => {
                return (
                    rule_set,
                    vec![RulesFileError::Unreadable {
                        path: path_rules,
                        source: e,
                    }],
                );
            }
        };
        let Ok(txt) = String::from_utf8(raw) else {
            return (rule_set, vec![RulesFileError::NotUtf8 { path: path_rules }]);
        };

        let mut l_diagnostics = Vec::new();
        for (n_idx, line) in txt.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match SpecPattern::parse(line) {
                Ok(pattern) => rule_set.l_patterns.push(pattern),
                Err(message) => l_diagnostics.push(RulesFileError::InvalidPattern {
                    path: path_rules.clone(),
                    line: n_idx + 1,
                    pattern: line.to_string(),
                    message,
                }),
            }
        }

        debug!(
            scope = %path_dir_scope.display(),
            patterns = rule_set.l_patterns.len(),
            "loaded rules file"
        );
        (rule_set, l_diagnostics)
    }

    /// Directory the rules were loaded from.
    pub fn scope(&self) -> &Path {
        &self.path_dir_scope
    }

    /// Patterns in declaration order.
    pub fn patterns(&self) -> &[SpecPattern] {
        &self.l_patterns
    }

    pub fn is_empty(&self) -> bool {
        self.l_patterns.is_empty()
    }

    /// Decision of the last matching pattern for a scope-relative path.
    pub fn evaluate(&self, path_rel: &str, if_is_dir: bool) -> EnumFilterDecision {
        match self
            .l_patterns
            .iter()
            .rev()
            .find(|p| p.matches(path_rel, if_is_dir))
        {
            Some(_) => EnumFilterDecision::Excluded,
            None => EnumFilterDecision::NoOpinion,
        }
    }
}
