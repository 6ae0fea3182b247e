//! Hierarchical rule resolution across nested scopes.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::rules::SpecRuleSet;
use crate::spec::{EnumFilterDecision, RulesFileError, SpecCopyOptions};
use crate::util::to_path_rel_text;

/// Resolves the effective filter of any path below one tree root.
///
/// Rule sets are loaded lazily, once per directory, and kept for the lifetime of
/// the manager (one run). Decisions themselves are never cached.
#[derive(Debug)]
pub struct FilterManager {
    path_dir_root: PathBuf,
    name_rules_file: String,
    if_ignore_rules: bool,
    map_rule_sets: HashMap<PathBuf, SpecRuleSet>,
    l_diagnostics: Vec<RulesFileError>,
    path_rel_destination: Option<PathBuf>,
}

impl FilterManager {
    pub fn new<P: AsRef<Path>>(path_dir_root: P, spec_cp_options: &SpecCopyOptions) -> Self {
        Self {
            path_dir_root: path_dir_root.as_ref().to_path_buf(),
            name_rules_file: spec_cp_options.name_rules_file.clone(),
            if_ignore_rules: spec_cp_options.if_ignore_rules,
            map_rule_sets: HashMap::new(),
            l_diagnostics: Vec::new(),
            path_rel_destination: None,
        }
    }

    /// Exclude a copy destination nested in the tree, in every mode.
    pub fn exclude_destination<P: AsRef<Path>>(&mut self, path_rel: P) {
        let path_rel: PathBuf = normal_parts(path_rel.as_ref()).into_iter().collect();
        if !path_rel.as_os_str().is_empty() {
            self.path_rel_destination = Some(path_rel);
        }
    }

    /// Tree root all scopes hang from.
    pub fn root(&self) -> &Path {
        &self.path_dir_root
    }

    /// Whether an absolute (or root-relative) path is excluded.
    ///
    /// A path is excluded when it, or any directory between the root and it, is
    /// excluded by the effective filter. The root itself and paths outside the
    /// root are never excluded. In full-override mode no rules file is read and
    /// only a nested destination is excluded.
    pub fn is_excluded(&mut self, path: &Path, if_is_dir: bool) -> bool {
        let path_rel = match path.strip_prefix(&self.path_dir_root) {
            Ok(v) => v.to_path_buf(),
            Err(_) if path.is_relative() => path.to_path_buf(),
            Err(_) => return false,
        };

        let l_parts = normal_parts(&path_rel);
        let mut path_rel_ancestor = PathBuf::new();
        for part in l_parts.iter().take(l_parts.len().saturating_sub(1)) {
            path_rel_ancestor.push(part);
            if self.decide(&path_rel_ancestor, true).is_excluded() {
                return true;
            }
        }
        self.decide(&path_rel, if_is_dir).is_excluded()
    }

    /// Effective decision for `path_rel` itself, assuming its ancestors are admitted.
    ///
    /// Scopes are evaluated from the root down to the immediate parent; the
    /// deepest scope with an opinion wins. Rules files themselves and a nested
    /// destination directory are excluded.
    pub fn decide(&mut self, path_rel: &Path, if_is_dir: bool) -> EnumFilterDecision {
        let l_parts = normal_parts(path_rel);
        if l_parts.is_empty() {
            return EnumFilterDecision::NoOpinion;
        }
        if if_is_dir
            && self
                .path_rel_destination
                .as_deref()
                .is_some_and(|path_dst| l_parts.iter().collect::<PathBuf>() == path_dst)
        {
            return EnumFilterDecision::Excluded;
        }
        if self.if_ignore_rules {
            return EnumFilterDecision::NoOpinion;
        }
        // Rules files configure the copy; they are not part of it.
        if !if_is_dir && l_parts[l_parts.len() - 1] == self.name_rules_file.as_str() {
            return EnumFilterDecision::Excluded;
        }

        let mut path_dir_scope = self.path_dir_root.clone();
        let mut l_decisions = Vec::with_capacity(l_parts.len());
        for n_idx in 0..l_parts.len() {
            if n_idx > 0 {
                path_dir_scope.push(l_parts[n_idx - 1]);
            }
            let path_rel_scope = to_path_rel_text(&l_parts[n_idx..].iter().collect::<PathBuf>());
            let rule_set = self.rule_set_for(&path_dir_scope);
            l_decisions.push(rule_set.evaluate(&path_rel_scope, if_is_dir));
        }

        let decision = EnumFilterDecision::compose(l_decisions);
        debug!(path = %path_rel.display(), if_is_dir, ?decision, "filter decision");
        decision
    }

    /// Cached (or freshly loaded) rule set of one directory.
    fn rule_set_for(&mut self, path_dir_scope: &Path) -> &SpecRuleSet {
        let name_rules_file = &self.name_rules_file;
        let l_diagnostics = &mut self.l_diagnostics;
        self.map_rule_sets
            .entry(path_dir_scope.to_path_buf())
            .or_insert_with(|| {
                let (rule_set, l_diag) = SpecRuleSet::load(path_dir_scope, name_rules_file);
                for diag in &l_diag {
                    warn!("{diag}");
                }
                l_diagnostics.extend(l_diag);
                rule_set
            })
    }

    /// Number of directories whose rules file has been consulted so far.
    pub fn cnt_rule_sets_loaded(&self) -> usize {
        self.map_rule_sets.len()
    }

    /// Take the rules-file diagnostics collected since the last call.
    pub fn drain_diagnostics(&mut self) -> Vec<RulesFileError> {
        std::mem::take(&mut self.l_diagnostics)
    }
}

fn normal_parts(path_rel: &Path) -> Vec<&OsStr> {
    path_rel
        .components()
        .filter_map(|part| match part {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .collect()
}
