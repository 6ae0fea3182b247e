//! Single exclusion pattern: parsing and matching.

use globset::{GlobBuilder, GlobMatcher};

/// Canonical separator used by rules files and normalized candidate paths.
pub const C_SEPARATOR: char = '/';

/// One parsed line of a rules file.
///
/// Matching semantics:
/// - `*` never crosses a separator, `?` matches one character, `[...]` classes are honored.
/// - A pattern without a separator is tested against the basename, at any depth.
/// - A pattern with a separator (including a leading one) is anchored to the scope root.
/// - A trailing separator restricts the pattern to directories.
#[derive(Debug, Clone)]
pub struct SpecPattern {
    text: String,
    if_dir_only: bool,
    if_anchored: bool,
    matcher: GlobMatcher,
}

impl SpecPattern {
    /// Parse a trimmed, non-comment rules line.
    pub fn parse(text: &str) -> Result<Self, String> {
        let if_dir_only = text.ends_with(C_SEPARATOR);
        let body = text.trim_end_matches(C_SEPARATOR);
        let if_leading_separator = body.starts_with(C_SEPARATOR);
        let body = body.trim_start_matches(C_SEPARATOR);
        if body.is_empty() {
            return Err(format!("Pattern `{text}` has no name component."));
        }

        let matcher = GlobBuilder::new(body)
            .literal_separator(true)
            .backslash_escape(false)
            .build()
            .map_err(|e| e.to_string())?
            .compile_matcher();

        Ok(Self {
            text: text.to_string(),
            if_dir_only,
            if_anchored: if_leading_separator || body.contains(C_SEPARATOR),
            matcher,
        })
    }

    /// Pattern text as written in the rules file.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `true` when the pattern ended with a separator.
    pub fn is_dir_only(&self) -> bool {
        self.if_dir_only
    }

    /// `true` when the pattern is matched against the scope-relative path.
    pub fn is_anchored(&self) -> bool {
        self.if_anchored
    }

    /// Test `path_rel` (scope-relative, `/`-separated) against this pattern.
    pub fn matches(&self, path_rel: &str, if_is_dir: bool) -> bool {
        if self.if_dir_only && !if_is_dir {
            return false;
        }
        if self.if_anchored {
            return self.matcher.is_match(path_rel);
        }
        let name = path_rel.rsplit(C_SEPARATOR).next().unwrap_or(path_rel);
        self.matcher.is_match(name)
    }
}
