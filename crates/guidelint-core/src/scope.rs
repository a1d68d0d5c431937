//! Rule applicability: which files a rule looks at.

use serde::{Serialize, Serializer};
use std::path::Path;

use crate::ir::{FileKind, SourceFileIR};
use crate::types::normalize_path;

/// Errors raised while building scope patterns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// Empty glob.
    #[error("glob pattern must not be empty")]
    Empty,

    /// Glob that the `glob` crate rejects.
    #[error("invalid glob pattern `{pattern}`: {reason}")]
    Invalid {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// A validated glob pattern for relative file paths.
///
/// The glob is compiled once at construction and reused for all match calls.
/// Paths are matched with `/` separators on every platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    raw: String,
    compiled: glob::Pattern,
}

impl GlobPattern {
    /// Compiles a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is empty or has invalid glob syntax.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        let compiled = glob::Pattern::new(pattern).map_err(|e| PatternError::Invalid {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: pattern.to_string(),
            compiled,
        })
    }

    /// Tests whether a relative file path matches this pattern.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        self.matches_str(&normalize_path(path))
    }

    /// Tests a `/` separated path string.
    #[must_use]
    pub fn matches_str(&self, path: &str) -> bool {
        if self.compiled.matches(path) {
            return true;
        }
        // `dir/**` also matches everything below `dir` when the glob crate
        // would not (e.g. a trailing separator in the raw pattern).
        if let Some(prefix) = self.raw.strip_suffix("/**") {
            let prefix = prefix.trim_end_matches('/');
            return path.starts_with(prefix)
                && path.as_bytes().get(prefix.len()).is_some_and(|&b| b == b'/');
        }
        false
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for GlobPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Selects the files a rule applies to.
///
/// Empty `kinds` means every kind and empty `paths` means every path.
/// `exclude` always wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScopeSelector {
    kinds: Vec<FileKind>,
    paths: Vec<GlobPattern>,
    exclude: Vec<GlobPattern>,
}

impl ScopeSelector {
    /// A selector matching every file.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// A selector matching the given file kinds.
    #[must_use]
    pub fn kinds(kinds: impl IntoIterator<Item = FileKind>) -> Self {
        let mut kinds: Vec<FileKind> = kinds.into_iter().collect();
        kinds.sort();
        kinds.dedup();
        Self {
            kinds,
            ..Self::default()
        }
    }

    /// Restricts the selector to paths matching `pattern`.
    #[must_use]
    pub fn with_path(mut self, pattern: GlobPattern) -> Self {
        self.paths.push(pattern);
        self
    }

    /// Excludes paths matching `pattern`.
    #[must_use]
    pub fn with_exclude(mut self, pattern: GlobPattern) -> Self {
        self.exclude.push(pattern);
        self
    }

    /// Selected file kinds (empty = any).
    #[must_use]
    pub fn file_kinds(&self) -> &[FileKind] {
        &self.kinds
    }

    /// Returns true if the rule applies to this file.
    #[must_use]
    pub fn matches(&self, ir: &SourceFileIR) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&ir.kind) {
            return false;
        }
        let path = normalize_path(&ir.path);
        if !self.paths.is_empty() && !self.paths.iter().any(|p| p.matches_str(&path)) {
            return false;
        }
        !self.exclude.iter().any(|p| p.matches_str(&path))
    }
}

impl std::fmt::Display for ScopeSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.kinds.is_empty() {
            f.write_str("any")?;
        } else {
            let kinds: Vec<String> = self.kinds.iter().map(ToString::to_string).collect();
            f.write_str(&kinds.join(", "))?;
        }
        if !self.paths.is_empty() {
            let paths: Vec<&str> = self.paths.iter().map(GlobPattern::as_str).collect();
            write!(f, " in {}", paths.join(", "))?;
        }
        Ok(())
    }
}
