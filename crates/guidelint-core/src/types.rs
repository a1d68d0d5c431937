//! Core types for rule findings.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ir::NodeSite;

/// Severity level of a rule, as worded by the style guide.
///
/// Ordering follows strictness: `May < Should < Must`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informational; never affects the run status beyond `warn`.
    #[serde(alias = "may")]
    May,
    /// Advisory warning.
    #[serde(alias = "should")]
    Should,
    /// Blocking requirement; any violation fails the run.
    #[serde(alias = "must")]
    Must,
}

impl Severity {
    /// Parses a severity from its guide wording (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "must" => Some(Self::Must),
            "should" => Some(Self::Should),
            "may" => Some(Self::May),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::May => write!(f, "MAY"),
            Self::Should => write!(f, "SHOULD"),
            Self::Must => write!(f, "MUST"),
        }
    }
}

/// Number of hex digits kept from the BLAKE3 digest of a location.
const FINGERPRINT_LEN: usize = 16;

/// Computes the stable location fingerprint of a node.
///
/// The digest covers the file path (with `/` separators), the node path
/// inside the syntax tree and the line, so the same structure in two files
/// never shares a fingerprint.
#[must_use]
pub fn location_fingerprint(file: &Path, node_path: &str, line: usize) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(normalize_path(file).as_bytes());
    hasher.update(b"\n");
    hasher.update(node_path.as_bytes());
    hasher.update(b"\n");
    hasher.update(line.to_string().as_bytes());
    let hex = hasher.finalize().to_hex();
    hex.as_str()[..FINGERPRINT_LEN].to_string()
}

/// Renders a path with `/` separators regardless of platform.
#[must_use]
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// A raw rule-predicate match, before waiver filtering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Rule id (e.g., "SG-021").
    pub rule_id: String,
    /// Severity of the rule that produced this finding.
    pub severity: Severity,
    /// File path relative to the project root, `/` separated.
    pub file_path: String,
    /// Stable hash of file path, node path and line.
    pub fingerprint: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Human-readable message.
    pub message: String,
}

impl Finding {
    /// Creates a finding anchored at an extracted node.
    #[must_use]
    pub fn at(
        rule_id: impl Into<String>,
        severity: Severity,
        file: &Path,
        site: &NodeSite,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            file_path: normalize_path(file),
            fingerprint: location_fingerprint(file, &site.node_path, site.line),
            line: site.line,
            column: site.column,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.file_path, self.line, self.column, self.severity, self.rule_id, self.message
        )
    }
}
