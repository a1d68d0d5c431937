//! Waivers: accepted, time-limited exceptions to a rule.
//!
//! Waivers are read from a TOML file of `[[waiver]]` tables:
//!
//! ```toml
//! [[waiver]]
//! rule = "SG-021"
//! fingerprint = "9f2c1a7b3d4e5f60"
//! justification = "Third-party wrapper, typed upstream"
//! expiry = "2026-12-31"
//! created_by = "frontend-team"
//! ```
//!
//! Exactly one of `fingerprint` or `path` (a glob) must be given. Malformed
//! entries are reported and skipped; they never abort a run.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::registry::is_valid_rule_id;
use crate::scope::{GlobPattern, PatternError};
use crate::types::Finding;

/// Errors found while loading waivers. Non-fatal: the entry is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WaiverLoadError {
    /// The waiver file could not be read.
    #[error("failed to read waiver file {path}: {message}")]
    Io {
        /// File path.
        path: String,
        /// OS error message.
        message: String,
    },

    /// The file is not valid TOML.
    #[error("waiver file is not valid TOML: {message}")]
    Syntax {
        /// Parser message.
        message: String,
    },

    /// An entry has missing or mistyped fields.
    #[error("waiver[{index}]: {message}")]
    Malformed {
        /// Position in the file.
        index: usize,
        /// What is wrong.
        message: String,
    },

    /// `fingerprint` and `path` are both set or both missing.
    #[error("waiver[{index}] ({rule}): exactly one of `fingerprint` or `path` must be set")]
    AmbiguousMatcher {
        /// Position in the file.
        index: usize,
        /// Rule id of the entry.
        rule: String,
    },

    /// Rule id has the wrong shape.
    #[error("waiver[{index}]: invalid rule id `{rule}`")]
    InvalidRuleId {
        /// Position in the file.
        index: usize,
        /// The rejected id.
        rule: String,
    },

    /// Empty justification.
    #[error("waiver[{index}] ({rule}): justification must not be empty")]
    MissingJustification {
        /// Position in the file.
        index: usize,
        /// Rule id of the entry.
        rule: String,
    },

    /// Expiry is not a `YYYY-MM-DD` date.
    #[error("waiver[{index}] ({rule}): invalid expiry `{value}`, expected YYYY-MM-DD")]
    InvalidExpiry {
        /// Position in the file.
        index: usize,
        /// Rule id of the entry.
        rule: String,
        /// The rejected value.
        value: String,
    },

    /// Path glob failed to compile.
    #[error("waiver[{index}] ({rule}): {source}")]
    InvalidPath {
        /// Position in the file.
        index: usize,
        /// Rule id of the entry.
        rule: String,
        /// Underlying error.
        source: PatternError,
    },
}

/// What a waiver matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaiverMatcher {
    /// One exact location.
    Fingerprint(String),
    /// Every file matching a glob.
    Path(GlobPattern),
}

impl WaiverMatcher {
    fn matches(&self, finding: &Finding) -> bool {
        match self {
            Self::Fingerprint(fp) => *fp == finding.fingerprint,
            Self::Path(glob) => glob.matches_str(&finding.file_path),
        }
    }
}

impl std::fmt::Display for WaiverMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fingerprint(fp) => write!(f, "fingerprint:{fp}"),
            Self::Path(glob) => write!(f, "path:{glob}"),
        }
    }
}

/// An accepted exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waiver {
    /// Rule being waived.
    pub rule_id: String,
    /// Where it applies.
    pub matcher: WaiverMatcher,
    /// Why the exception was accepted.
    pub justification: String,
    /// Last day the waiver is active; `None` never expires.
    pub expiry: Option<NaiveDate>,
    /// Who recorded it.
    pub created_by: Option<String>,
}

impl Waiver {
    /// A waiver is active up to and including its expiry day.
    #[must_use]
    pub fn is_active(&self, as_of: NaiveDate) -> bool {
        self.expiry.map_or(true, |expiry| as_of <= expiry)
    }

    /// Days until expiry, negative once expired.
    #[must_use]
    pub fn days_left(&self, as_of: NaiveDate) -> Option<i64> {
        self.expiry.map(|expiry| (expiry - as_of).num_days())
    }

    /// Returns true if this waiver covers the finding, ignoring expiry.
    #[must_use]
    pub fn covers(&self, finding: &Finding) -> bool {
        self.rule_id == finding.rule_id && self.matcher.matches(finding)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WaiverDto {
    rule: String,
    #[serde(default)]
    fingerprint: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    justification: String,
    #[serde(default)]
    expiry: Option<String>,
    #[serde(default)]
    created_by: Option<String>,
}

/// Result of loading a waiver source: the valid entries plus the rejects.
#[derive(Debug, Clone, Default)]
pub struct WaiverLoad {
    /// The valid waivers.
    pub store: WaiverStore,
    /// One entry per rejected record.
    pub errors: Vec<WaiverLoadError>,
}

/// Read-only snapshot of the waivers of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaiverStore {
    waivers: Vec<Waiver>,
}

impl WaiverStore {
    /// Creates a store from already-validated waivers.
    #[must_use]
    pub fn from_waivers(waivers: Vec<Waiver>) -> Self {
        Self { waivers }
    }

    /// Parses a TOML waiver document.
    #[must_use]
    pub fn load(content: &str) -> WaiverLoad {
        let table: toml::Table = match toml::from_str(content) {
            Ok(table) => table,
            Err(e) => {
                return WaiverLoad {
                    store: Self::default(),
                    errors: vec![WaiverLoadError::Syntax {
                        message: e.message().to_string(),
                    }],
                }
            }
        };

        let entries = match table.get("waiver") {
            None => Vec::new(),
            Some(toml::Value::Array(entries)) => entries.clone(),
            Some(_) => {
                return WaiverLoad {
                    store: Self::default(),
                    errors: vec![WaiverLoadError::Syntax {
                        message: "`waiver` must be an array of tables ([[waiver]])".to_string(),
                    }],
                }
            }
        };

        let mut waivers = Vec::with_capacity(entries.len());
        let mut errors = Vec::new();
        for (index, entry) in entries.into_iter().enumerate() {
            match convert(index, entry) {
                Ok(waiver) => waivers.push(waiver),
                Err(e) => {
                    warn!("skipping waiver: {e}");
                    errors.push(e);
                }
            }
        }
        debug!("loaded {} waivers ({} rejected)", waivers.len(), errors.len());

        WaiverLoad {
            store: Self { waivers },
            errors,
        }
    }

    /// Reads and parses a waiver file. An unreadable file is one load error.
    #[must_use]
    pub fn load_file(path: &Path) -> WaiverLoad {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::load(&content),
            Err(e) => WaiverLoad {
                store: Self::default(),
                errors: vec![WaiverLoadError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }],
            },
        }
    }

    /// All loaded waivers, active or not, in file order.
    #[must_use]
    pub fn waivers(&self) -> &[Waiver] {
        &self.waivers
    }

    /// Number of loaded waivers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waivers.len()
    }

    /// Returns true if no waiver is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waivers.is_empty()
    }

    /// Returns the index of the first active waiver covering the finding.
    #[must_use]
    pub fn suppressing(&self, finding: &Finding, as_of: NaiveDate) -> Option<usize> {
        self.waivers
            .iter()
            .position(|w| w.is_active(as_of) && w.covers(finding))
    }

    /// Returns true if an active waiver covers the finding.
    #[must_use]
    pub fn suppresses(&self, finding: &Finding, as_of: NaiveDate) -> bool {
        self.suppressing(finding, as_of).is_some()
    }

    /// Logs every expired waiver once.
    pub fn log_expired(&self, as_of: NaiveDate) {
        for waiver in self.waivers.iter().filter(|w| !w.is_active(as_of)) {
            warn!(
                rule = %waiver.rule_id,
                matcher = %waiver.matcher,
                "waiver expired on {}, it no longer suppresses anything",
                waiver.expiry.map(|d| d.to_string()).unwrap_or_default()
            );
        }
    }
}

fn convert(index: usize, value: toml::Value) -> Result<Waiver, WaiverLoadError> {
    let dto: WaiverDto = value
        .try_into()
        .map_err(|e: toml::de::Error| WaiverLoadError::Malformed {
            index,
            message: e.message().to_string(),
        })?;

    let rule = dto.rule.trim().to_string();
    if !is_valid_rule_id(&rule) {
        return Err(WaiverLoadError::InvalidRuleId { index, rule });
    }
    if dto.justification.trim().is_empty() {
        return Err(WaiverLoadError::MissingJustification { index, rule });
    }

    let matcher = match (dto.fingerprint, dto.path) {
        (Some(fp), None) if !fp.trim().is_empty() => {
            WaiverMatcher::Fingerprint(fp.trim().to_ascii_lowercase())
        }
        (None, Some(path)) => {
            let glob = GlobPattern::new(path.trim()).map_err(|source| {
                WaiverLoadError::InvalidPath {
                    index,
                    rule: rule.clone(),
                    source,
                }
            })?;
            WaiverMatcher::Path(glob)
        }
        _ => return Err(WaiverLoadError::AmbiguousMatcher { index, rule }),
    };

    let expiry = match dto.expiry {
        None => None,
        Some(value) => match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => return Err(WaiverLoadError::InvalidExpiry { index, rule, value }),
        },
    };

    Ok(Waiver {
        rule_id: rule,
        matcher,
        justification: dto.justification.trim().to_string(),
        expiry,
        created_by: dto.created_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::NodeSite;
    use crate::types::Severity;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn finding(rule: &str, path: &str) -> Finding {
        Finding::at(
            rule,
            Severity::Must,
            Path::new(path),
            &NodeSite::new(4, 9, "Root/Script/Prop[label]"),
            "prop `label` has no type",
        )
    }

    #[test]
    fn loads_valid_entries_and_reports_bad_ones() {
        let toml = r#"
[[waiver]]
rule = "SG-021"
fingerprint = "0123456789abcdef"
justification = "legacy widget"
expiry = "2026-12-31"
created_by = "alice"

[[waiver]]
rule = "SG-060"
justification = "no matcher"

[[waiver]]
rule = "SG-050"
path = "src/routes/admin/**"
justification = "admin pages call APIs directly"

[[waiver]]
rule = "SG-040"
path = "src/**"
justification = "bad date"
expiry = "31/12/2026"
"#;
        let load = WaiverStore::load(toml);
        assert_eq!(load.store.len(), 2);
        assert_eq!(load.errors.len(), 2);
        assert!(matches!(
            load.errors[0],
            WaiverLoadError::AmbiguousMatcher { index: 1, .. }
        ));
        assert!(matches!(
            load.errors[1],
            WaiverLoadError::InvalidExpiry { index: 3, .. }
        ));
        assert_eq!(load.store.waivers()[0].expiry, Some(date("2026-12-31")));
        assert_eq!(load.store.waivers()[1].expiry, None);
    }

    #[test]
    fn both_matchers_is_ambiguous() {
        let toml = r#"
[[waiver]]
rule = "SG-021"
fingerprint = "0123456789abcdef"
path = "src/**"
justification = "x"
"#;
        let load = WaiverStore::load(toml);
        assert!(load.store.is_empty());
        assert!(matches!(
            load.errors[0],
            WaiverLoadError::AmbiguousMatcher { .. }
        ));
    }

    #[test]
    fn unknown_fields_and_missing_justification_are_rejected() {
        let toml = r#"
[[waiver]]
rule = "SG-021"
path = "src/**"
justificaton = "typo"

[[waiver]]
rule = "SG-021"
path = "src/**"
justification = "   "
"#;
        let load = WaiverStore::load(toml);
        assert!(load.store.is_empty());
        assert!(matches!(load.errors[0], WaiverLoadError::Malformed { index: 0, .. }));
        assert!(matches!(
            load.errors[1],
            WaiverLoadError::MissingJustification { index: 1, .. }
        ));
    }

    #[test]
    fn invalid_toml_is_one_error() {
        let load = WaiverStore::load("[[waiver]\nrule = ");
        assert!(load.store.is_empty());
        assert!(matches!(load.errors[0], WaiverLoadError::Syntax { .. }));
    }

    #[test]
    fn empty_document_has_no_waivers() {
        let load = WaiverStore::load("");
        assert!(load.store.is_empty());
        assert!(load.errors.is_empty());
    }

    #[test]
    fn expiry_day_is_still_active() {
        let f = finding("SG-021", "src/lib/Button.svelte");
        let store = WaiverStore::from_waivers(vec![Waiver {
            rule_id: "SG-021".into(),
            matcher: WaiverMatcher::Fingerprint(f.fingerprint.clone()),
            justification: "j".into(),
            expiry: Some(date("2026-03-01")),
            created_by: None,
        }]);
        assert!(store.suppresses(&f, date("2026-02-28")));
        assert!(store.suppresses(&f, date("2026-03-01")));
        assert!(!store.suppresses(&f, date("2026-03-02")));
    }

    #[test]
    fn rule_id_must_match() {
        let f = finding("SG-021", "src/lib/Button.svelte");
        let store = WaiverStore::from_waivers(vec![Waiver {
            rule_id: "SG-022".into(),
            matcher: WaiverMatcher::Path(GlobPattern::new("src/**").unwrap()),
            justification: "j".into(),
            expiry: None,
            created_by: None,
        }]);
        assert!(!store.suppresses(&f, date("2026-01-01")));
    }

    #[test]
    fn path_waiver_covers_matching_files() {
        let store = WaiverStore::from_waivers(vec![Waiver {
            rule_id: "SG-021".into(),
            matcher: WaiverMatcher::Path(GlobPattern::new("src/lib/legacy/**").unwrap()),
            justification: "j".into(),
            expiry: None,
            created_by: None,
        }]);
        let as_of = date("2030-01-01");
        assert!(store.suppresses(&finding("SG-021", "src/lib/legacy/Old.svelte"), as_of));
        assert!(!store.suppresses(&finding("SG-021", "src/lib/New.svelte"), as_of));
    }

    #[test]
    fn days_left_counts_calendar_days() {
        let waiver = Waiver {
            rule_id: "SG-021".into(),
            matcher: WaiverMatcher::Fingerprint("x".into()),
            justification: "j".into(),
            expiry: Some(date("2026-01-15")),
            created_by: None,
        };
        assert_eq!(waiver.days_left(date("2026-01-01")), Some(14));
        assert_eq!(waiver.days_left(date("2026-01-16")), Some(-1));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let load = WaiverStore::load_file(Path::new("/nonexistent/guidelint-waivers.toml"));
        assert!(load.store.is_empty());
        assert!(matches!(load.errors[0], WaiverLoadError::Io { .. }));
    }
}
