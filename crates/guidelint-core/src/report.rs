//! The run report: one aggregated, deterministically ordered model with
//! JSON, text and compact renderings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::types::{Finding, Severity};

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// No violations.
    Clean,
    /// Only SHOULD or MAY violations.
    Warn,
    /// At least one MUST violation.
    Fail,
}

impl Status {
    /// Status implied by the strictest violation severity.
    #[must_use]
    pub fn from_max_severity(max: Option<Severity>) -> Self {
        match max {
            None => Self::Clean,
            Some(Severity::Must) => Self::Fail,
            Some(Severity::Should | Severity::May) => Self::Warn,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Clean => "clean",
            Self::Warn => "warn",
            Self::Fail => "fail",
        })
    }
}

/// A surviving violation as reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportViolation {
    /// Rule id.
    pub rule_id: String,
    /// Severity.
    pub severity: Severity,
    /// Line (1-indexed).
    pub line: usize,
    /// Column (1-indexed).
    pub column: usize,
    /// Location fingerprint, usable in a waiver.
    pub fingerprint: String,
    /// Message.
    pub message: String,
}

impl From<Finding> for ReportViolation {
    fn from(f: Finding) -> Self {
        Self {
            rule_id: f.rule_id,
            severity: f.severity,
            line: f.line,
            column: f.column,
            fingerprint: f.fingerprint,
            message: f.message,
        }
    }
}

/// Violations of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    /// File path, `/` separated.
    pub path: String,
    /// Violations sorted by rule id, line, column and fingerprint.
    pub violations: Vec<ReportViolation>,
    /// Why the file could not be analyzed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    /// Structural rules skipped because of the parse error.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub skipped_rules: usize,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// A waiver that suppressed something this run and expires soon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringWaiver {
    /// Waived rule.
    pub rule_id: String,
    /// `fingerprint:<hex>` or `path:<glob>`.
    pub matcher: String,
    /// Last active day.
    pub expiry: NaiveDate,
    /// Days from the evaluation date to the expiry.
    pub days_left: i64,
}

/// Kind of non-fatal problem recorded in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    /// A file could not be loaded.
    LoadError,
    /// A waiver record was rejected.
    WaiverLoadError,
    /// The persistent cache was unreadable; the run started cold.
    CacheCorruption,
    /// The run was cancelled before every file was analyzed.
    CancellationRequested,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::LoadError => "load error",
            Self::WaiverLoadError => "waiver error",
            Self::CacheCorruption => "cache corruption",
            Self::CancellationRequested => "cancelled",
        })
    }
}

/// A non-fatal problem of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunIssue {
    /// What went wrong.
    pub kind: IssueKind,
    /// Affected file, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Details.
    pub message: String,
}

impl RunIssue {
    /// Creates an issue.
    #[must_use]
    pub fn new(kind: IssueKind, path: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }
}

/// Counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Files analyzed (cache hits included).
    pub files_checked: usize,
    /// MUST violations.
    pub must: usize,
    /// SHOULD violations.
    pub should: usize,
    /// MAY violations.
    pub may: usize,
    /// Findings suppressed by waivers.
    pub suppressed: usize,
}

/// The report of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Overall status.
    pub status: Status,
    /// True if the run was cancelled before every file was analyzed.
    pub incomplete: bool,
    /// Files with violations or a parse error, in path order.
    pub files: Vec<FileReport>,
    /// Waivers that suppressed something and expire soon.
    pub expiring_waivers: Vec<ExpiringWaiver>,
    /// Non-fatal problems.
    pub errors: Vec<RunIssue>,
    /// Counters.
    pub summary: Summary,
}

/// Inputs of [`Report::assemble`].
#[derive(Debug, Default)]
pub struct ReportParts {
    /// Per-file results; files without violations or errors are dropped.
    pub files: Vec<FileReport>,
    /// Expiring-soon advisories.
    pub expiring_waivers: Vec<ExpiringWaiver>,
    /// Non-fatal problems.
    pub errors: Vec<RunIssue>,
    /// Files analyzed.
    pub files_checked: usize,
    /// Findings suppressed by waivers.
    pub suppressed: usize,
    /// Whether the run was cut short.
    pub incomplete: bool,
}

impl Report {
    /// Sorts every list, counts violations and derives the status.
    ///
    /// The result does not depend on the order of the inputs.
    #[must_use]
    pub fn assemble(parts: ReportParts) -> Self {
        let mut files: Vec<FileReport> = parts
            .files
            .into_iter()
            .filter(|f| !f.violations.is_empty() || f.parse_error.is_some())
            .collect();
        for file in &mut files {
            file.violations.sort_by(|a, b| {
                a.rule_id
                    .cmp(&b.rule_id)
                    .then(a.line.cmp(&b.line))
                    .then(a.column.cmp(&b.column))
                    .then_with(|| a.fingerprint.cmp(&b.fingerprint))
            });
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let mut expiring_waivers = parts.expiring_waivers;
        expiring_waivers.sort_by(|a, b| {
            a.expiry
                .cmp(&b.expiry)
                .then_with(|| a.rule_id.cmp(&b.rule_id))
                .then_with(|| a.matcher.cmp(&b.matcher))
        });
        expiring_waivers.dedup();

        let mut errors = parts.errors;
        errors.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.message.cmp(&b.message))
        });

        let mut summary = Summary {
            files_checked: parts.files_checked,
            suppressed: parts.suppressed,
            ..Summary::default()
        };
        let mut max = None;
        for v in files.iter().flat_map(|f| &f.violations) {
            match v.severity {
                Severity::Must => summary.must += 1,
                Severity::Should => summary.should += 1,
                Severity::May => summary.may += 1,
            }
            max = max.max(Some(v.severity));
        }

        Self {
            status: Status::from_max_severity(max),
            incomplete: parts.incomplete,
            files,
            expiring_waivers,
            errors,
            summary,
        }
    }

    /// Total number of violations.
    #[must_use]
    pub fn violation_count(&self) -> usize {
        self.summary.must + self.summary.should + self.summary.may
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Only fails if serialization itself fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// One line per violation: `path:line:col: SEVERITY [ID] message`.
    #[must_use]
    pub fn render_compact(&self) -> String {
        let mut out = String::new();
        for file in &self.files {
            for v in &file.violations {
                let _ = writeln!(
                    out,
                    "{}:{}:{}: {} [{}] {}",
                    file.path, v.line, v.column, v.severity, v.rule_id, v.message
                );
            }
        }
        out
    }

    /// Human-readable summary, optionally with ANSI colors.
    #[must_use]
    pub fn render_text(&self, color: bool) -> String {
        let paint = |code: &str, text: &str| {
            if color {
                format!("\x1b[{code}m{text}\x1b[0m")
            } else {
                text.to_string()
            }
        };

        let mut out = String::new();
        for file in &self.files {
            if let Some(reason) = &file.parse_error {
                let _ = writeln!(
                    out,
                    "{}: {} ({} rule(s) skipped)",
                    file.path,
                    paint("31", &format!("could not be analyzed: {reason}")),
                    file.skipped_rules
                );
            }
            for v in &file.violations {
                let sev = match v.severity {
                    Severity::Must => paint("31", "MUST"),
                    Severity::Should => paint("33", "SHOULD"),
                    Severity::May => paint("34", "MAY"),
                };
                let _ = writeln!(out, "{} at {}:{}:{}", v.rule_id, file.path, v.line, v.column);
                let _ = writeln!(out, "  {sev}: {}", v.message);
                let _ = writeln!(out, "  = fingerprint: {}", v.fingerprint);
                out.push('\n');
            }
        }

        if !self.expiring_waivers.is_empty() {
            let _ = writeln!(out, "{}", paint("33", "Waivers expiring soon:"));
            for w in &self.expiring_waivers {
                let _ = writeln!(
                    out,
                    "  {} {} expires {} ({} day(s) left)",
                    w.rule_id, w.matcher, w.expiry, w.days_left
                );
            }
            out.push('\n');
        }

        if !self.errors.is_empty() {
            let _ = writeln!(out, "{}", paint("31", "Problems:"));
            for e in &self.errors {
                match &e.path {
                    Some(path) => {
                        let _ = writeln!(out, "  {}: {path}: {}", e.kind, e.message);
                    }
                    None => {
                        let _ = writeln!(out, "  {}: {}", e.kind, e.message);
                    }
                }
            }
            out.push('\n');
        }

        let status_color = match self.status {
            Status::Fail => "31",
            Status::Warn => "33",
            Status::Clean => "32",
        };
        let s = &self.summary;
        let _ = writeln!(
            out,
            "{}",
            paint(
                status_color,
                &format!(
                    "{}: {} MUST, {} SHOULD, {} MAY in {} file(s), {} suppressed{}",
                    self.status.to_string().to_uppercase(),
                    s.must,
                    s.should,
                    s.may,
                    s.files_checked,
                    s.suppressed,
                    if self.incomplete { " (incomplete)" } else { "" }
                )
            )
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(rule: &str, severity: Severity, line: usize) -> ReportViolation {
        ReportViolation {
            rule_id: rule.to_string(),
            severity,
            line,
            column: 1,
            fingerprint: format!("{rule}-{line}"),
            message: format!("{rule} message"),
        }
    }

    fn file(path: &str, violations: Vec<ReportViolation>) -> FileReport {
        FileReport {
            path: path.to_string(),
            violations,
            parse_error: None,
            skipped_rules: 0,
        }
    }

    fn report(files: Vec<FileReport>) -> Report {
        Report::assemble(ReportParts {
            files_checked: files.len(),
            files,
            ..ReportParts::default()
        })
    }

    #[test]
    fn status_follows_strictest_severity() {
        assert_eq!(report(vec![]).status, Status::Clean);
        assert_eq!(
            report(vec![file("a", vec![violation("SG-080", Severity::May, 1)])]).status,
            Status::Warn
        );
        assert_eq!(
            report(vec![file(
                "a",
                vec![
                    violation("SG-011", Severity::Should, 1),
                    violation("SG-021", Severity::Must, 2)
                ]
            )])
            .status,
            Status::Fail
        );
    }

    #[test]
    fn sorting_is_independent_of_input_order() {
        let a = file(
            "src/b.svelte",
            vec![
                violation("SG-060", Severity::Must, 3),
                violation("SG-021", Severity::Must, 9),
                violation("SG-021", Severity::Must, 2),
            ],
        );
        let b = file("src/a.svelte", vec![violation("SG-040", Severity::Must, 1)]);
        let clean = file("src/c.svelte", vec![]);

        let one = report(vec![a.clone(), b.clone(), clean.clone()]);
        let two = report(vec![clean, b, a]);
        assert_eq!(one, two);
        assert_eq!(one.files.len(), 2);
        assert_eq!(one.files[0].path, "src/a.svelte");
        let order: Vec<(String, usize)> = one.files[1]
            .violations
            .iter()
            .map(|v| (v.rule_id.clone(), v.line))
            .collect();
        assert_eq!(
            order,
            vec![
                ("SG-021".to_string(), 2),
                ("SG-021".to_string(), 9),
                ("SG-060".to_string(), 3)
            ]
        );
    }

    #[test]
    fn parse_errors_are_kept_even_without_violations() {
        let mut broken = file("src/Broken.svelte", vec![]);
        broken.parse_error = Some("unexpected EOF".into());
        broken.skipped_rules = 18;
        let r = report(vec![broken]);
        assert_eq!(r.files.len(), 1);
        let json = r.to_json().unwrap();
        assert!(json.contains("\"parseError\": \"unexpected EOF\""));
        assert!(json.contains("\"skippedRules\": 18"));
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let r = report(vec![file("a", vec![violation("SG-021", Severity::Must, 4)])]);
        let value: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        assert_eq!(value["status"], "fail");
        assert_eq!(value["files"][0]["violations"][0]["ruleId"], "SG-021");
        assert_eq!(value["summary"]["filesChecked"], 1);
        assert_eq!(value["expiringWaivers"], serde_json::json!([]));
        assert!(value["files"][0].get("parseError").is_none());
    }

    #[test]
    fn compact_rendering() {
        let r = report(vec![file(
            "src/lib/Button.svelte",
            vec![violation("SG-021", Severity::Must, 4)],
        )]);
        insta::assert_snapshot!(
            r.render_compact(),
            @"src/lib/Button.svelte:4:1: MUST [SG-021] SG-021 message"
        );
    }

    #[test]
    fn text_rendering_without_color() {
        let r = Report::assemble(ReportParts {
            files: vec![file("src/A.svelte", vec![violation("SG-080", Severity::May, 7)])],
            expiring_waivers: vec![ExpiringWaiver {
                rule_id: "SG-021".into(),
                matcher: "path:src/legacy/**".into(),
                expiry: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
                days_left: 3,
            }],
            errors: vec![RunIssue::new(
                IssueKind::LoadError,
                Some("src/gone.svelte".into()),
                "file not found",
            )],
            files_checked: 4,
            suppressed: 2,
            incomplete: false,
        });
        let text = r.render_text(false);
        assert!(!text.contains('\x1b'));
        assert!(text.contains("SG-080 at src/A.svelte:7:1"));
        assert!(text.contains("SG-021 path:src/legacy/** expires 2026-01-10 (3 day(s) left)"));
        assert!(text.contains("load error: src/gone.svelte: file not found"));
        assert!(text.ends_with("WARN: 0 MUST, 0 SHOULD, 1 MAY in 4 file(s), 2 suppressed\n"));
    }
}
