//! Report rendering for the `check` command.

use anyhow::Result;
use guidelint_core::Report;
use std::io::{IsTerminal, Write};

use crate::OutputFormat;

/// Writes the report to stdout in the requested format.
pub fn print(report: &Report, format: OutputFormat) -> Result<()> {
    let rendered = render(report, format, std::io::stdout().is_terminal())?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn render(report: &Report, format: OutputFormat, color: bool) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => report.render_text(color),
        OutputFormat::Json => {
            let mut json = report.to_json()?;
            json.push('\n');
            json
        }
        OutputFormat::Compact => report.render_compact(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidelint_core::{FileReport, ReportParts, ReportViolation, Severity, Status};

    fn report() -> Report {
        Report::assemble(ReportParts {
            files: vec![FileReport {
                path: "src/lib/Button.svelte".into(),
                violations: vec![ReportViolation {
                    rule_id: "SG-021".into(),
                    severity: Severity::Must,
                    line: 3,
                    column: 9,
                    fingerprint: "0123456789abcdef".into(),
                    message: "prop `label` has no type".into(),
                }],
                parse_error: None,
                skipped_rules: 0,
            }],
            files_checked: 2,
            ..ReportParts::default()
        })
    }

    #[test]
    fn json_is_one_document() {
        let out = render(&report(), OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["status"], "fail");
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn compact_has_one_line_per_violation() {
        let out = render(&report(), OutputFormat::Compact, true).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn text_is_colored_only_on_request() {
        assert_eq!(report().status, Status::Fail);
        assert!(!render(&report(), OutputFormat::Text, false).unwrap().contains('\x1b'));
        assert!(render(&report(), OutputFormat::Text, true).unwrap().contains('\x1b'));
    }
}
