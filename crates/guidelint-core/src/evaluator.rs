//! Rule evaluator: applies rule predicates to one file's IR.

use serde::{Deserialize, Serialize};

use crate::ir::{
    ExportKind, IdentifierRole, NodeSite, ReactiveKind, SourceFileIR, StoreAccess,
};
use crate::registry::{RuleModel, PARSE_FAILURE_RULE_ID};
use crate::rule::{A11yCheck, Check, LayoutCheck, NamingCheck, Rule, ScopingCheck, TypingCheck};
use crate::types::{Finding, Severity};

const CLICK_HANDLERS: &[&str] = &["on:click", "onclick"];
const KEY_HANDLERS: &[&str] = &[
    "on:keydown",
    "onkeydown",
    "on:keyup",
    "onkeyup",
    "on:keypress",
    "onkeypress",
];

/// Findings of every applicable rule for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEvaluation {
    /// Raw findings, grouped by rule in model order.
    pub findings: Vec<Finding>,
    /// Number of structural rules not evaluated because the file failed to parse.
    pub skipped_rules: usize,
}

/// Evaluates every rule of the model against one file.
///
/// A failed IR only yields the parse-failure finding; every rule whose scope
/// covers the file is counted as skipped.
#[must_use]
pub fn evaluate_file(model: &RuleModel, ir: &SourceFileIR) -> FileEvaluation {
    if let Some(reason) = ir.status.failure() {
        let site = NodeSite::new(1, 1, "Root");
        return FileEvaluation {
            findings: vec![Finding::at(
                PARSE_FAILURE_RULE_ID,
                Severity::Must,
                &ir.path,
                &site,
                format!("file unreadable: {reason}"),
            )],
            skipped_rules: model
                .all_rules()
                .iter()
                .filter(|rule| rule.scope.matches(ir))
                .count(),
        };
    }

    let findings = model
        .all_rules()
        .iter()
        .flat_map(|rule| evaluate(rule, ir))
        .collect();
    FileEvaluation {
        findings,
        skipped_rules: 0,
    }
}

/// Evaluates a single rule. Out-of-scope files and failed IR yield nothing.
///
/// Findings are ordered by line, then column.
#[must_use]
pub fn evaluate(rule: &Rule, ir: &SourceFileIR) -> Vec<Finding> {
    if ir.is_failed() || !rule.scope.matches(ir) {
        return Vec::new();
    }

    let mut hits = Hits::new(rule, ir);
    match &rule.check {
        Check::Naming(check) => naming(check, ir, &mut hits),
        Check::Typing(check) => typing(check, ir, &mut hits),
        Check::Scoping(check) => scoping(check, ir, &mut hits),
        Check::A11yProxy(check) => a11y(check, ir, &mut hits),
        Check::Layout(check) => layout(check, ir, &mut hits),
    }
    hits.into_sorted()
}

/// Collects findings for one (rule, file) pair.
struct Hits<'a> {
    rule: &'a Rule,
    ir: &'a SourceFileIR,
    findings: Vec<Finding>,
}

impl<'a> Hits<'a> {
    fn new(rule: &'a Rule, ir: &'a SourceFileIR) -> Self {
        Self {
            rule,
            ir,
            findings: Vec::new(),
        }
    }

    fn push(&mut self, site: &NodeSite, message: impl Into<String>) {
        self.findings.push(Finding::at(
            &self.rule.id,
            self.rule.severity,
            &self.ir.path,
            site,
            message,
        ));
    }

    /// File-level finding anchored at the tree root.
    fn push_file(&mut self, message: impl Into<String>) {
        self.push(&NodeSite::new(1, 1, "Root"), message);
    }

    fn into_sorted(mut self) -> Vec<Finding> {
        self.findings.sort_by_key(|f| (f.line, f.column));
        self.findings
    }
}

fn naming(check: &NamingCheck, ir: &SourceFileIR, hits: &mut Hits<'_>) {
    match check {
        NamingCheck::PascalCaseFileStem => {
            let name = ir.base_name();
            if !is_pascal_case(name) {
                hits.push_file(format!("file name `{name}` is not PascalCase"));
            }
        }
        NamingCheck::FileStemSuffix { suffixes } => {
            let stem = ir.stem();
            if !suffixes.iter().any(|s| stem.ends_with(s.as_str())) {
                hits.push_file(format!(
                    "file name `{stem}` should end with {}",
                    quoted_list(suffixes)
                ));
            }
        }
        NamingCheck::IdentifierCase => {
            for ident in &ir.identifiers {
                let ok = match ident.role {
                    IdentifierRole::Type => is_pascal_case(&ident.name),
                    IdentifierRole::Constant => {
                        is_camel_case(&ident.name)
                            || is_screaming_snake_case(&ident.name)
                            || is_pascal_case(&ident.name)
                    }
                    IdentifierRole::Function => {
                        is_camel_case(&ident.name) || is_pascal_case(&ident.name)
                    }
                    IdentifierRole::Variable | IdentifierRole::Parameter => {
                        is_camel_case(&ident.name)
                    }
                };
                if !ok {
                    let expected = match ident.role {
                        IdentifierRole::Type => "PascalCase",
                        IdentifierRole::Constant => {
                            "camelCase, PascalCase or SCREAMING_SNAKE_CASE"
                        }
                        IdentifierRole::Function => "camelCase or PascalCase",
                        IdentifierRole::Variable | IdentifierRole::Parameter => "camelCase",
                    };
                    hits.push(
                        &ident.site,
                        format!("identifier `{}` should be {expected}", ident.name),
                    );
                }
            }
        }
        NamingCheck::CamelCaseEvents => {
            for event in &ir.events {
                if !is_camel_case(&event.name) {
                    hits.push(
                        &event.site,
                        format!("event `{}` should be camelCase", event.name),
                    );
                }
            }
        }
    }
}

fn typing(check: &TypingCheck, ir: &SourceFileIR, hits: &mut Hits<'_>) {
    match check {
        TypingCheck::TypedProps => {
            for prop in ir.props.iter().filter(|p| p.type_annotation.is_none()) {
                hits.push(&prop.site, format!("prop `{}` has no type", prop.name));
            }
        }
        TypingCheck::BindableDefaults => {
            for prop in ir.props.iter().filter(|p| p.bindable && !p.has_default) {
                hits.push(
                    &prop.site,
                    format!("bindable prop `{}` has no default value", prop.name),
                );
            }
        }
        TypingCheck::NoAny => {
            for prop in &ir.props {
                if prop.type_annotation.as_deref().is_some_and(mentions_any) {
                    hits.push(&prop.site, format!("prop `{}` is typed `any`", prop.name));
                }
            }
            for export in &ir.exports {
                if export.type_annotations.iter().any(|t| mentions_any(t)) {
                    hits.push(
                        &export.site,
                        format!("export `{}` uses `any` in its signature", export.name),
                    );
                }
            }
        }
        TypingCheck::TypedEvents => {
            for event in ir.events.iter().filter(|e| !e.typed) {
                hits.push(
                    &event.site,
                    format!("event `{}` has no payload type", event.name),
                );
            }
        }
        TypingCheck::TypedFunctionExports => {
            for export in ir
                .exports
                .iter()
                .filter(|e| e.kind == ExportKind::Function)
            {
                let missing = match (export.params_typed, export.return_typed) {
                    (true, true) => continue,
                    (false, true) => "parameter types",
                    (true, false) => "a return type",
                    (false, false) => "parameter and return types",
                };
                hits.push(
                    &export.site,
                    format!("exported function `{}` lacks {missing}", export.name),
                );
            }
        }
    }
}

fn scoping(check: &ScopingCheck, ir: &SourceFileIR, hits: &mut Hits<'_>) {
    match check {
        ScopingCheck::NoLegacyReactive => {
            for decl in ir.reactive.iter().filter(|r| r.kind == ReactiveKind::Legacy) {
                hits.push(
                    &decl.site,
                    "legacy `$:` statement, use `$derived` or `$effect`",
                );
            }
        }
        ScopingCheck::NoManualSubscribe => {
            for usage in ir
                .stores
                .iter()
                .filter(|s| s.access == StoreAccess::Subscribe)
            {
                hits.push(
                    &usage.site,
                    format!(
                        "manual `{}.subscribe()`, use `${}` instead",
                        usage.store, usage.store
                    ),
                );
            }
        }
        ScopingCheck::ForbiddenImport {
            patterns,
            allow_type_only,
        } => {
            for import in &ir.imports {
                if *allow_type_only && import.type_only {
                    continue;
                }
                if let Some(pattern) = patterns.iter().find(|p| p.matches_str(&import.source)) {
                    hits.push(
                        &import.site,
                        format!(
                            "import of `{}` is not allowed here (matches `{pattern}`)",
                            import.source
                        ),
                    );
                }
            }
        }
        ScopingCheck::NoComponentImports => {
            for import in ir.imports.iter().filter(|i| i.source.ends_with(".svelte")) {
                hits.push(
                    &import.site,
                    format!("component `{}` imported from a store", import.source),
                );
            }
        }
    }
}

fn a11y(check: &A11yCheck, ir: &SourceFileIR, hits: &mut Hits<'_>) {
    match check {
        A11yCheck::ImgAlt => {
            for img in ir
                .elements
                .iter()
                .filter(|e| e.tag == "img" && !e.has_attribute("alt"))
            {
                hits.push(&img.site, "<img> without `alt`");
            }
        }
        A11yCheck::ClickNeedsKeyboard { interactive } => {
            for el in &ir.elements {
                if interactive.contains(&el.tag)
                    || !CLICK_HANDLERS.iter().any(|h| el.has_attribute(h))
                {
                    continue;
                }
                let has_key = KEY_HANDLERS.iter().any(|h| el.has_attribute(h));
                let has_role = el.has_attribute("role");
                let missing = match (has_key, has_role) {
                    (true, true) => continue,
                    (false, true) => "a keyboard handler",
                    (true, false) => "a `role`",
                    (false, false) => "a keyboard handler and a `role`",
                };
                hits.push(
                    &el.site,
                    format!("<{}> has a click handler but no {missing}", el.tag),
                );
            }
        }
    }
}

fn layout(check: &LayoutCheck, ir: &SourceFileIR, hits: &mut Hits<'_>) {
    match check {
        LayoutCheck::UnderDirectory { dir } => {
            if !dir.matches(&ir.path) {
                hits.push_file(format!("file should live under `{dir}`"));
            }
        }
        LayoutCheck::MaxProps { max } => {
            if let Some(first_extra) = ir.props.get(*max) {
                hits.push(
                    &first_extra.site,
                    format!("{} props declared, at most {max} allowed", ir.props.len()),
                );
            }
        }
        LayoutCheck::MaxEffects { max } => {
            let effects: Vec<_> = ir
                .reactive
                .iter()
                .filter(|r| r.kind == ReactiveKind::Effect)
                .collect();
            if let Some(first_extra) = effects.get(*max) {
                hits.push(
                    &first_extra.site,
                    format!("{} `$effect`s declared, at most {max} allowed", effects.len()),
                );
            }
        }
    }
}

fn strip_sigils(name: &str) -> &str {
    name.trim_start_matches(['_', '$'])
}

fn is_camel_case(name: &str) -> bool {
    let name = strip_sigils(name);
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

fn is_pascal_case(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

fn is_screaming_snake_case(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// True if a type expression mentions the bare `any` type.
fn mentions_any(type_text: &str) -> bool {
    type_text
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .any(|token| token == "any")
}

fn quoted_list(items: &[String]) -> String {
    items
        .iter()
        .map(|s| format!("`{s}`"))
        .collect::<Vec<_>>()
        .join(" or ")
}
