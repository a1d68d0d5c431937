//! Naming rules (SG-01x).

use guidelint_core::{
    Check, FileKind, NamingCheck, Rule, RuleConfig, RuleLoadError, ScopeSelector, Severity,
};

use crate::options;

/// SG-010: component files are PascalCase.
pub(crate) fn component_file_names(_: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-010",
        Severity::Must,
        ScopeSelector::kinds([FileKind::Component]),
        "Component file names are PascalCase",
        Check::Naming(NamingCheck::PascalCaseFileStem),
    ))
}

/// SG-011: store files end with `Store` or `.store`.
///
/// Option `suffixes` replaces the accepted suffixes.
pub(crate) fn store_file_names(config: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-011",
        Severity::Should,
        ScopeSelector::kinds([FileKind::Store]),
        "Store file names end with `Store` or `.store`",
        Check::Naming(NamingCheck::FileStemSuffix {
            suffixes: options::strings(config, "suffixes", &["Store", ".store"]),
        }),
    ))
}

pub(crate) fn identifier_case(_: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-012",
        Severity::Should,
        ScopeSelector::kinds([
            FileKind::Component,
            FileKind::Store,
            FileKind::ApiModule,
            FileKind::Module,
        ]),
        "Identifiers are camelCase, types PascalCase, constants may be SCREAMING_SNAKE_CASE",
        Check::Naming(NamingCheck::IdentifierCase),
    ))
}

pub(crate) fn event_names(_: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-013",
        Severity::Should,
        ScopeSelector::kinds([FileKind::Component]),
        "Event names are camelCase",
        Check::Naming(NamingCheck::CamelCaseEvents),
    ))
}
