//! Reactivity and dependency-boundary rules (SG-04x, SG-05x).

use guidelint_core::{
    Check, FileKind, Rule, RuleConfig, RuleLoadError, ScopeSelector, ScopingCheck, Severity,
};

use crate::options;

const API_IMPORTS: &[&str] = &["$lib/apis", "$lib/apis/**"];

pub(crate) fn no_legacy_reactive(_: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-040",
        Severity::Must,
        ScopeSelector::kinds([FileKind::Component, FileKind::Route]),
        "Use `$derived`/`$effect` instead of legacy `$:` statements",
        Check::Scoping(ScopingCheck::NoLegacyReactive),
    ))
}

pub(crate) fn no_manual_subscribe(_: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-041",
        Severity::Should,
        ScopeSelector::kinds([FileKind::Component, FileKind::Route]),
        "Read stores with `$store` instead of `.subscribe()`",
        Check::Scoping(ScopingCheck::NoManualSubscribe),
    ))
}

/// SG-050: components and routes go through stores, never `$lib/apis`.
///
/// Options: `patterns` (module globs), `allow_type_only` (default true).
pub(crate) fn no_direct_api_imports(config: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    let id = "SG-050";
    Ok(Rule::new(
        id,
        Severity::Must,
        ScopeSelector::kinds([FileKind::Component, FileKind::Route]),
        "Components and routes do not import `$lib/apis` directly",
        Check::Scoping(ScopingCheck::ForbiddenImport {
            patterns: options::globs(id, config, "patterns", API_IMPORTS)?,
            allow_type_only: options::flag(config, "allow_type_only", true),
        }),
    ))
}

pub(crate) fn stores_skip_components(_: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-051",
        Severity::Should,
        ScopeSelector::kinds([FileKind::Store]),
        "Stores do not import `.svelte` components",
        Check::Scoping(ScopingCheck::NoComponentImports),
    ))
}
