//! Typing rules (SG-02x, SG-030, SG-071).

use guidelint_core::{
    Check, FileKind, Rule, RuleConfig, RuleLoadError, ScopeSelector, Severity, TypingCheck,
};

/// SG-021: every prop has a type.
pub(crate) fn typed_props(_: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-021",
        Severity::Must,
        ScopeSelector::kinds([FileKind::Component, FileKind::Route]),
        "Props declare a type",
        Check::Typing(TypingCheck::TypedProps),
    ))
}

/// SG-022: `$bindable` props have a default.
pub(crate) fn bindable_defaults(_: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-022",
        Severity::Should,
        ScopeSelector::kinds([FileKind::Component]),
        "Bindable props declare a default value",
        Check::Typing(TypingCheck::BindableDefaults),
    ))
}

/// SG-023: no `any`.
pub(crate) fn no_any(_: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-023",
        Severity::Should,
        ScopeSelector::kinds([
            FileKind::Component,
            FileKind::Route,
            FileKind::Store,
            FileKind::ApiModule,
        ]),
        "No `any` in prop types or exported signatures",
        Check::Typing(TypingCheck::NoAny),
    ))
}

/// SG-030: dispatched events are typed.
pub(crate) fn typed_events(_: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-030",
        Severity::Must,
        ScopeSelector::kinds([FileKind::Component]),
        "Dispatched events declare a payload type",
        Check::Typing(TypingCheck::TypedEvents),
    ))
}

/// SG-071: API functions spell out request and response types.
pub(crate) fn typed_api_functions(_: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-071",
        Severity::Must,
        ScopeSelector::kinds([FileKind::ApiModule]),
        "Exported API functions have explicit request and response types",
        Check::Typing(TypingCheck::TypedFunctionExports),
    ))
}
