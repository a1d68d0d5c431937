//! Structural accessibility proxies (SG-06x).

use guidelint_core::{
    A11yCheck, Check, FileKind, Rule, RuleConfig, RuleLoadError, ScopeSelector, Severity,
};

use crate::options;

const INTERACTIVE_TAGS: &[&str] = &[
    "a", "button", "details", "input", "label", "option", "select", "summary", "textarea",
];

pub(crate) fn img_alt(_: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-060",
        Severity::Must,
        ScopeSelector::kinds([FileKind::Component, FileKind::Route]),
        "`<img>` elements carry `alt`",
        Check::A11yProxy(A11yCheck::ImgAlt),
    ))
}

/// SG-061. Option `interactive` replaces the list of natively interactive tags.
pub(crate) fn click_needs_keyboard(config: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    Ok(Rule::new(
        "SG-061",
        Severity::Should,
        ScopeSelector::kinds([FileKind::Component, FileKind::Route]),
        "Click handlers on non-interactive elements come with a keyboard handler and a role",
        Check::A11yProxy(A11yCheck::ClickNeedsKeyboard {
            interactive: options::strings(config, "interactive", INTERACTIVE_TAGS),
        }),
    ))
}
