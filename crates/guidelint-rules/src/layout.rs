//! File placement and size rules (SG-070, SG-08x).

use guidelint_core::{
    Check, FileKind, LayoutCheck, Rule, RuleConfig, RuleLoadError, ScopeSelector, Severity,
};

use crate::options;

/// Default for SG-080 `max`.
pub const DEFAULT_MAX_PROPS: usize = 10;
/// Default for SG-081 `max`.
pub const DEFAULT_MAX_EFFECTS: usize = 3;

/// SG-070. Option `dir` moves the store directory.
pub(crate) fn store_location(config: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    let id = "SG-070";
    let dir = options::strings(config, "dir", &["src/lib/stores/**"]);
    let dir = options::glob(id, dir.first().map_or("src/lib/stores/**", String::as_str))?;
    Ok(Rule::new(
        id,
        Severity::Should,
        ScopeSelector::kinds([FileKind::Store]),
        "Stores live under `src/lib/stores/`",
        Check::Layout(LayoutCheck::UnderDirectory { dir }),
    ))
}

pub(crate) fn max_props(config: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    let id = "SG-080";
    let max = options::limit(id, config, "max", DEFAULT_MAX_PROPS)?;
    Ok(Rule::new(
        id,
        Severity::May,
        ScopeSelector::kinds([FileKind::Component]),
        format!("Components declare at most {max} props"),
        Check::Layout(LayoutCheck::MaxProps { max }),
    ))
}

pub(crate) fn max_effects(config: Option<&RuleConfig>) -> Result<Rule, RuleLoadError> {
    let id = "SG-081";
    let max = options::limit(id, config, "max", DEFAULT_MAX_EFFECTS)?;
    Ok(Rule::new(
        id,
        Severity::May,
        ScopeSelector::kinds([FileKind::Component, FileKind::Route]),
        format!("At most {max} `$effect` declarations per component"),
        Check::Layout(LayoutCheck::MaxEffects { max }),
    ))
}
