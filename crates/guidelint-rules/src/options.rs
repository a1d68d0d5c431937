//! Typed access to `[rules.SG-xxx]` options with validation.

use guidelint_core::{GlobPattern, RuleConfig, RuleLoadError};

/// Reads a positive integer option, falling back to `default` when unset.
pub(crate) fn limit(
    rule: &str,
    config: Option<&RuleConfig>,
    key: &str,
    default: usize,
) -> Result<usize, RuleLoadError> {
    let Some(config) = config.filter(|c| c.has_option(key)) else {
        return Ok(default);
    };
    let invalid = |reason: &str| RuleLoadError::InvalidOption {
        rule: rule.to_string(),
        option: key.to_string(),
        reason: reason.to_string(),
    };
    let value = config
        .get_int(key)
        .ok_or_else(|| invalid("expected an integer"))?;
    usize::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| invalid("must be a positive integer"))
}

/// Reads a boolean option.
pub(crate) fn flag(config: Option<&RuleConfig>, key: &str, default: bool) -> bool {
    config.map_or(default, |c| c.get_bool(key, default))
}

/// Reads a string-array option, falling back to `default` when unset or empty.
pub(crate) fn strings(config: Option<&RuleConfig>, key: &str, default: &[&str]) -> Vec<String> {
    let configured = config.map(|c| c.get_str_array(key)).unwrap_or_default();
    if configured.is_empty() {
        default.iter().map(|s| (*s).to_string()).collect()
    } else {
        configured
    }
}

/// Compiles glob options.
pub(crate) fn globs(
    rule: &str,
    config: Option<&RuleConfig>,
    key: &str,
    default: &[&str],
) -> Result<Vec<GlobPattern>, RuleLoadError> {
    strings(config, key, default)
        .iter()
        .map(|p| glob(rule, p))
        .collect()
}

/// Compiles one glob, tagging errors with the rule id.
pub(crate) fn glob(rule: &str, pattern: &str) -> Result<GlobPattern, RuleLoadError> {
    GlobPattern::new(pattern).map_err(|source| RuleLoadError::Pattern {
        rule: rule.to_string(),
        source,
    })
}
