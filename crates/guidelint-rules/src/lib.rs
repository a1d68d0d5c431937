//! # guidelint-rules
//!
//! The built-in style-guide rules and the presets that select them.
//!
//! ## Available Rules
//!
//! | Id | Severity | Category | Description |
//! |----|----------|----------|-------------|
//! | SG-010 | MUST | naming | Component file names are PascalCase |
//! | SG-011 | SHOULD | naming | Store file names end with `Store` or `.store` |
//! | SG-012 | SHOULD | naming | Identifier casing |
//! | SG-013 | SHOULD | naming | Event names are camelCase |
//! | SG-021 | MUST | typing | Props declare a type |
//! | SG-022 | SHOULD | typing | Bindable props declare a default |
//! | SG-023 | SHOULD | typing | No `any` |
//! | SG-030 | MUST | typing | Dispatched events are typed |
//! | SG-040 | MUST | scoping | No legacy `$:` statements |
//! | SG-041 | SHOULD | scoping | No manual `.subscribe()` |
//! | SG-050 | MUST | scoping | No direct `$lib/apis` imports from components |
//! | SG-051 | SHOULD | scoping | Stores do not import components |
//! | SG-060 | MUST | a11y-proxy | `<img>` has `alt` |
//! | SG-061 | SHOULD | a11y-proxy | Click handlers have keyboard handlers and a role |
//! | SG-070 | SHOULD | layout | Stores live under `src/lib/stores/` |
//! | SG-071 | MUST | typing | API functions have explicit types |
//! | SG-080 | MAY | layout | Prop count limit (`max`, default 10) |
//! | SG-081 | MAY | layout | `$effect` count limit (`max`, default 3) |
//!
//! ## Usage
//!
//! ```ignore
//! use guidelint_core::{Config, Engine};
//!
//! let config = Config::from_file("guidelint.toml".as_ref())?;
//! let engine = Engine::builder()
//!     .rules(guidelint_rules::rule_model(&config)?)
//!     .config(&config)
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod a11y;
mod layout;
mod naming;
mod options;
mod presets;
mod scoping;
mod table;
mod typing;

use guidelint_core::{Config, Rule, RuleLoadError, RuleModel, PARSE_FAILURE_RULE_ID};
use tracing::{debug, warn};

pub use layout::{DEFAULT_MAX_EFFECTS, DEFAULT_MAX_PROPS};
pub use presets::Preset;

/// Re-export core types for convenience.
pub use guidelint_core::{Finding, Severity};

/// Returns every built-in rule at its default options and severity.
///
/// # Errors
///
/// Never fails for the shipped defaults; the error type is shared with
/// [`rule_model`].
pub fn builtin_rules() -> Result<Vec<Rule>, RuleLoadError> {
    table::BUILTINS.iter().map(|(_, build)| build(None)).collect()
}

/// Returns the model of the `recommended` preset with no configuration.
///
/// # Errors
///
/// See [`builtin_rules`].
pub fn recommended() -> Result<RuleModel, RuleLoadError> {
    rule_model(&Config::default())
}

/// Builds the rule model selected by `config`.
///
/// # Errors
///
/// Returns an error for an unknown preset name or an invalid rule option.
pub fn rule_model(config: &Config) -> Result<RuleModel, RuleLoadError> {
    let preset = match config.preset.as_deref() {
        Some(name) => Preset::parse(name)?,
        None => Preset::default(),
    };
    rule_model_with_preset(config, preset)
}

/// Builds the rule model from `config` with `preset` taking the place of
/// `config.preset`.
///
/// Per-rule configuration always wins: `enabled = false` drops a rule,
/// `enabled = true` keeps it under `minimal`, and `severity` overrides the
/// preset's severity.
///
/// # Errors
///
/// Returns an error for an invalid rule option.
pub fn rule_model_with_preset(config: &Config, preset: Preset) -> Result<RuleModel, RuleLoadError> {
    for id in config.rules.keys() {
        if id != PARSE_FAILURE_RULE_ID && !table::is_builtin(id) {
            warn!(rule = %id, "configuration for unknown rule ignored");
        }
    }

    let mut rules = Vec::with_capacity(table::BUILTINS.len());
    for (id, build) in table::BUILTINS {
        if !config.is_rule_enabled(id) {
            debug!(rule = %id, "rule disabled by configuration");
            continue;
        }
        let rule_config = config.rule(id);
        let rule = build(rule_config)?;
        let forced = rule_config.and_then(|c| c.enabled) == Some(true);
        if !forced && !preset.includes(&rule) {
            debug!(rule = %id, preset = %preset, "rule excluded by preset");
            continue;
        }
        let severity = config
            .rule_severity(id)
            .unwrap_or_else(|| preset.adjust(rule.severity));
        rules.push(rule.with_severity(severity));
    }

    debug!(preset = %preset, rules = rules.len(), "rule model built");
    RuleModel::from_rules(rules)
}
