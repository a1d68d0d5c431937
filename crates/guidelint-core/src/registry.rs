//! The rule model: the registered, immutable rule set of a run.

use std::collections::HashMap;

use crate::ir::IR_SCHEMA_VERSION;
use crate::rule::Rule;
use crate::scope::PatternError;

/// Id of the pseudo-rule reported for files whose tree could not be used.
pub const PARSE_FAILURE_RULE_ID: &str = "SG-000";

/// Errors raised while building a rule model. Always fatal to a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleLoadError {
    /// Two rules share an id.
    #[error("duplicate rule id `{id}`")]
    DuplicateRuleId {
        /// The repeated id.
        id: String,
    },

    /// Id does not look like `SG-123`.
    #[error("invalid rule id `{id}`, expected `<PREFIX>-<3 digits>` (e.g. SG-050)")]
    InvalidRuleId {
        /// The rejected id.
        id: String,
    },

    /// The id is reserved for the parse-failure pseudo-rule.
    #[error("rule id `{id}` is reserved")]
    ReservedRuleId {
        /// The reserved id.
        id: String,
    },

    /// A configured rule option is out of range or mistyped.
    #[error("{rule}: invalid option `{option}`: {reason}")]
    InvalidOption {
        /// Rule the option belongs to.
        rule: String,
        /// Option name.
        option: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A rule pattern failed to compile.
    #[error("{rule}: {source}")]
    Pattern {
        /// Rule the pattern belongs to.
        rule: String,
        /// Underlying error.
        source: PatternError,
    },

    /// Unknown preset name.
    #[error("unknown preset `{name}`, expected one of: recommended, strict, minimal")]
    UnknownPreset {
        /// The rejected name.
        name: String,
    },
}

/// Returns true if `id` has the shape `<UPPERCASE>-<3 digits>`.
#[must_use]
pub fn is_valid_rule_id(id: &str) -> bool {
    let Some((prefix, number)) = id.split_once('-') else {
        return false;
    };
    !prefix.is_empty()
        && prefix.chars().all(|c| c.is_ascii_uppercase())
        && number.len() == 3
        && number.chars().all(|c| c.is_ascii_digit())
}

/// Registered rules in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RuleModel {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a model from rules, failing on the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleLoadError`] raised by [`RuleModel::register`].
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Result<Self, RuleLoadError> {
        let mut model = Self::new();
        for rule in rules {
            model.register(rule)?;
        }
        Ok(model)
    }

    /// Registers a rule.
    ///
    /// # Errors
    ///
    /// Fails on malformed, reserved or duplicate ids.
    pub fn register(&mut self, rule: Rule) -> Result<(), RuleLoadError> {
        if !is_valid_rule_id(&rule.id) {
            return Err(RuleLoadError::InvalidRuleId { id: rule.id });
        }
        if rule.id == PARSE_FAILURE_RULE_ID {
            return Err(RuleLoadError::ReservedRuleId { id: rule.id });
        }
        if self.index.contains_key(&rule.id) {
            return Err(RuleLoadError::DuplicateRuleId { id: rule.id });
        }
        self.index.insert(rule.id.clone(), self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    /// All rules in insertion order.
    #[must_use]
    pub fn all_rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Looks a rule up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).map(|&i| &self.rules[i])
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fingerprint of every registered definition plus the IR schema.
    ///
    /// Any change to a rule's id, severity, scope, description or check
    /// options yields a different version, which invalidates cached results.
    #[must_use]
    pub fn version(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&IR_SCHEMA_VERSION.to_le_bytes());
        for rule in &self.rules {
            // Rule serialization is infallible: plain strings, numbers and enums.
            let encoded = serde_json::to_vec(rule).unwrap_or_default();
            hasher.update(&(encoded.len() as u64).to_le_bytes());
            hasher.update(&encoded);
        }
        hasher.finalize().to_hex().as_str()[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FileKind;
    use crate::rule::{Check, LayoutCheck, TypingCheck};
    use crate::scope::ScopeSelector;
    use crate::types::Severity;

    fn rule(id: &str) -> Rule {
        Rule::new(
            id,
            Severity::Must,
            ScopeSelector::kinds([FileKind::Component]),
            "Props are typed",
            Check::Typing(TypingCheck::TypedProps),
        )
    }

    #[test]
    fn register_preserves_order() {
        let model = RuleModel::from_rules([rule("SG-021"), rule("SG-010")]).unwrap();
        let ids: Vec<&str> = model.all_rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["SG-021", "SG-010"]);
        assert!(model.get("SG-010").is_some());
        assert!(model.get("SG-999").is_none());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut model = RuleModel::new();
        model.register(rule("SG-021")).unwrap();
        assert_eq!(
            model.register(rule("SG-021")),
            Err(RuleLoadError::DuplicateRuleId {
                id: "SG-021".into()
            })
        );
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn malformed_and_reserved_ids_are_rejected() {
        let mut model = RuleModel::new();
        assert!(matches!(
            model.register(rule("sg-21")),
            Err(RuleLoadError::InvalidRuleId { .. })
        ));
        assert!(matches!(
            model.register(rule("SG-000")),
            Err(RuleLoadError::ReservedRuleId { .. })
        ));
        assert!(model.is_empty());
    }

    #[test]
    fn version_tracks_definitions() {
        let base = RuleModel::from_rules([rule("SG-021")]).unwrap();
        let same = RuleModel::from_rules([rule("SG-021")]).unwrap();
        assert_eq!(base.version(), same.version());

        let relaxed =
            RuleModel::from_rules([rule("SG-021").with_severity(Severity::Should)]).unwrap();
        assert_ne!(base.version(), relaxed.version());

        let mut limit = rule("SG-080");
        limit.check = Check::Layout(LayoutCheck::MaxProps { max: 10 });
        let mut raised = limit.clone();
        raised.check = Check::Layout(LayoutCheck::MaxProps { max: 11 });
        assert_ne!(
            RuleModel::from_rules([limit]).unwrap().version(),
            RuleModel::from_rules([raised]).unwrap().version()
        );
    }

    #[test]
    fn rule_id_shape() {
        assert!(is_valid_rule_id("SG-050"));
        assert!(is_valid_rule_id("A-123"));
        assert!(!is_valid_rule_id("SG-50"));
        assert!(!is_valid_rule_id("SG050"));
        assert!(!is_valid_rule_id("-050"));
    }
}
