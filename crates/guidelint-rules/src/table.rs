//! The built-in rule table in id order.

use guidelint_core::{Rule, RuleConfig, RuleLoadError};

use crate::{a11y, layout, naming, scoping, typing};

/// Builds one rule from its optional `[rules.SG-xxx]` section.
pub(crate) type Builder = fn(Option<&RuleConfig>) -> Result<Rule, RuleLoadError>;

pub(crate) const BUILTINS: &[(&str, Builder)] = &[
    ("SG-010", naming::component_file_names),
    ("SG-011", naming::store_file_names),
    ("SG-012", naming::identifier_case),
    ("SG-013", naming::event_names),
    ("SG-021", typing::typed_props),
    ("SG-022", typing::bindable_defaults),
    ("SG-023", typing::no_any),
    ("SG-030", typing::typed_events),
    ("SG-040", scoping::no_legacy_reactive),
    ("SG-041", scoping::no_manual_subscribe),
    ("SG-050", scoping::no_direct_api_imports),
    ("SG-051", scoping::stores_skip_components),
    ("SG-060", a11y::img_alt),
    ("SG-061", a11y::click_needs_keyboard),
    ("SG-070", layout::store_location),
    ("SG-071", typing::typed_api_functions),
    ("SG-080", layout::max_props),
    ("SG-081", layout::max_effects),
];

/// Returns true if `id` names a built-in rule.
pub(crate) fn is_builtin(id: &str) -> bool {
    BUILTINS.iter().any(|(builtin, _)| *builtin == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_ids_match_built_rules() {
        for (id, build) in BUILTINS {
            let rule = build(None).unwrap();
            assert_eq!(rule.id, *id);
        }
    }

    #[test]
    fn table_is_sorted_and_unique() {
        let ids: Vec<_> = BUILTINS.iter().map(|(id, _)| *id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }
}
