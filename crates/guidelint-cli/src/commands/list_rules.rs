//! List rules command implementation.

use anyhow::Result;
use guidelint_core::{Config, EngineError, RuleModel};
use guidelint_rules::{rule_model_with_preset, Preset};
use std::fmt::Write;

/// Runs the list-rules command for `preset` (default: recommended).
pub fn run(preset: Option<&str>) -> Result<()> {
    let preset = preset
        .map(Preset::parse)
        .transpose()
        .map_err(EngineError::from)?
        .unwrap_or_default();
    let model = rule_model_with_preset(&Config::default(), preset).map_err(EngineError::from)?;
    print!("{}", render(&model, preset));
    Ok(())
}

fn render(model: &RuleModel, preset: Preset) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Rules in preset `{preset}` (version {}):\n", model.version());
    let _ = writeln!(
        out,
        "{:<8} {:<7} {:<11} {:<34} Description",
        "Id", "Level", "Category", "Applies to"
    );
    let _ = writeln!(out, "{}", "-".repeat(100));
    for rule in model.all_rules() {
        let _ = writeln!(
            out,
            "{:<8} {:<7} {:<11} {:<34} {}",
            rule.id,
            rule.severity.to_string(),
            rule.category().to_string(),
            rule.scope.to_string(),
            rule.description
        );
    }

    let _ = writeln!(out, "\nPresets:");
    let _ = writeln!(out, "  recommended  - every rule at its default level (default)");
    let _ = writeln!(out, "  strict       - SHOULD rules raised to MUST");
    let _ = writeln!(out, "  minimal      - MUST rules only");
    let _ = writeln!(
        out,
        "\nConfigure rules in guidelint.toml, e.g. `[rules.SG-080]` with `max = 12`."
    );
    out
}
