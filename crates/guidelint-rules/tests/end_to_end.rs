//! End-to-end: the built-in rule table over a small project.

use chrono::NaiveDate;
use guidelint_core::{
    kinds, Config, Engine, InMemorySources, Report, SourceFile, Status, SyntaxNode,
};
use guidelint_rules::{recommended, rule_model};

fn button(prop_type: Option<&str>) -> SourceFile {
    let mut label = SyntaxNode::new(kinds::PROP, 3, 9).named("label");
    if let Some(ty) = prop_type {
        label = label.attr("type", ty);
    }
    let tree = SyntaxNode::root()
        .child(
            SyntaxNode::new(kinds::SCRIPT, 1, 1)
                .child(
                    SyntaxNode::new(kinds::PROP, 2, 9)
                        .named("disabled")
                        .attr("type", "boolean")
                        .attr("default", "true"),
                )
                .child(label),
        )
        .child(
            SyntaxNode::new(kinds::MARKUP, 6, 1)
                .child(SyntaxNode::new(kinds::ELEMENT, 6, 1).named("button")),
        );
    SourceFile::new(
        "src/lib/components/Button.svelte",
        "<script lang=\"ts\">\n  let { disabled = false, label } = $props();\n</script>\n",
        tree,
    )
}

fn user_store() -> SourceFile {
    let tree = SyntaxNode::root().child(
        SyntaxNode::new(kinds::SCRIPT, 1, 1)
            .child(
                SyntaxNode::new(kinds::IMPORT, 1, 1)
                    .named("$lib/apis/user")
                    .child(SyntaxNode::new(kinds::SPECIFIER, 1, 10).named("fetchUser")),
            )
            .child(
                SyntaxNode::new(kinds::EXPORT, 3, 1)
                    .named("userStore")
                    .attr("kind", "const")
                    .attr("types", "Writable<User | null>"),
            ),
    );
    SourceFile::new(
        "src/lib/stores/userStore.ts",
        "export const userStore: Writable<User | null> = writable(null);\n",
        tree,
    )
}

fn run(config: &Config, files: Vec<SourceFile>) -> Report {
    let sources = files
        .into_iter()
        .fold(InMemorySources::new(), InMemorySources::with);
    let engine = Engine::builder()
        .rules(rule_model(config).unwrap())
        .config(config)
        .as_of(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap())
        .build()
        .unwrap();
    engine.run(&sources).unwrap().report
}

#[test]
fn untyped_prop_is_the_only_violation() {
    let report = run(&Config::default(), vec![button(None), user_store()]);

    assert_eq!(report.status, Status::Fail);
    assert_eq!(report.violation_count(), 1);
    assert_eq!(report.summary.must, 1);
    assert_eq!(report.summary.files_checked, 2);
    assert_eq!(report.files.len(), 1);

    let violation = &report.files[0].violations[0];
    assert_eq!(violation.rule_id, "SG-021");
    assert_eq!(violation.line, 3);

    insta::assert_snapshot!(
        report.render_compact(),
        @"src/lib/components/Button.svelte:3:9: MUST [SG-021] prop `label` has no type"
    );
}

#[test]
fn typed_project_is_clean() {
    let report = run(&Config::default(), vec![button(Some("string")), user_store()]);
    assert_eq!(report.status, Status::Clean);
    assert!(report.files.is_empty());
}

#[test]
fn severity_override_turns_failure_into_warning() {
    let config = Config::parse("[rules.SG-021]\nseverity = \"should\"\n").unwrap();
    let report = run(&config, vec![button(None), user_store()]);
    assert_eq!(report.status, Status::Warn);
    assert_eq!(report.summary.should, 1);
}

#[test]
fn json_report_shape() {
    let report = run(&Config::default(), vec![button(None), user_store()]);
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["status"], "fail");
    assert_eq!(json["files"][0]["violations"][0]["ruleId"], "SG-021");
}

#[test]
fn recommended_model_is_stable() {
    assert_eq!(recommended().unwrap().version(), recommended().unwrap().version());
}
