//! Integration tests: full runs through the Engine with an in-memory file set.
//!
//! Covers determinism across worker counts and input order, cache reuse and
//! invalidation, waiver expiry on a simulated clock, parse-failure isolation
//! and cancellation.

use chrono::NaiveDate;
use guidelint_core::{
    kinds, A11yCheck, AnalysisCache, Cancellable, CancellationToken, Check, Engine, FileKind,
    GlobPattern, InMemorySources, IssueKind, LayoutCheck, Report, Rule, RuleModel,
    ScopeSelector, ScopingCheck, Severity, SourceError, SourceFile, SourceProvider, Status,
    SyntaxNode, TypingCheck, Waiver, WaiverMatcher, WaiverStore, PARSE_FAILURE_RULE_ID,
};
use proptest::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

fn model(props_severity: Severity) -> RuleModel {
    RuleModel::from_rules([
        Rule::new(
            "SG-021",
            props_severity,
            ScopeSelector::kinds([FileKind::Component, FileKind::Route]),
            "Props declare a type",
            Check::Typing(TypingCheck::TypedProps),
        ),
        Rule::new(
            "SG-040",
            Severity::Must,
            ScopeSelector::kinds([FileKind::Component, FileKind::Route]),
            "No legacy reactive statements",
            Check::Scoping(ScopingCheck::NoLegacyReactive),
        ),
        Rule::new(
            "SG-070",
            Severity::Should,
            ScopeSelector::kinds([FileKind::Store]),
            "Stores live under src/lib/stores",
            Check::Layout(LayoutCheck::UnderDirectory {
                dir: GlobPattern::new("src/lib/stores/**").expect("valid glob"),
            }),
        ),
    ])
    .expect("valid model")
}

/// A component with `untyped` untyped props and optionally a `$:` statement.
fn component(path: &str, untyped: usize, legacy: bool, revision: u32) -> SourceFile {
    let mut script = SyntaxNode::new(kinds::SCRIPT, 1, 1)
        .child(SyntaxNode::new(kinds::PROP, 2, 9).named("id").attr("type", "string"));
    for i in 0..untyped {
        script = script.child(SyntaxNode::new(kinds::PROP, 3 + i, 9).named(format!("p{i}")));
    }
    if legacy {
        script = script.child(SyntaxNode::new(kinds::REACTIVE_STATEMENT, 20, 3));
    }
    SourceFile::new(
        path,
        format!("<script lang=\"ts\">/* rev {revision} */</script>"),
        SyntaxNode::root().child(script),
    )
}

fn store(path: &str) -> SourceFile {
    SourceFile::new(
        path,
        "export const user = writable(null);",
        SyntaxNode::root().child(SyntaxNode::new(kinds::SCRIPT, 1, 1)),
    )
}

fn project() -> Vec<SourceFile> {
    vec![
        component("src/lib/Button.svelte", 1, false, 0),
        component("src/lib/Card.svelte", 0, false, 0),
        component("src/lib/Legacy.svelte", 2, true, 0),
        component("src/routes/+page.svelte", 0, true, 0),
        component("src/routes/about/+page.svelte", 3, false, 0),
        store("src/lib/stores/userStore.ts"),
        store("src/userStore.ts"),
        SourceFile::unparsable("src/lib/Broken.svelte", "<div", "unexpected end of input"),
    ]
}

fn sources(files: Vec<SourceFile>) -> InMemorySources {
    files
        .into_iter()
        .fold(InMemorySources::new(), InMemorySources::with)
}

/// Enumerates files in the given order, to prove the report does not care.
struct OrderedSources(Vec<SourceFile>);

impl SourceProvider for OrderedSources {
    fn enumerate(&self) -> Result<Vec<PathBuf>, SourceError> {
        Ok(self.0.iter().map(|f| f.path.clone()).collect())
    }

    fn load(&self, path: &Path) -> Result<SourceFile, SourceError> {
        self.0
            .iter()
            .find(|f| f.path == path)
            .cloned()
            .ok_or(SourceError::NotFound)
    }
}

fn run(engine: &Engine, provider: &dyn SourceProvider) -> Report {
    engine.run(provider).expect("run should succeed").report
}

fn engine(workers: usize) -> Engine {
    Engine::builder()
        .rules(model(Severity::Must))
        .workers(workers)
        .as_of(date("2026-06-01"))
        .build()
        .expect("engine should build")
}

#[test]
fn report_contents() {
    let report = run(&engine(2), &sources(project()));

    assert_eq!(report.status, Status::Fail);
    assert!(!report.incomplete);
    assert_eq!(report.summary.files_checked, 8);

    let paths: Vec<&str> = report.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "src/lib/Broken.svelte",
            "src/lib/Button.svelte",
            "src/lib/Legacy.svelte",
            "src/routes/+page.svelte",
            "src/routes/about/+page.svelte",
            "src/userStore.ts",
        ]
    );

    let legacy = &report.files[2];
    let ids: Vec<&str> = legacy.violations.iter().map(|v| v.rule_id.as_str()).collect();
    assert_eq!(ids, vec!["SG-021", "SG-021", "SG-040"]);

    assert_eq!(report.summary.must, 1 + 1 + 3 + 1 + 3);
    assert_eq!(report.summary.should, 1);
}

#[test]
fn parse_failure_is_isolated() {
    let report = run(&engine(4), &sources(project()));
    let broken = report
        .files
        .iter()
        .find(|f| f.path == "src/lib/Broken.svelte")
        .expect("broken file is reported");

    assert_eq!(broken.violations.len(), 1);
    assert_eq!(broken.violations[0].rule_id, PARSE_FAILURE_RULE_ID);
    // SG-070 only covers stores
    assert_eq!(broken.skipped_rules, 2);
    assert!(broken
        .parse_error
        .as_deref()
        .is_some_and(|e| e.contains("unexpected end of input")));

    let button = report
        .files
        .iter()
        .find(|f| f.path == "src/lib/Button.svelte")
        .expect("button is reported");
    assert_eq!(button.violations.len(), 1);
}

#[test]
fn warm_cache_skips_extraction() {
    let cache = Arc::new(AnalysisCache::new());
    let engine = Engine::builder()
        .rules(model(Severity::Must))
        .cache(Arc::clone(&cache))
        .as_of(date("2026-06-01"))
        .build()
        .expect("engine should build");
    let files = sources(project());

    let cold = engine.run(&files).expect("cold run");
    assert_eq!(cold.stats.extractions, 8);
    assert_eq!(cold.stats.cache_hits, 0);

    let warm = engine.run(&files).expect("warm run");
    assert_eq!(warm.stats.extractions, 0);
    assert_eq!(warm.stats.cache_hits, 8);
    assert_eq!(cold.report, warm.report);
}

#[test]
fn editing_one_file_reanalyzes_only_that_file() {
    let cache = Arc::new(AnalysisCache::new());
    let engine = Engine::builder()
        .rules(model(Severity::Must))
        .cache(Arc::clone(&cache))
        .build()
        .expect("engine should build");
    let mut files = sources(project());
    engine.run(&files).expect("cold run");

    files.insert(component("src/lib/Button.svelte", 0, false, 1));
    let outcome = engine.run(&files).expect("second run");
    assert_eq!(outcome.stats.extractions, 1);
    assert_eq!(outcome.stats.cache_hits, 7);
    assert!(outcome
        .report
        .files
        .iter()
        .all(|f| f.path != "src/lib/Button.svelte"));
}

#[test]
fn rule_change_invalidates_every_entry() {
    let cache = Arc::new(AnalysisCache::new());
    let files = sources(project());
    let strict = Engine::builder()
        .rules(model(Severity::Must))
        .cache(Arc::clone(&cache))
        .build()
        .expect("engine should build");
    strict.run(&files).expect("first run");

    let relaxed = Engine::builder()
        .rules(model(Severity::Should))
        .cache(Arc::clone(&cache))
        .build()
        .expect("engine should build");
    assert_ne!(strict.rule_version(), relaxed.rule_version());

    let outcome = relaxed.run(&files).expect("second run");
    assert_eq!(outcome.stats.extractions, 8);
    assert_eq!(outcome.stats.cache_hits, 0);
}

#[test]
fn waiver_suppresses_until_expiry() {
    let files = sources(project());
    let waivers = Arc::new(WaiverStore::from_waivers(vec![Waiver {
        rule_id: "SG-040".into(),
        matcher: WaiverMatcher::Path(GlobPattern::new("src/routes/**").expect("valid glob")),
        justification: "routing rewrite scheduled".into(),
        expiry: Some(date("2026-06-10")),
        created_by: Some("frontend".into()),
    }]));
    let at = |as_of: &str| {
        let engine = Engine::builder()
            .rules(model(Severity::Must))
            .waivers(Arc::clone(&waivers))
            .as_of(date(as_of))
            .build()
            .expect("engine should build");
        run(&engine, &files)
    };

    let early = at("2026-05-01");
    assert_eq!(early.summary.suppressed, 1);
    assert!(early.expiring_waivers.is_empty());
    assert!(early.files.iter().all(|f| f.path != "src/routes/+page.svelte"));

    let soon = at("2026-06-01");
    assert_eq!(soon.summary.suppressed, 1);
    assert_eq!(soon.expiring_waivers.len(), 1);
    assert_eq!(soon.expiring_waivers[0].days_left, 9);
    assert_eq!(soon.expiring_waivers[0].matcher, "path:src/routes/**");

    let last_day = at("2026-06-10");
    assert_eq!(last_day.summary.suppressed, 1);

    let expired = at("2026-06-11");
    assert_eq!(expired.summary.suppressed, 0);
    assert!(expired.expiring_waivers.is_empty());
    let page = expired
        .files
        .iter()
        .find(|f| f.path == "src/routes/+page.svelte")
        .expect("violation reappears after expiry");
    assert_eq!(page.violations[0].rule_id, "SG-040");
}

#[test]
fn fingerprint_waiver_targets_one_location() {
    let files = sources(project());
    let baseline = run(&engine(1), &files);
    let legacy = baseline
        .files
        .iter()
        .find(|f| f.path == "src/lib/Legacy.svelte")
        .expect("legacy is reported");
    let target = &legacy.violations[0];

    let engine = Engine::builder()
        .rules(model(Severity::Must))
        .waivers(WaiverStore::from_waivers(vec![Waiver {
            rule_id: target.rule_id.clone(),
            matcher: WaiverMatcher::Fingerprint(target.fingerprint.clone()),
            justification: "accepted".into(),
            expiry: None,
            created_by: None,
        }]))
        .build()
        .expect("engine should build");
    let waived = run(&engine, &files);

    assert_eq!(waived.summary.suppressed, 1);
    assert_eq!(waived.violation_count(), baseline.violation_count() - 1);
    assert!(waived
        .files
        .iter()
        .flat_map(|f| &f.violations)
        .all(|v| v.fingerprint != target.fingerprint));
}

#[test]
fn same_line_siblings_are_waived_independently() {
    let div = |column| {
        SyntaxNode::new(kinds::ELEMENT, 4, column)
            .named("div")
            .attr("on:click", "open")
    };
    let toolbar = SourceFile::new(
        "src/lib/Toolbar.svelte",
        "<div on:click={open}></div><div on:click={open}></div>",
        SyntaxNode::root().child(
            SyntaxNode::new(kinds::MARKUP, 4, 1)
                .child(div(1))
                .child(div(28)),
        ),
    );
    let rules = || {
        RuleModel::from_rules([Rule::new(
            "SG-061",
            Severity::Should,
            ScopeSelector::kinds([FileKind::Component]),
            "Clickable elements are keyboard reachable",
            Check::A11yProxy(A11yCheck::ClickNeedsKeyboard {
                interactive: vec!["button".into()],
            }),
        )])
        .expect("valid model")
    };
    let files = sources(vec![toolbar]);

    let baseline = run(
        &Engine::builder().rules(rules()).build().expect("engine should build"),
        &files,
    );
    let violations = &baseline.files[0].violations;
    assert_eq!(violations.len(), 2);
    assert_ne!(violations[0].fingerprint, violations[1].fingerprint);

    let engine = Engine::builder()
        .rules(rules())
        .waivers(WaiverStore::from_waivers(vec![Waiver {
            rule_id: "SG-061".into(),
            matcher: WaiverMatcher::Fingerprint(violations[0].fingerprint.clone()),
            justification: "decorative overlay".into(),
            expiry: None,
            created_by: None,
        }]))
        .build()
        .expect("engine should build");
    let waived = run(&engine, &files);

    assert_eq!(waived.summary.suppressed, 1);
    assert_eq!(waived.files[0].violations.len(), 1);
    assert_eq!(waived.files[0].violations[0].column, 28);
}

/// Cancels the run once a number of files has been loaded.
struct CancellingSources {
    inner: InMemorySources,
    token: CancellationToken,
    after: usize,
    loaded: AtomicUsize,
}

impl SourceProvider for CancellingSources {
    fn enumerate(&self) -> Result<Vec<PathBuf>, SourceError> {
        self.inner.enumerate()
    }

    fn load(&self, path: &Path) -> Result<SourceFile, SourceError> {
        if self.loaded.fetch_add(1, Ordering::SeqCst) + 1 >= self.after {
            self.token.cancel();
        }
        self.inner.load(path)
    }
}

#[test]
fn cancellation_yields_partial_report() {
    let token = CancellationToken::new();
    let provider = CancellingSources {
        inner: sources(project()),
        token: token.clone(),
        after: 2,
        loaded: AtomicUsize::new(0),
    };
    let engine = Engine::builder()
        .rules(model(Severity::Must))
        .workers(1)
        .cancellation(token)
        .build()
        .expect("engine should build");

    let outcome = engine.run(&provider).expect("cancelled run still reports");
    assert!(outcome.report.incomplete);
    assert!(outcome.stats.cancelled > 0);
    assert_eq!(
        outcome.stats.files_analyzed + outcome.stats.cancelled,
        outcome.stats.files_total
    );
    assert_eq!(outcome.report.summary.files_checked, outcome.stats.files_analyzed);
    assert!(outcome
        .report
        .errors
        .iter()
        .any(|e| e.kind == IssueKind::CancellationRequested));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_report_independent_of_workers_and_order(
        workers in 1usize..8,
        files in Just(project()).prop_shuffle(),
    ) {
        let baseline = run(&engine(1), &sources(project()));
        let shuffled = run(&engine(workers), &OrderedSources(files));
        prop_assert_eq!(
            baseline.to_json().expect("serializable"),
            shuffled.to_json().expect("serializable")
        );
    }
}
