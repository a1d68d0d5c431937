//! Evaluation orchestrator.
//!
//! The [`Engine`] enumerates the file set, fans files out over a bounded
//! rayon pool (load, extract and evaluate all happen on one worker), then
//! merges the results sequentially: waiver filtering, expiry advisories
//! and report assembly. The report depends only on the file set, the file
//! contents, the rule-model version, the waiver snapshot and the
//! evaluation date; never on worker count or completion order.

use chrono::NaiveDate;
use miette::Diagnostic;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{content_hash, AnalysisCache, CacheEntry};
use crate::cancellation::{Cancellable, CancellationToken};
use crate::config::{Config, DEFAULT_EXPIRY_LOOKAHEAD_DAYS};
use crate::evaluator::{evaluate_file, FileEvaluation};
use crate::extractor::extract;
use crate::registry::{RuleLoadError, RuleModel};
use crate::report::{
    ExpiringWaiver, FileReport, IssueKind, Report, ReportParts, ReportViolation, RunIssue,
};
use crate::scope::{GlobPattern, PatternError};
use crate::syntax::SourceFile;
use crate::types::normalize_path;
use crate::waiver::{WaiverLoadError, WaiverStore};

/// Errors of a [`SourceProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The file set could not be listed.
    #[error("cannot enumerate source files: {message}")]
    Enumerate {
        /// Details.
        message: String,
    },

    /// A listed file no longer exists.
    #[error("file not found")]
    NotFound,

    /// A file or its syntax tree could not be read.
    #[error("{message}")]
    Unreadable {
        /// Details.
        message: String,
    },
}

/// Supplies the file set of a run.
///
/// `enumerate` failing is fatal; `load` failing only affects that file.
pub trait SourceProvider: Send + Sync {
    /// Lists the relative paths of every file to analyze.
    ///
    /// # Errors
    ///
    /// Returns an error if the file set cannot be determined.
    fn enumerate(&self) -> Result<Vec<PathBuf>, SourceError>;

    /// Loads one file's content and syntax tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn load(&self, path: &Path) -> Result<SourceFile, SourceError>;
}

/// A file set held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySources {
    files: BTreeMap<PathBuf, SourceFile>,
    broken: BTreeMap<PathBuf, String>,
}

impl InMemorySources {
    /// Creates an empty file set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, file: SourceFile) {
        self.broken.remove(&file.path);
        self.files.insert(file.path.clone(), file);
    }

    /// Adds a file.
    #[must_use]
    pub fn with(mut self, file: SourceFile) -> Self {
        self.insert(file);
        self
    }

    /// Removes a file.
    pub fn remove(&mut self, path: &Path) -> Option<SourceFile> {
        self.files.remove(path)
    }

    /// Lists `path` but makes loading it fail with `message`.
    pub fn insert_unreadable(&mut self, path: impl Into<PathBuf>, message: impl Into<String>) {
        let path = path.into();
        self.files.remove(&path);
        self.broken.insert(path, message.into());
    }
}

impl SourceProvider for InMemorySources {
    fn enumerate(&self) -> Result<Vec<PathBuf>, SourceError> {
        Ok(self.files.keys().chain(self.broken.keys()).cloned().collect())
    }

    fn load(&self, path: &Path) -> Result<SourceFile, SourceError> {
        if let Some(message) = self.broken.get(path) {
            return Err(SourceError::Unreadable {
                message: message.clone(),
            });
        }
        self.files.get(path).cloned().ok_or(SourceError::NotFound)
    }
}

/// Errors that abort a run. Everything else ends up in the report.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    /// The file set could not be listed.
    #[error(transparent)]
    #[diagnostic(
        code(guidelint::enumerate),
        help("check the path and that the parser output exists")
    )]
    Enumerate(SourceError),

    /// No rules were registered.
    #[error("no rule model: at least one rule must be registered")]
    #[diagnostic(
        code(guidelint::no_rules),
        help("check the preset and the `enabled` flags in guidelint.toml")
    )]
    NoRules,

    /// The rule model could not be built.
    #[error("invalid rule model: {0}")]
    #[diagnostic(code(guidelint::rules))]
    Rules(#[from] RuleLoadError),

    /// An exclude pattern failed to compile.
    #[error("invalid exclude pattern: {0}")]
    #[diagnostic(code(guidelint::config))]
    Exclude(#[from] PatternError),

    /// The worker pool could not start.
    #[error("failed to start worker pool: {message}")]
    #[diagnostic(code(guidelint::worker_pool), help("try a smaller --workers value"))]
    WorkerPool {
        /// Details.
        message: String,
    },
}

/// Builder for configuring an [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    rules: Option<Arc<RuleModel>>,
    waivers: Arc<WaiverStore>,
    issues: Vec<RunIssue>,
    cache: Option<Arc<AnalysisCache>>,
    workers: Option<usize>,
    as_of: Option<NaiveDate>,
    lookahead_days: Option<i64>,
    cancellation: CancellationToken,
    exclude_patterns: Vec<String>,
}

impl EngineBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rule model.
    #[must_use]
    pub fn rules(mut self, rules: impl Into<Arc<RuleModel>>) -> Self {
        self.rules = Some(rules.into());
        self
    }

    /// Sets the waiver snapshot.
    #[must_use]
    pub fn waivers(mut self, waivers: impl Into<Arc<WaiverStore>>) -> Self {
        self.waivers = waivers.into();
        self
    }

    /// Records rejected waiver records in the report.
    #[must_use]
    pub fn waiver_errors(mut self, errors: impl IntoIterator<Item = WaiverLoadError>) -> Self {
        self.issues.extend(
            errors
                .into_iter()
                .map(|e| RunIssue::new(IssueKind::WaiverLoadError, None, e.to_string())),
        );
        self
    }

    /// Records a problem found before the run (e.g. a corrupt cache file).
    #[must_use]
    pub fn issue(mut self, issue: RunIssue) -> Self {
        self.issues.push(issue);
        self
    }

    /// Shares a cache with the engine.
    #[must_use]
    pub fn cache(mut self, cache: Arc<AnalysisCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the worker count (default: available parallelism).
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Sets the evaluation date (default: today, UTC).
    #[must_use]
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    /// Sets the expiring-soon window in days.
    #[must_use]
    pub fn expiry_lookahead_days(mut self, days: i64) -> Self {
        self.lookahead_days = Some(days);
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Applies the `[engine]` section of a configuration. Explicit builder
    /// calls made before this one win.
    #[must_use]
    pub fn config(mut self, config: &Config) -> Self {
        let engine = &config.engine;
        self.workers = self.workers.or(engine.workers);
        self.lookahead_days = self.lookahead_days.or(Some(engine.expiry_lookahead_days));
        self.exclude_patterns.extend(engine.exclude.iter().cloned());
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Fails if no rule model is set or it is empty, or an exclude
    /// pattern is invalid.
    pub fn build(self) -> Result<Engine, EngineError> {
        let rules = self
            .rules
            .filter(|r| !r.is_empty())
            .ok_or(EngineError::NoRules)?;
        let exclude = self
            .exclude_patterns
            .iter()
            .map(|p| GlobPattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let as_of = self
            .as_of
            .unwrap_or_else(|| chrono::Utc::now().date_naive());

        Ok(Engine {
            rule_version: rules.version(),
            rules,
            waivers: self.waivers,
            issues: self.issues,
            cache: self.cache,
            workers: self.workers,
            as_of,
            lookahead_days: self.lookahead_days.unwrap_or(DEFAULT_EXPIRY_LOOKAHEAD_DAYS),
            cancellation: self.cancellation,
            exclude,
        })
    }
}

/// Counters of one run, kept outside the report so the report stays a
/// function of its inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Files in the enumerated set (after excludes).
    pub files_total: usize,
    /// Files analyzed, from cache or fresh.
    pub files_analyzed: usize,
    /// Files answered from the cache.
    pub cache_hits: usize,
    /// Files extracted and evaluated.
    pub extractions: usize,
    /// Files that could not be loaded.
    pub load_failures: usize,
    /// Files skipped after cancellation.
    pub cancelled: usize,
}

/// Result of [`Engine::run`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The report.
    pub report: Report,
    /// Run counters.
    pub stats: RunStats,
}

enum FileOutcome {
    Cancelled,
    LoadFailed(RunIssue),
    Analyzed {
        path: String,
        evaluation: FileEvaluation,
        parse_error: Option<String>,
        cached: bool,
    },
}

/// The compliance engine. Use [`Engine::builder()`] to construct an instance.
pub struct Engine {
    rules: Arc<RuleModel>,
    rule_version: String,
    waivers: Arc<WaiverStore>,
    issues: Vec<RunIssue>,
    cache: Option<Arc<AnalysisCache>>,
    workers: Option<usize>,
    as_of: NaiveDate,
    lookahead_days: i64,
    cancellation: CancellationToken,
    exclude: Vec<GlobPattern>,
}

impl Engine {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// The rule model of this engine.
    #[must_use]
    pub fn rules(&self) -> &RuleModel {
        &self.rules
    }

    /// Version tag of the rule model.
    #[must_use]
    pub fn rule_version(&self) -> &str {
        &self.rule_version
    }

    /// The evaluation date.
    #[must_use]
    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Analyzes the file set and returns the report.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures are errors: the file set cannot be
    /// enumerated or the worker pool cannot start. Per-file problems are
    /// recorded in the report.
    pub fn run(&self, sources: &dyn SourceProvider) -> Result<RunOutcome, EngineError> {
        info!(
            "Starting run: {} rules (version {}), as of {}",
            self.rules.len(),
            self.rule_version,
            self.as_of
        );

        let files = self.file_set(sources)?;
        info!("Found {} files to analyze", files.len());
        self.waivers.log_expired(self.as_of);

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = self.workers {
            builder = builder.num_threads(workers);
        }
        let pool = builder.build().map_err(|e| EngineError::WorkerPool {
            message: e.to_string(),
        })?;

        let outcomes: Vec<FileOutcome> = pool.install(|| {
            files
                .par_iter()
                .map(|path| self.process_file(sources, path))
                .collect()
        });

        let outcome = self.merge(files.len(), outcomes);
        info!(
            "Run complete: {} ({} violation(s), {} suppressed, {} cache hit(s), {} extraction(s))",
            outcome.report.status,
            outcome.report.violation_count(),
            outcome.report.summary.suppressed,
            outcome.stats.cache_hits,
            outcome.stats.extractions
        );
        Ok(outcome)
    }

    fn file_set(&self, sources: &dyn SourceProvider) -> Result<Vec<PathBuf>, EngineError> {
        let mut files = sources.enumerate().map_err(EngineError::Enumerate)?;
        files.sort();
        files.dedup();
        files.retain(|path| {
            let excluded = self.exclude.iter().any(|p| p.matches(path));
            if excluded {
                debug!("Excluding: {}", path.display());
            }
            !excluded
        });
        Ok(files)
    }

    fn process_file(&self, sources: &dyn SourceProvider, path: &Path) -> FileOutcome {
        if self.cancellation.is_cancelled() {
            return FileOutcome::Cancelled;
        }
        let key = normalize_path(path);

        let file = match sources.load(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Failed to load {key}: {e}");
                return FileOutcome::LoadFailed(RunIssue::new(
                    IssueKind::LoadError,
                    Some(key),
                    e.to_string(),
                ));
            }
        };

        let hash = content_hash(&file.content);
        if let Some(cache) = &self.cache {
            if let Some(entry) = cache.lookup(&key, &hash, &self.rule_version) {
                debug!("Cache hit: {key}");
                return FileOutcome::Analyzed {
                    path: key,
                    parse_error: entry.ir.status.failure().map(str::to_string),
                    evaluation: entry.evaluation,
                    cached: true,
                };
            }
        }

        debug!("Analyzing: {key}");
        let ir = extract(&file);
        if let Some(reason) = ir.status.failure() {
            warn!("Could not analyze {key}: {reason}");
        }
        let evaluation = evaluate_file(&self.rules, &ir);
        let parse_error = ir.status.failure().map(str::to_string);

        if let Some(cache) = &self.cache {
            cache.insert(CacheEntry {
                path: key.clone(),
                content_hash: hash,
                rule_version: self.rule_version.clone(),
                ir,
                evaluation: evaluation.clone(),
            });
        }

        FileOutcome::Analyzed {
            path: key,
            evaluation,
            parse_error,
            cached: false,
        }
    }

    fn merge(&self, files_total: usize, outcomes: Vec<FileOutcome>) -> RunOutcome {
        let mut stats = RunStats {
            files_total,
            ..RunStats::default()
        };
        let mut parts = ReportParts {
            errors: self.issues.clone(),
            ..ReportParts::default()
        };
        let mut waiver_used = vec![false; self.waivers.len()];

        for outcome in outcomes {
            match outcome {
                FileOutcome::Cancelled => stats.cancelled += 1,
                FileOutcome::LoadFailed(issue) => {
                    stats.load_failures += 1;
                    parts.errors.push(issue);
                }
                FileOutcome::Analyzed {
                    path,
                    evaluation,
                    parse_error,
                    cached,
                } => {
                    stats.files_analyzed += 1;
                    if cached {
                        stats.cache_hits += 1;
                    } else {
                        stats.extractions += 1;
                    }

                    let mut violations = Vec::new();
                    for finding in evaluation.findings {
                        match self.waivers.suppressing(&finding, self.as_of) {
                            Some(index) => {
                                waiver_used[index] = true;
                                parts.suppressed += 1;
                            }
                            None => violations.push(ReportViolation::from(finding)),
                        }
                    }
                    parts.files.push(FileReport {
                        path,
                        violations,
                        parse_error,
                        skipped_rules: evaluation.skipped_rules,
                    });
                }
            }
        }

        parts.files_checked = stats.files_analyzed;
        parts.expiring_waivers = self.expiring(&waiver_used);
        if stats.cancelled > 0 {
            warn!("Run cancelled, {} file(s) not analyzed", stats.cancelled);
            parts.incomplete = true;
            parts.errors.push(RunIssue::new(
                IssueKind::CancellationRequested,
                None,
                format!("{} file(s) not analyzed", stats.cancelled),
            ));
        }

        RunOutcome {
            report: Report::assemble(parts),
            stats,
        }
    }

    fn expiring(&self, used: &[bool]) -> Vec<ExpiringWaiver> {
        self.waivers
            .waivers()
            .iter()
            .zip(used)
            .filter(|(_, used)| **used)
            .filter_map(|(w, _)| {
                let expiry = w.expiry?;
                let days_left = w.days_left(self.as_of)?;
                (days_left <= self.lookahead_days).then(|| ExpiringWaiver {
                    rule_id: w.rule_id.clone(),
                    matcher: w.matcher.to_string(),
                    expiry,
                    days_left,
                })
            })
            .collect()
    }
}
