//! Check command implementation.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use guidelint_core::{
    normalize_path, AnalysisCache, Cancellable, CancellationToken, Config, Engine,
    EngineError, IssueKind, RunIssue, SourceProvider, Status, WaiverLoad, WaiverStore,
};
use guidelint_rules::{rule_model_with_preset, Preset};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::config_resolver::ConfigSource;
use crate::sources::{ManifestSource, SidecarSource};
use crate::OutputFormat;

/// Waiver file picked up from the project root when none is configured.
const DEFAULT_WAIVER_FILE: &str = "guidelint-waivers.toml";

/// Arguments of `guidelint check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Project root (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Read the file set from a JSON manifest instead of `*.ast.json` sidecars
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Worker threads
    #[arg(short = 'j', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Waiver file
    #[arg(long)]
    pub waivers: Option<PathBuf>,

    /// Cache file
    #[arg(long, conflicts_with = "no_cache")]
    pub cache: Option<PathBuf>,

    /// Run without the persistent cache
    #[arg(long)]
    pub no_cache: bool,

    /// Cancel the run after this many seconds; the report is marked incomplete
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Evaluation date for waiver expiry (default: today, UTC)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub as_of: Option<NaiveDate>,

    /// Rule preset, overriding the configuration
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Exclude patterns (can be specified multiple times)
    #[arg(short, long)]
    pub exclude: Vec<String>,
}

/// Runs the check command. The exit code reflects the report status.
pub fn run(args: &CheckArgs, source: &ConfigSource) -> Result<ExitCode> {
    let config = source.load()?;

    let preset = match args.preset.as_deref().or(config.preset.as_deref()) {
        Some(name) => Preset::parse(name).map_err(EngineError::from)?,
        None => Preset::default(),
    };
    let rules = rule_model_with_preset(&config, preset).map_err(EngineError::from)?;

    let mut builder = Engine::builder().rules(rules);

    let WaiverLoad { store, errors } = load_waivers(args, &config);
    builder = builder.waivers(store).waiver_errors(errors);

    let cache_path = cache_path(args, &config);
    let cache = match cache_path.as_deref() {
        None => None,
        Some(path) => {
            let (cache, issue) = load_cache(path);
            if let Some(issue) = issue {
                builder = builder.issue(issue);
            }
            Some(Arc::new(cache))
        }
    };
    if let Some(cache) = &cache {
        builder = builder.cache(Arc::clone(cache));
    }

    if let Some(workers) = args.workers {
        builder = builder.workers(usize::from(workers));
    }
    if let Some(date) = args.as_of {
        builder = builder.as_of(date);
    }
    for pattern in &args.exclude {
        builder = builder.exclude(pattern.clone());
    }

    let token = CancellationToken::new();
    if let Some(secs) = args.timeout.or(config.engine.timeout_secs) {
        spawn_timeout(token.clone(), Duration::from_secs(secs));
    }

    let engine = builder.cancellation(token).config(&config).build()?;

    let provider: Box<dyn SourceProvider> = match &args.manifest {
        Some(manifest) => {
            Box::new(ManifestSource::open(manifest).map_err(EngineError::Enumerate)?)
        }
        None => Box::new(SidecarSource::new(&args.path)),
    };

    tracing::info!(
        "Checking {} with preset `{preset}` ({} rules)",
        args.path.display(),
        engine.rules().len()
    );
    let outcome = engine.run(provider.as_ref())?;
    tracing::debug!("{:?}", outcome.stats);

    if let (Some(cache), Some(path)) = (&cache, &cache_path) {
        persist_cache(cache, path, engine.rule_version(), provider.as_ref());
    }

    super::output::print(&outcome.report, args.format)?;

    Ok(match outcome.report.status {
        Status::Fail => ExitCode::from(1),
        Status::Warn | Status::Clean => ExitCode::SUCCESS,
    })
}

/// `--waivers` > `engine.waivers` > `guidelint-waivers.toml` if present.
fn load_waivers(args: &CheckArgs, config: &Config) -> WaiverLoad {
    let path = match (&args.waivers, &config.engine.waivers) {
        (Some(path), _) => path.clone(),
        (None, Some(path)) => args.path.join(path),
        (None, None) => {
            let default = args.path.join(DEFAULT_WAIVER_FILE);
            if !default.is_file() {
                return WaiverLoad::default();
            }
            default
        }
    };
    let load = WaiverStore::load_file(&path);
    tracing::info!(
        "Loaded {} waiver(s) from {} ({} rejected)",
        load.store.len(),
        path.display(),
        load.errors.len()
    );
    load
}

fn cache_path(args: &CheckArgs, config: &Config) -> Option<PathBuf> {
    if args.no_cache {
        return None;
    }
    args.cache
        .clone()
        .or_else(|| config.engine.cache.as_ref().map(|p| args.path.join(p)))
}

/// Loads the cache file. An unreadable cache is replaced by an empty one and
/// returned together with the issue to record in the report.
fn load_cache(path: &Path) -> (AnalysisCache, Option<RunIssue>) {
    match AnalysisCache::load(path) {
        Ok(cache) => (cache, None),
        Err(e) => {
            tracing::warn!("{e}; starting with an empty cache");
            let issue = RunIssue::new(
                IssueKind::CacheCorruption,
                Some(normalize_path(path)),
                e.to_string(),
            );
            (AnalysisCache::new(), Some(issue))
        }
    }
}

/// Drops entries of other rule versions and of files no longer in the set,
/// then writes the cache. Failures only cost the next run its warm start.
fn persist_cache(
    cache: &AnalysisCache,
    path: &Path,
    rule_version: &str,
    provider: &dyn SourceProvider,
) {
    cache.evict_stale(rule_version);
    if let Ok(files) = provider.enumerate() {
        let keep: HashSet<String> = files.iter().map(|p| normalize_path(p)).collect();
        cache.retain_paths(&keep);
    }
    match cache.save(path) {
        Ok(()) => tracing::debug!(stats = ?cache.stats(), "Saved cache to {}", path.display()),
        Err(e) => tracing::warn!("Failed to save cache: {e}"),
    }
}

fn spawn_timeout(token: CancellationToken, after: Duration) {
    std::thread::spawn(move || {
        std::thread::sleep(after);
        if !token.is_cancelled() {
            tracing::warn!("Timeout of {}s reached, cancelling", after.as_secs());
            token.cancel();
        }
    });
}
