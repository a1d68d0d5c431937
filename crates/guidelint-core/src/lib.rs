//! # guidelint-core
//!
//! Compliance engine for numbered style-guide rules over Svelte/TypeScript
//! projects.
//!
//! The engine never parses source text. An external parser hands over a
//! [`SyntaxNode`] tree per file; the engine:
//!
//! - extracts a normalized [`SourceFileIR`] ([`extract`])
//! - evaluates a declarative [`RuleModel`] against it ([`evaluate_file`])
//! - filters findings through a [`WaiverStore`] of time-limited exceptions
//! - memoizes per-file results in an [`AnalysisCache`]
//! - assembles a deterministic [`Report`]
//!
//! ## Example
//!
//! ```ignore
//! use guidelint_core::{Engine, InMemorySources};
//!
//! let engine = Engine::builder()
//!     .rules(guidelint_rules::recommended()?)
//!     .workers(4)
//!     .build()?;
//!
//! let outcome = engine.run(&sources)?;
//! println!("{}", outcome.report.render_text(false));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod cancellation;
mod config;
mod engine;
mod evaluator;
mod extractor;
mod ir;
mod registry;
mod report;
mod rule;
mod scope;
mod syntax;
mod types;
mod waiver;

pub use cache::{content_hash, AnalysisCache, CacheEntry, CacheError, CacheStats};
pub use cancellation::{Cancellable, CancellationToken};
pub use config::{Config, ConfigError, EngineConfig, RuleConfig, DEFAULT_EXPIRY_LOOKAHEAD_DAYS};
pub use engine::{
    Engine, EngineBuilder, EngineError, InMemorySources, RunOutcome, RunStats, SourceError,
    SourceProvider,
};
pub use evaluator::{evaluate, evaluate_file, FileEvaluation};
pub use extractor::{classify, extract};
pub use ir::{
    ElementRef, EventDecl, ExportDecl, ExportKind, FileKind, Identifier, IdentifierRole,
    ImportRef, NodeSite, ParseStatus, PropDecl, ReactiveDecl, ReactiveKind, SourceFileIR,
    StoreAccess, StoreUsage, IR_SCHEMA_VERSION,
};
pub use registry::{is_valid_rule_id, RuleLoadError, RuleModel, PARSE_FAILURE_RULE_ID};
pub use report::{
    ExpiringWaiver, FileReport, IssueKind, Report, ReportParts, ReportViolation, RunIssue,
    Status, Summary,
};
pub use rule::{
    A11yCheck, Category, Check, LayoutCheck, NamingCheck, Rule, ScopingCheck, TypingCheck,
};
pub use scope::{GlobPattern, PatternError, ScopeSelector};
pub use syntax::{kinds, SourceFile, SyntaxNode};
pub use types::{location_fingerprint, normalize_path, Finding, Severity};
pub use waiver::{Waiver, WaiverLoad, WaiverLoadError, WaiverMatcher, WaiverStore};
