//! Language-agnostic intermediate representation of one source file.
//!
//! The IR holds only the facts the rules need. It never references the
//! syntax tree it was extracted from, so rules can be tested against
//! hand-built IR values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Bumped whenever the IR shape changes, so cached IR from older builds
/// is never reused.
pub const IR_SCHEMA_VERSION: u32 = 1;

/// Where an extracted fact came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSite {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Slash-separated path of node kinds from the root, e.g. `Root/Script/Prop[label]`.
    pub node_path: String,
}

impl NodeSite {
    /// Creates a new site.
    #[must_use]
    pub fn new(line: usize, column: usize, node_path: impl Into<String>) -> Self {
        Self {
            line,
            column,
            node_path: node_path.into(),
        }
    }
}

/// Detected role of a file in the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    /// A Svelte component (`.svelte` or a file with a markup root).
    Component,
    /// A store module.
    Store,
    /// A module under the API directory.
    ApiModule,
    /// A routing file (`+page.svelte`, `+layout.ts`, ...).
    Route,
    /// A stylesheet.
    Style,
    /// Any other script module.
    Module,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Component => "component",
            Self::Store => "store",
            Self::ApiModule => "api-module",
            Self::Route => "route",
            Self::Style => "style",
            Self::Module => "module",
        };
        f.write_str(s)
    }
}

/// A component prop declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropDecl {
    /// Prop name.
    pub name: String,
    /// Declared type annotation, if any.
    pub type_annotation: Option<String>,
    /// Whether a default value is given.
    pub has_default: bool,
    /// Whether the prop is declared with `$bindable`.
    pub bindable: bool,
    /// Source location.
    pub site: NodeSite,
}

/// A dispatched/declared component event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDecl {
    /// Event name.
    pub name: String,
    /// Whether the event payload has a declared type.
    pub typed: bool,
    /// Source location.
    pub site: NodeSite,
}

/// Kind of reactive declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactiveKind {
    /// `$derived(...)`
    Derived,
    /// `$effect(...)`
    Effect,
    /// Legacy `$:` statement.
    Legacy,
}

/// A reactive declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactiveDecl {
    /// Reactive flavour.
    pub kind: ReactiveKind,
    /// Source location.
    pub site: NodeSite,
}

/// An import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRef {
    /// Module specifier as written (e.g., `$lib/apis/user`).
    pub source: String,
    /// Imported binding names.
    pub specifiers: Vec<String>,
    /// Whether this is an `import type` statement.
    pub type_only: bool,
    /// Source location.
    pub site: NodeSite,
}

/// How a store value is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreAccess {
    /// `$store` auto-subscription.
    Auto,
    /// Manual `store.subscribe(...)`.
    Subscribe,
    /// One-shot `get(store)`.
    Get,
}

/// A store usage site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreUsage {
    /// Store binding name.
    pub store: String,
    /// Access mode.
    pub access: StoreAccess,
    /// Source location.
    pub site: NodeSite,
}

/// Kind of exported binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// `export function` / exported arrow function.
    Function,
    /// `export const` value.
    Const,
    /// `export type` / `export interface`.
    Type,
    /// `export class`.
    Class,
    /// Any other export form (`enum`, `namespace`, ...).
    Other,
}

/// An exported binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDecl {
    /// Exported name.
    pub name: String,
    /// Kind of export.
    pub kind: ExportKind,
    /// Whether every parameter carries a type annotation.
    pub params_typed: bool,
    /// Whether the return (or value) type is annotated.
    pub return_typed: bool,
    /// Type annotations mentioned by the signature.
    pub type_annotations: Vec<String>,
    /// Source location.
    pub site: NodeSite,
}

/// A markup element with its attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRef {
    /// Tag name (e.g., `img`, `div`).
    pub tag: String,
    /// Attribute and directive names, sorted.
    pub attributes: Vec<String>,
    /// Source location.
    pub site: NodeSite,
}

impl ElementRef {
    /// Returns true if the element carries the named attribute.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }
}

/// Role of a declared identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierRole {
    /// `let`/`var` binding.
    Variable,
    /// Top-level `const` binding; SCREAMING_SNAKE_CASE is accepted.
    Constant,
    /// Function name.
    Function,
    /// Parameter name.
    Parameter,
    /// Type, interface or class name.
    Type,
}

/// A declared identifier collected for naming checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    /// Identifier text.
    pub name: String,
    /// Declaration role.
    pub role: IdentifierRole,
    /// Source location.
    pub site: NodeSite,
}

/// Whether the syntax tree could be turned into facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum ParseStatus {
    /// Tree was well-formed.
    Ok,
    /// Tree was missing or malformed.
    Failed(String),
}

impl ParseStatus {
    /// Returns the failure reason, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Ok => None,
            Self::Failed(reason) => Some(reason),
        }
    }
}

/// Normalized structural view of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFileIR {
    /// Path relative to project root.
    pub path: PathBuf,
    /// Detected file kind.
    pub kind: FileKind,
    /// Number of lines in the file content.
    pub line_count: usize,
    /// Component props.
    pub props: Vec<PropDecl>,
    /// Component events.
    pub events: Vec<EventDecl>,
    /// Reactive declarations.
    pub reactive: Vec<ReactiveDecl>,
    /// Import statements.
    pub imports: Vec<ImportRef>,
    /// Store usages.
    pub stores: Vec<StoreUsage>,
    /// Exported bindings.
    pub exports: Vec<ExportDecl>,
    /// Markup elements.
    pub elements: Vec<ElementRef>,
    /// Declared identifiers.
    pub identifiers: Vec<Identifier>,
    /// Extraction outcome.
    pub status: ParseStatus,
}

impl SourceFileIR {
    /// Creates an IR with no facts.
    #[must_use]
    pub fn empty(path: impl Into<PathBuf>, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            kind,
            line_count: 0,
            props: Vec::new(),
            events: Vec::new(),
            reactive: Vec::new(),
            imports: Vec::new(),
            stores: Vec::new(),
            exports: Vec::new(),
            elements: Vec::new(),
            identifiers: Vec::new(),
            status: ParseStatus::Ok,
        }
    }

    /// Creates an IR for a file whose tree could not be used.
    #[must_use]
    pub fn failed(path: impl Into<PathBuf>, kind: FileKind, reason: impl Into<String>) -> Self {
        let mut ir = Self::empty(path, kind);
        ir.status = ParseStatus::Failed(reason.into());
        ir
    }

    /// Returns true if extraction failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, ParseStatus::Failed(_))
    }

    /// Returns the file stem up to the first `.` (e.g. `user` for `user.store.ts`).
    #[must_use]
    pub fn base_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.split('.').next())
            .unwrap_or_default()
    }

    /// Returns the file stem without the last extension (e.g. `user.store` for `user.store.ts`).
    #[must_use]
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_ir_has_no_facts() {
        let ir = SourceFileIR::failed("src/Broken.svelte", FileKind::Component, "bad tree");
        assert!(ir.is_failed());
        assert_eq!(ir.status.failure(), Some("bad tree"));
        assert!(ir.props.is_empty());
    }

    #[test]
    fn stem_and_base_name() {
        let ir = SourceFileIR::empty("src/lib/stores/user.store.ts", FileKind::Store);
        assert_eq!(ir.stem(), "user.store");
        assert_eq!(ir.base_name(), "user");
    }

    #[test]
    fn parse_status_round_trips_through_json() {
        let status = ParseStatus::Failed("missing root".into());
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"status":"failed","reason":"missing root"}"#);
    }
}
