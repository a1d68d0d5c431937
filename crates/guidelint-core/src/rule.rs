//! Declarative rule definitions.
//!
//! A rule is plain data: an id, a severity, a scope and one [`Check`]
//! variant. The predicate behind each variant lives in the evaluator, so
//! the set of checkable things is closed and every rule serializes to a
//! stable form that feeds the rule-model version.

use serde::Serialize;

use crate::scope::{GlobPattern, ScopeSelector};
use crate::types::Severity;

/// Category of a rule, as grouped in the style guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// File and identifier naming.
    Naming,
    /// Type annotations.
    Typing,
    /// Reactivity and dependency boundaries.
    Scoping,
    /// Structural accessibility proxies.
    A11yProxy,
    /// File placement and size.
    Layout,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Naming => "naming",
            Self::Typing => "typing",
            Self::Scoping => "scoping",
            Self::A11yProxy => "a11y-proxy",
            Self::Layout => "layout",
        })
    }
}

/// Naming predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NamingCheck {
    /// The file stem is PascalCase.
    PascalCaseFileStem,
    /// The file stem ends with one of the suffixes.
    FileStemSuffix {
        /// Accepted suffixes (e.g. `Store`, `.store`).
        suffixes: Vec<String>,
    },
    /// Declared identifiers follow the case convention of their role.
    IdentifierCase,
    /// Event names are camelCase.
    CamelCaseEvents,
}

/// Type-annotation predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TypingCheck {
    /// Every prop declares a type.
    TypedProps,
    /// Bindable props declare a default value.
    BindableDefaults,
    /// No `any` in prop types or export signatures.
    NoAny,
    /// Events declare a payload type.
    TypedEvents,
    /// Exported functions annotate parameters and return type.
    TypedFunctionExports,
}

/// Reactivity and dependency-boundary predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ScopingCheck {
    /// No legacy `$:` reactive statements.
    NoLegacyReactive,
    /// No manual `.subscribe()` calls on stores.
    NoManualSubscribe,
    /// No imports whose source matches one of the patterns.
    ForbiddenImport {
        /// Module-specifier globs (e.g. `$lib/apis/**`).
        patterns: Vec<GlobPattern>,
        /// Whether `import type` statements are exempt.
        allow_type_only: bool,
    },
    /// No imports of `.svelte` components.
    NoComponentImports,
}

/// Structural accessibility proxies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum A11yCheck {
    /// `<img>` elements carry `alt`.
    ImgAlt,
    /// Click handlers on non-interactive elements come with a keyboard
    /// handler and a `role`.
    ClickNeedsKeyboard {
        /// Tags that are natively interactive.
        interactive: Vec<String>,
    },
}

/// File placement and size predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LayoutCheck {
    /// The file lives under a directory.
    UnderDirectory {
        /// Directory glob (e.g. `src/lib/stores/**`).
        dir: GlobPattern,
    },
    /// At most `max` props.
    MaxProps {
        /// Upper bound.
        max: usize,
    },
    /// At most `max` `$effect` declarations.
    MaxEffects {
        /// Upper bound.
        max: usize,
    },
}

/// The predicate of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "category", content = "check", rename_all = "kebab-case")]
pub enum Check {
    /// Naming predicate.
    Naming(NamingCheck),
    /// Typing predicate.
    Typing(TypingCheck),
    /// Scoping predicate.
    Scoping(ScopingCheck),
    /// Accessibility proxy.
    A11yProxy(A11yCheck),
    /// Layout predicate.
    Layout(LayoutCheck),
}

impl Check {
    /// Returns the category of this check.
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Self::Naming(_) => Category::Naming,
            Self::Typing(_) => Category::Typing,
            Self::Scoping(_) => Category::Scoping,
            Self::A11yProxy(_) => Category::A11yProxy,
            Self::Layout(_) => Category::Layout,
        }
    }
}

/// A checkable style-guide rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// Unique id (e.g. `SG-050`).
    pub id: String,
    /// Severity from the guide's MUST / SHOULD / MAY wording.
    pub severity: Severity,
    /// Files the rule applies to.
    pub scope: ScopeSelector,
    /// One-line description.
    pub description: String,
    /// The predicate.
    pub check: Check,
}

impl Rule {
    /// Creates a rule.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        severity: Severity,
        scope: ScopeSelector,
        description: impl Into<String>,
        check: Check,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            scope,
            description: description.into(),
            check,
        }
    }

    /// Returns a copy with a different severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Returns the rule's category.
    #[must_use]
    pub fn category(&self) -> Category {
        self.check.category()
    }
}
