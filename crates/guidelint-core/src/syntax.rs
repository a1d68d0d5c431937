//! Syntax tree handed over by the external parser.
//!
//! The engine never parses source text. A parser adapter outside this
//! crate emits a [`SyntaxNode`] tree (usually as JSON) using the node kinds
//! listed in [`kinds`]; the extractor walks it once and drops it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Node kinds understood by the extractor. Other kinds are walked but ignored.
pub mod kinds {
    /// Tree root. Must be the top node.
    pub const ROOT: &str = "Root";
    /// Markup section of a component.
    pub const MARKUP: &str = "Markup";
    /// `<script>` block or script module body.
    pub const SCRIPT: &str = "Script";
    /// Markup element; `name` is the tag, `attrs` its attributes.
    pub const ELEMENT: &str = "Element";
    /// Component prop; attrs `type`, `default`, `bindable`.
    pub const PROP: &str = "Prop";
    /// Component event; attr `type`.
    pub const EVENT: &str = "Event";
    /// `$derived(...)`.
    pub const DERIVED: &str = "Derived";
    /// `$effect(...)`.
    pub const EFFECT: &str = "Effect";
    /// Legacy `$:` statement.
    pub const REACTIVE_STATEMENT: &str = "ReactiveStatement";
    /// Import statement; `name` is the module specifier, attr `type_only`.
    pub const IMPORT: &str = "Import";
    /// Imported binding, child of an import.
    pub const SPECIFIER: &str = "Specifier";
    /// Store read; `name` is the store, attr `access` = auto | subscribe | get.
    pub const STORE_READ: &str = "StoreRead";
    /// Export; attrs `kind`, `params_typed`, `return_typed`, `types`.
    pub const EXPORT: &str = "Export";
    /// Declared identifier; attr `role`.
    pub const IDENTIFIER: &str = "Identifier";
    /// Parser error-recovery node; attr `message`.
    pub const ERROR: &str = "Error";
}

/// One node of the external syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxNode {
    /// Node kind (see [`kinds`]).
    pub kind: String,
    /// Optional name (tag, identifier, module specifier).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Line number (1-indexed). Zero means "no position".
    #[serde(default)]
    pub line: usize,
    /// Column number (1-indexed).
    #[serde(default)]
    pub column: usize,
    /// Free-form attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Child nodes in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Creates a node at the given position.
    #[must_use]
    pub fn new(kind: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind: kind.into(),
            name: None,
            line,
            column,
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Creates a `Root` node at 1:1.
    #[must_use]
    pub fn root() -> Self {
        Self::new(kinds::ROOT, 1, 1)
    }

    /// Sets the node name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Appends a child node.
    #[must_use]
    pub fn child(mut self, child: SyntaxNode) -> Self {
        self.children.push(child);
        self
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Returns true if the attribute is present and set to `"true"`.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get_attr(key) == Some("true")
    }

    /// Path segment used in node paths: `Kind` or `Kind[name]`.
    #[must_use]
    pub fn segment(&self) -> String {
        match &self.name {
            Some(name) => format!("{}[{name}]", self.kind),
            None => self.kind.clone(),
        }
    }

    /// Path segments of the children, in order. A child whose segment
    /// repeats an earlier sibling's gets an ordinal suffix (`Element[div]#1`),
    /// so every child of a node has a distinct path.
    #[must_use]
    pub fn child_segments(&self) -> Vec<String> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        self.children
            .iter()
            .map(|child| {
                let segment = child.segment();
                let count = seen.entry(segment.clone()).or_insert(0);
                let unique = if *count == 0 {
                    segment
                } else {
                    format!("{segment}#{count}")
                };
                *count += 1;
                unique
            })
            .collect()
    }
}

/// One entry of the file set: content plus the external parser's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the project root.
    pub path: PathBuf,
    /// Raw file content.
    pub content: String,
    /// Parsed tree, or the parser's error message.
    pub tree: Result<SyntaxNode, String>,
}

impl SourceFile {
    /// Creates a source file with a parsed tree.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>, tree: SyntaxNode) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            tree: Ok(tree),
        }
    }

    /// Creates a source file the parser rejected.
    #[must_use]
    pub fn unparsable(
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            tree: Err(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_sparse_json() {
        let json = r#"{
            "kind": "Root", "line": 1, "column": 1,
            "children": [
                { "kind": "Prop", "name": "label", "line": 3, "column": 9,
                  "attrs": { "type": "string" } }
            ]
        }"#;
        let node: SyntaxNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind, kinds::ROOT);
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].get_attr("type"), Some("string"));
        assert!(node.children[0].children.is_empty());
    }

    #[test]
    fn segment_includes_name() {
        let prop = SyntaxNode::new(kinds::PROP, 3, 9).named("label");
        assert_eq!(prop.segment(), "Prop[label]");
        assert_eq!(SyntaxNode::root().segment(), "Root");
    }

    #[test]
    fn repeated_sibling_segments_get_ordinals() {
        let markup = SyntaxNode::new(kinds::MARKUP, 4, 1)
            .child(SyntaxNode::new(kinds::ELEMENT, 4, 1).named("div"))
            .child(SyntaxNode::new(kinds::ELEMENT, 4, 20).named("span"))
            .child(SyntaxNode::new(kinds::ELEMENT, 4, 40).named("div"))
            .child(SyntaxNode::new(kinds::ELEMENT, 4, 60).named("div"));
        assert_eq!(
            markup.child_segments(),
            vec!["Element[div]", "Element[span]", "Element[div]#1", "Element[div]#2"]
        );
    }

    #[test]
    fn flag_requires_true() {
        let node = SyntaxNode::new(kinds::PROP, 1, 1)
            .attr("bindable", "true")
            .attr("default", "false");
        assert!(node.flag("bindable"));
        assert!(!node.flag("default"));
        assert!(!node.flag("missing"));
    }
}
