//! Source extractor: syntax tree → [`SourceFileIR`].
//!
//! Walks the external tree exactly once with an explicit stack, copying out
//! the facts rules need. A malformed tree never raises; it produces an IR
//! whose status is [`ParseStatus::Failed`] and whose fact lists are empty.

use std::path::{Component, Path};
use tracing::debug;

use crate::ir::{
    ElementRef, EventDecl, ExportDecl, ExportKind, FileKind, Identifier, IdentifierRole,
    ImportRef, NodeSite, ParseStatus, PropDecl, ReactiveDecl, ReactiveKind, SourceFileIR,
    StoreAccess, StoreUsage,
};
use crate::syntax::{kinds, SourceFile, SyntaxNode};

const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "pcss", "postcss"];

/// Extracts the IR of one file. Pure function of the file's content and tree.
#[must_use]
pub fn extract(file: &SourceFile) -> SourceFileIR {
    let tree = match &file.tree {
        Ok(tree) => tree,
        Err(reason) => {
            let kind = classify(&file.path, false);
            return SourceFileIR::failed(&file.path, kind, format!("parser error: {reason}"));
        }
    };

    let mut collector = Collector::new(&file.path);
    if let Err(reason) = collector.walk(tree) {
        let kind = classify(&file.path, false);
        return SourceFileIR::failed(&file.path, kind, reason);
    }

    let kind = classify(&file.path, collector.has_markup);
    let mut ir = collector.finish(kind);
    ir.line_count = file.content.lines().count();
    ir
}

/// Classifies a file by its path and whether its tree has a markup section.
#[must_use]
pub fn classify(path: &Path, has_markup: bool) -> FileKind {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let dirs: Vec<&str> = path
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    Component::Normal(s) => s.to_str(),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    if STYLE_EXTENSIONS.contains(&extension) {
        return FileKind::Style;
    }
    if file_name.starts_with('+') && dirs.contains(&"routes") {
        return FileKind::Route;
    }
    if extension == "svelte" || has_markup {
        return FileKind::Component;
    }
    if stem.ends_with(".store") || stem.ends_with("Store") || dirs.contains(&"stores") {
        return FileKind::Store;
    }
    if dirs.windows(2).any(|w| w == ["lib", "apis"]) {
        return FileKind::ApiModule;
    }
    FileKind::Module
}

/// Accumulates facts during the walk.
struct Collector {
    has_markup: bool,
    ir: SourceFileIR,
}

impl Collector {
    fn new(path: &Path) -> Self {
        Self {
            has_markup: false,
            ir: SourceFileIR::empty(path, FileKind::Module),
        }
    }

    fn finish(mut self, kind: FileKind) -> SourceFileIR {
        self.ir.kind = kind;
        self.ir.status = ParseStatus::Ok;
        self.ir
    }

    /// Depth-first, pre-order walk. Children are pushed in reverse so facts
    /// come out in source order.
    fn walk(&mut self, root: &SyntaxNode) -> Result<(), String> {
        if root.kind != kinds::ROOT {
            return Err(format!(
                "expected `{}` at the top of the tree, found `{}`",
                kinds::ROOT,
                root.kind
            ));
        }

        let mut stack: Vec<(&SyntaxNode, String)> = vec![(root, root.segment())];
        while let Some((node, node_path)) = stack.pop() {
            self.visit(node, &node_path)?;
            let segments = node.child_segments();
            for (child, segment) in node.children.iter().zip(segments).rev() {
                stack.push((child, format!("{node_path}/{segment}")));
            }
        }
        Ok(())
    }

    fn visit(&mut self, node: &SyntaxNode, node_path: &str) -> Result<(), String> {
        if node.kind.is_empty() {
            return Err(format!("node without a kind under `{node_path}`"));
        }
        if node.line == 0 {
            return Err(format!("`{node_path}` has no source position"));
        }
        let site = NodeSite::new(node.line, node.column.max(1), node_path);

        match node.kind.as_str() {
            kinds::ERROR => {
                return Err(format!(
                    "parser error at {}:{}: {}",
                    site.line,
                    site.column,
                    node.get_attr("message").unwrap_or("unrecognized syntax")
                ));
            }
            kinds::MARKUP => self.has_markup = true,
            kinds::PROP => {
                let name = required_name(node, node_path)?;
                self.ir.props.push(PropDecl {
                    name,
                    type_annotation: node
                        .get_attr("type")
                        .filter(|t| !t.trim().is_empty())
                        .map(str::to_string),
                    has_default: node.flag("default"),
                    bindable: node.flag("bindable"),
                    site,
                });
            }
            kinds::EVENT => {
                let name = required_name(node, node_path)?;
                let typed = node.get_attr("type").is_some_and(|t| !t.trim().is_empty());
                self.ir.events.push(EventDecl { name, typed, site });
            }
            kinds::DERIVED => self.push_reactive(ReactiveKind::Derived, site),
            kinds::EFFECT => self.push_reactive(ReactiveKind::Effect, site),
            kinds::REACTIVE_STATEMENT => self.push_reactive(ReactiveKind::Legacy, site),
            kinds::IMPORT => {
                let source = required_name(node, node_path)?;
                let specifiers = node
                    .children
                    .iter()
                    .filter(|c| c.kind == kinds::SPECIFIER)
                    .filter_map(|c| c.name.clone())
                    .collect();
                self.ir.imports.push(ImportRef {
                    source,
                    specifiers,
                    type_only: node.flag("type_only"),
                    site,
                });
            }
            kinds::STORE_READ => {
                let store = required_name(node, node_path)?;
                let access = match node.get_attr("access") {
                    None | Some("auto") => StoreAccess::Auto,
                    Some("subscribe") => StoreAccess::Subscribe,
                    Some("get") => StoreAccess::Get,
                    Some(other) => {
                        debug!("`{node_path}`: ignoring store read with access `{other}`");
                        return Ok(());
                    }
                };
                self.ir.stores.push(StoreUsage {
                    store,
                    access,
                    site,
                });
            }
            kinds::EXPORT => {
                let name = required_name(node, node_path)?;
                let kind = match node.get_attr("kind") {
                    Some("function") => ExportKind::Function,
                    None | Some("const") => ExportKind::Const,
                    Some("type" | "interface") => ExportKind::Type,
                    Some("class") => ExportKind::Class,
                    Some(other) => {
                        debug!("`{node_path}`: export kind `{other}` recorded as other");
                        ExportKind::Other
                    }
                };
                let type_annotations = node
                    .get_attr("types")
                    .map(|t| {
                        t.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                self.ir.exports.push(ExportDecl {
                    name,
                    kind,
                    params_typed: node.flag("params_typed"),
                    return_typed: node.flag("return_typed"),
                    type_annotations,
                    site,
                });
            }
            kinds::ELEMENT => {
                let tag = required_name(node, node_path)?;
                self.ir.elements.push(ElementRef {
                    tag,
                    attributes: node.attrs.keys().cloned().collect(),
                    site,
                });
            }
            kinds::IDENTIFIER => {
                let name = required_name(node, node_path)?;
                let role = match node.get_attr("role") {
                    None | Some("variable") => IdentifierRole::Variable,
                    Some("constant") => IdentifierRole::Constant,
                    Some("function") => IdentifierRole::Function,
                    Some("parameter") => IdentifierRole::Parameter,
                    Some("type") => IdentifierRole::Type,
                    Some(other) => {
                        debug!("`{node_path}`: ignoring identifier with role `{other}`");
                        return Ok(());
                    }
                };
                self.ir.identifiers.push(Identifier { name, role, site });
            }
            _ => {}
        }
        Ok(())
    }

    fn push_reactive(&mut self, kind: ReactiveKind, site: NodeSite) {
        self.ir.reactive.push(ReactiveDecl { kind, site });
    }
}

fn required_name(node: &SyntaxNode, node_path: &str) -> Result<String, String> {
    node.name
        .clone()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| format!("`{node_path}` ({}) has no name", node.kind))
}
