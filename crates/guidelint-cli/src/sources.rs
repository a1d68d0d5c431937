//! File sets read from parser output on disk.
//!
//! The parser runs before guidelint and leaves one JSON syntax tree per
//! source file. [`SidecarSource`] finds them next to the sources
//! (`Button.svelte` + `Button.svelte.ast.json`); [`ManifestSource`] reads
//! an explicit list. Either way a tree document is a [`SyntaxNode`] rooted
//! at `Root`, or `{ "error": "..." }` when the parser gave up.

use guidelint_core::{SourceError, SourceFile, SourceProvider, SyntaxNode};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Suffix of syntax-tree sidecar files.
pub const SIDECAR_SUFFIX: &str = ".ast.json";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ParseFailure {
    error: String,
}

/// Source files discovered through their sidecars under a root directory.
#[derive(Debug, Clone)]
pub struct SidecarSource {
    root: PathBuf,
}

impl SidecarSource {
    /// Creates a provider rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceProvider for SidecarSource {
    fn enumerate(&self) -> Result<Vec<PathBuf>, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::Enumerate {
                message: format!("{} is not a directory", self.root.display()),
            });
        }

        let mut builder = ignore::WalkBuilder::new(&self.root);
        builder.hidden(false).git_ignore(true);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry.map_err(|e| SourceError::Enumerate {
                message: e.to_string(),
            })?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            let Some(source_name) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(SIDECAR_SUFFIX))
                .filter(|n| !n.is_empty())
            else {
                continue;
            };
            let rel = path.strip_prefix(&self.root).unwrap_or(path);
            files.push(rel.with_file_name(source_name));
        }

        files.sort();
        tracing::debug!("Found {} sidecar(s) under {}", files.len(), self.root.display());
        Ok(files)
    }

    fn load(&self, path: &Path) -> Result<SourceFile, SourceError> {
        let source = self.root.join(path);
        load_pair(path, &source, &sidecar_path(&source))
    }
}

/// One `files` entry of a manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    path: PathBuf,
    #[serde(default)]
    tree: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    root: Option<PathBuf>,
    files: Vec<ManifestEntry>,
}

/// Source files listed in a JSON manifest:
///
/// ```json
/// { "root": "..", "files": [ { "path": "src/lib/Button.svelte", "tree": "out/Button.json" } ] }
/// ```
///
/// `root` (default: the manifest's directory) anchors relative paths.
/// `tree` defaults to the sidecar next to the source.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    root: PathBuf,
    entries: Vec<ManifestEntry>,
}

impl ManifestSource {
    /// Reads and validates a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Enumerate`] if the manifest cannot be read
    /// or decoded; the run cannot proceed without its file set.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path).map_err(|e| SourceError::Enumerate {
            message: format!("{}: {e}", path.display()),
        })?;
        Self::parse(&content, path.parent().unwrap_or(Path::new(".")))
    }

    /// Parses a manifest whose relative paths are anchored at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Enumerate`] for malformed JSON.
    pub fn parse(content: &str, base: &Path) -> Result<Self, SourceError> {
        let manifest: Manifest =
            serde_json::from_str(content).map_err(|e| SourceError::Enumerate {
                message: format!("invalid manifest: {e}"),
            })?;
        let root = manifest
            .root
            .map_or_else(|| base.to_path_buf(), |r| base.join(r));
        Ok(Self {
            root,
            entries: manifest.files,
        })
    }
}

impl SourceProvider for ManifestSource {
    fn enumerate(&self) -> Result<Vec<PathBuf>, SourceError> {
        Ok(self.entries.iter().map(|e| e.path.clone()).collect())
    }

    fn load(&self, path: &Path) -> Result<SourceFile, SourceError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.path == path)
            .ok_or(SourceError::NotFound)?;
        let source = self.root.join(&entry.path);
        let tree = entry
            .tree
            .as_ref()
            .map_or_else(|| sidecar_path(&source), |t| self.root.join(t));
        load_pair(path, &source, &tree)
    }
}

/// `<source>.ast.json`
fn sidecar_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_os_string();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

fn load_pair(rel: &Path, source: &Path, tree: &Path) -> Result<SourceFile, SourceError> {
    let content = match std::fs::read_to_string(source) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(SourceError::NotFound),
        Err(e) => {
            return Err(SourceError::Unreadable {
                message: format!("{}: {e}", source.display()),
            })
        }
    };
    let document = std::fs::read_to_string(tree).map_err(|e| SourceError::Unreadable {
        message: format!("syntax tree {}: {e}", tree.display()),
    })?;
    Ok(parse_tree(rel, content, &document))
}

/// A tree document that fails to decode counts as a parse failure of the
/// source file, not as a load error.
fn parse_tree(rel: &Path, content: String, document: &str) -> SourceFile {
    if let Ok(failure) = serde_json::from_str::<ParseFailure>(document) {
        return SourceFile::unparsable(rel, content, failure.error);
    }
    match serde_json::from_str::<SyntaxNode>(document) {
        Ok(tree) => SourceFile::new(rel, content, tree),
        Err(e) => SourceFile::unparsable(rel, content, format!("invalid syntax tree: {e}")),
    }
}
