//! Content-hash cache of extraction and evaluation results.
//!
//! Entries are keyed by file path and validated against the content hash
//! and the rule-model version they were computed under. A mismatch on
//! either is a miss. The map is sharded, so workers insert concurrently;
//! two workers computing the same file race harmlessly (same value).

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::evaluator::FileEvaluation;
use crate::ir::SourceFileIR;

/// Bumped when the on-disk layout changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// BLAKE3 hex digest of a file's content.
#[must_use]
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Errors of the persistent cache file.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache file could not be read or written.
    #[error("cache file {path}: {source}")]
    Io {
        /// Cache file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The cache file exists but cannot be decoded.
    #[error("cache file {path} is corrupt: {message}")]
    Corruption {
        /// Cache file path.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },
}

/// One memoized file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// File path, `/` separated.
    pub path: String,
    /// [`content_hash`] of the content the entry was computed from.
    pub content_hash: String,
    /// Rule-model version the findings were computed under.
    pub rule_version: String,
    /// Extracted IR.
    pub ir: SourceFileIR,
    /// Raw findings before waiver filtering.
    pub evaluation: FileEvaluation,
}

/// Counters since the cache was created or last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that required recomputation.
    pub misses: u64,
    /// Entries currently held.
    pub entries: usize,
}

#[derive(Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: Vec<CacheEntry>,
}

/// Shared, concurrently writable analysis cache.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: DashMap<String, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AnalysisCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `path` if it was computed from the same
    /// content under the same rule-model version.
    #[must_use]
    pub fn lookup(&self, path: &str, content_hash: &str, rule_version: &str) -> Option<CacheEntry> {
        let hit = self
            .entries
            .get(path)
            .filter(|e| e.content_hash == content_hash && e.rule_version == rule_version)
            .map(|e| e.value().clone());
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    /// Stores an entry, replacing any previous one for the same path.
    pub fn insert(&self, entry: CacheEntry) {
        self.entries.insert(entry.path.clone(), entry);
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops entries computed under another rule-model version.
    ///
    /// Returns the number of entries removed.
    pub fn evict_stale(&self, rule_version: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.rule_version == rule_version);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("evicted {removed} stale cache entries");
        }
        removed
    }

    /// Drops entries for paths not in `keep`.
    pub fn retain_paths(&self, keep: &std::collections::HashSet<String>) {
        self.entries.retain(|path, _| keep.contains(path));
    }

    /// Loads a cache file. A missing file yields an empty cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the file cannot be read and
    /// [`CacheError::Corruption`] if it cannot be decoded or was written
    /// by an incompatible version.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let file: CacheFile =
            serde_json::from_str(&content).map_err(|e| CacheError::Corruption {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        if file.version != CACHE_FORMAT_VERSION {
            return Err(CacheError::Corruption {
                path: path.to_path_buf(),
                message: format!(
                    "format version {} (expected {CACHE_FORMAT_VERSION})",
                    file.version
                ),
            });
        }

        let cache = Self::new();
        for entry in file.entries {
            cache.insert(entry);
        }
        info!("loaded {} cache entries from {}", cache.len(), path.display());
        Ok(cache)
    }

    /// Writes the cache as JSON, entries sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the file or its directory cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let mut entries: Vec<CacheEntry> =
            self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            entries,
        };

        let io_err = |source: std::io::Error| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let json = serde_json::to_string(&file).map_err(|e| io_err(e.into()))?;
        std::fs::write(path, json).map_err(io_err)?;
        debug!("saved {} cache entries to {}", file.entries.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FileKind;

    fn entry(path: &str, content: &str, version: &str) -> CacheEntry {
        CacheEntry {
            path: path.to_string(),
            content_hash: content_hash(content),
            rule_version: version.to_string(),
            ir: SourceFileIR::empty(path, FileKind::Component),
            evaluation: FileEvaluation::default(),
        }
    }

    #[test]
    fn hit_requires_same_content_and_version() {
        let cache = AnalysisCache::new();
        cache.insert(entry("src/A.svelte", "<div/>", "v1"));

        let h = content_hash("<div/>");
        assert!(cache.lookup("src/A.svelte", &h, "v1").is_some());
        assert!(cache.lookup("src/A.svelte", &h, "v2").is_none());
        assert!(cache
            .lookup("src/A.svelte", &content_hash("<span/>"), "v1")
            .is_none());
        assert!(cache.lookup("src/B.svelte", &h, "v1").is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn evict_stale_drops_other_generations() {
        let cache = AnalysisCache::new();
        cache.insert(entry("a", "x", "v1"));
        cache.insert(entry("b", "y", "v2"));
        assert_eq!(cache.evict_stale("v2"), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let cache = AnalysisCache::new();
        cache.insert(entry("src/B.svelte", "b", "v1"));
        cache.insert(entry("src/A.svelte", "a", "v1"));
        cache.save(&path).unwrap();

        let loaded = AnalysisCache::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded
            .lookup("src/A.svelte", &content_hash("a"), "v1")
            .is_some());
    }

    #[test]
    fn missing_file_is_a_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::load(&dir.path().join("absent.json")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn garbage_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AnalysisCache::load(&path),
            Err(CacheError::Corruption { .. })
        ));

        std::fs::write(&path, r#"{"version":99,"entries":[]}"#).unwrap();
        assert!(matches!(
            AnalysisCache::load(&path),
            Err(CacheError::Corruption { .. })
        ));
    }

    #[test]
    fn content_hash_is_full_digest() {
        assert_eq!(content_hash("abc").len(), 64);
        assert_ne!(content_hash("abc"), content_hash("abd"));
    }
}
