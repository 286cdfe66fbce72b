//! Content-addressed build cache. Keyed by absolute source path; valid
//! iff source hash, output presence + hash, and dependency hash (sorted
//! transitive internal import hashes) all still match.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dingo_foundation::DiagnosticError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub output_path: PathBuf,
    pub output_hash: String,
    pub dependency_hash: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BuildCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

impl BuildCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a cache file, or an empty cache if it doesn't exist yet —
    /// a first build always misses everything.
    pub fn load(path: &Path) -> Result<Self, DiagnosticError> {
        if !path.is_file() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path).map_err(|e| DiagnosticError::Internal {
            message: format!("failed to read {}: {e}", path.display()),
            context: "build cache".to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| DiagnosticError::Internal {
            message: format!("failed to parse {}: {e}", path.display()),
            context: "build cache".to_string(),
        })
    }

    /// Writes the cache via a temp-file-plus-rename so a crash mid-write
    /// never leaves a half-written cache file behind.
    pub fn save(&self, path: &Path) -> Result<(), DiagnosticError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| DiagnosticError::Internal {
            message: format!("failed to serialize build cache: {e}"),
            context: "build cache".to_string(),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DiagnosticError::Internal {
                message: format!("failed to create {}: {e}", parent.display()),
                context: "build cache".to_string(),
            })?;
        }

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| DiagnosticError::Internal {
            message: format!("failed to write {}: {e}", tmp.display()),
            context: "build cache".to_string(),
        })?;
        std::fs::rename(&tmp, path).map_err(|e| DiagnosticError::Internal {
            message: format!("failed to rename {} to {}: {e}", tmp.display(), path.display()),
            context: "build cache".to_string(),
        })?;
        Ok(())
    }

    /// Whether the cached entry for `source_path` is still good, given
    /// the source's current hash and the freshly computed dependency hash.
    pub fn is_valid(&self, source_path: &Path, source_hash: &str, dependency_hash: &str) -> bool {
        let Some(entry) = self.entries.get(source_path) else { return false };
        entry.source_hash == source_hash
            && entry.dependency_hash == dependency_hash
            && entry.output_path.is_file()
            && hash_file(&entry.output_path).map(|h| h == entry.output_hash).unwrap_or(false)
    }

    pub fn record(&mut self, source_path: PathBuf, entry: CacheEntry) {
        self.entries.insert(source_path, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

pub fn hash_file(path: &Path) -> Result<String, DiagnosticError> {
    let data = std::fs::read(path).map_err(|e| DiagnosticError::Internal {
        message: format!("failed to read {}: {e}", path.display()),
        context: "build cache".to_string(),
    })?;
    Ok(hash_bytes(&data))
}

/// Combines a package's transitive internal import hashes into one
/// dependency hash. Sorted first so hash order doesn't depend on
/// traversal order.
pub fn dependency_hash(transitive_hashes: &[String]) -> String {
    let mut sorted = transitive_hashes.to_vec();
    sorted.sort();
    hash_bytes(sorted.join("\n").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_an_atomic_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("cache.json");

        let mut cache = BuildCache::new();
        cache.record(
            PathBuf::from("/ws/pkg/auth/login.dingo"),
            CacheEntry {
                source_hash: "abc".to_string(),
                output_path: PathBuf::from("/out/pkg/auth/login.go"),
                output_hash: "def".to_string(),
                dependency_hash: "ghi".to_string(),
            },
        );
        cache.save(&cache_path).unwrap();
        assert!(!dir.path().join("cache.json.tmp").exists());

        let loaded = BuildCache::load(&cache_path).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn missing_cache_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BuildCache::load(&dir.path().join("nope.json")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn entry_is_invalid_when_output_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = BuildCache::new();
        let source = dir.path().join("login.dingo");
        std::fs::write(&source, "package auth\n").unwrap();

        cache.record(
            source.clone(),
            CacheEntry {
                source_hash: "abc".to_string(),
                output_path: dir.path().join("login.go"),
                output_hash: "def".to_string(),
                dependency_hash: "ghi".to_string(),
            },
        );

        assert!(!cache.is_valid(&source, "abc", "ghi"));
    }

    #[test]
    fn entry_is_valid_when_everything_still_matches() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = BuildCache::new();
        let source = dir.path().join("login.dingo");
        let output = dir.path().join("login.go");
        std::fs::write(&output, b"package auth\n").unwrap();
        let output_hash = hash_file(&output).unwrap();

        cache.record(
            source.clone(),
            CacheEntry {
                source_hash: "abc".to_string(),
                output_path: output,
                output_hash,
                dependency_hash: "ghi".to_string(),
            },
        );

        assert!(cache.is_valid(&source, "abc", "ghi"));
        assert!(!cache.is_valid(&source, "changed", "ghi"));
        assert!(!cache.is_valid(&source, "abc", "changed"));
    }

    #[test]
    fn dependency_hash_is_order_independent() {
        let a = dependency_hash(&["h1".to_string(), "h2".to_string()]);
        let b = dependency_hash(&["h2".to_string(), "h1".to_string()]);
        assert_eq!(a, b);
    }
}
