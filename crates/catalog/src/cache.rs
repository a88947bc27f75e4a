//! Persistent catalog cache
//!
//! One JSON file per fingerprint. The fingerprint hashes the sorted
//! `(file name, mtime)` pairs of every source document, so discovery order
//! does not matter and touching any file changes the key.
//!
//! The cache is an optimization only: every read or write failure is logged
//! and treated as a miss or a skipped write.

use api_catalog_common::{ApiCatalog, CacheSettings, CatalogError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// File name and modification time of one source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStamp {
    pub path: PathBuf,
    /// Milliseconds since the Unix epoch
    pub modified_ms: u64,
}

impl SourceStamp {
    pub fn new(path: impl Into<PathBuf>, modified_ms: u64) -> Self {
        Self {
            path: path.into(),
            modified_ms,
        }
    }

    /// Stat a file
    pub fn from_path(path: &Path) -> Result<Self> {
        let modified = fs::metadata(path)?.modified()?;
        Ok(Self::new(path, millis_since_epoch(modified)))
    }

    /// Key of this source in [`CacheEntry::sources`]
    pub fn key(&self) -> String {
        self.path.display().to_string()
    }

    /// Base name used in the fingerprint
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Serialized cache file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    /// Source path -> mtime in milliseconds at compile time
    pub sources: BTreeMap<String, u64>,
    pub catalog: ApiCatalog,
}

/// On-disk catalog cache
#[derive(Debug, Clone)]
pub struct CatalogCache {
    dir: PathBuf,
    ttl: Duration,
}

impl CatalogCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.dir.clone(), settings.ttl())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lowercase hex SHA-256 over sorted `name-mtime` pairs joined by `|`
    pub fn fingerprint(stamps: &[SourceStamp]) -> String {
        let mut pairs: Vec<String> = stamps
            .iter()
            .map(|s| format!("{}-{}", s.name(), s.modified_ms))
            .collect();
        pairs.sort();

        let digest = Sha256::digest(pairs.join("|").as_bytes());
        format!("{:x}", digest)
    }

    pub fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{}.json", fingerprint))
    }

    /// Stat every path, skipping files that cannot be read
    pub fn stamp_sources(paths: &[PathBuf]) -> Vec<SourceStamp> {
        paths
            .iter()
            .filter_map(|path| match SourceStamp::from_path(path) {
                Ok(stamp) => Some(stamp),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot stat source document");
                    None
                }
            })
            .collect()
    }

    /// Look up the catalog compiled from exactly these sources
    pub fn get(&self, stamps: &[SourceStamp]) -> Option<ApiCatalog> {
        self.get_at(stamps, SystemTime::now())
    }

    /// [`get`](Self::get) with an explicit clock
    pub fn get_at(&self, stamps: &[SourceStamp], now: SystemTime) -> Option<ApiCatalog> {
        let fingerprint = Self::fingerprint(stamps);
        let path = self.entry_path(&fingerprint);

        let stored_at = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => {
                debug!(%fingerprint, "Cache miss: no entry");
                return None;
            }
        };

        let age = now.duration_since(stored_at).unwrap_or(Duration::ZERO);
        if age > self.ttl {
            debug!(%fingerprint, age_secs = age.as_secs(), "Cache miss: entry expired");
            return None;
        }

        let entry = match self.read_entry(&path) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };

        if entry.fingerprint != fingerprint {
            warn!(path = %path.display(), "Ignoring cache entry with mismatched fingerprint");
            return None;
        }

        let stored_ms = millis_since_epoch(stored_at);
        for stamp in stamps {
            let key = stamp.key();
            let recorded = entry.sources.get(&key).copied();
            if recorded.map_or(true, |ms| stamp.modified_ms > ms) || stamp.modified_ms > stored_ms {
                debug!(%fingerprint, source = %key, "Cache miss: source modified after caching");
                return None;
            }
        }

        info!(
            %fingerprint,
            created_at = %entry.created_at,
            "Loaded API catalog from cache"
        );
        Some(entry.catalog)
    }

    /// Store a catalog under the fingerprint of its sources
    pub fn put(&self, catalog: &ApiCatalog, stamps: &[SourceStamp]) {
        let entry = CacheEntry {
            fingerprint: Self::fingerprint(stamps),
            created_at: Utc::now(),
            sources: stamps.iter().map(|s| (s.key(), s.modified_ms)).collect(),
            catalog: catalog.clone(),
        };

        match self.write_entry(&entry) {
            Ok(path) => info!(path = %path.display(), "Wrote API catalog cache"),
            Err(e) => warn!(dir = %self.dir.display(), error = %e, "Skipping cache write"),
        }
    }

    /// Delete every cache entry, returning how many were removed
    pub fn invalidate_all(&self) -> usize {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.dir.display(), error = %e, "No cache directory to clear");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove cache entry"),
                }
            }
        }

        info!(dir = %self.dir.display(), removed, "Cleared API catalog cache");
        removed
    }

    fn read_entry(&self, path: &Path) -> Result<CacheEntry> {
        let content = fs::read_to_string(path)?;
        let entry = serde_json::from_str(&content)?;
        Ok(entry)
    }

    fn write_entry(&self, entry: &CacheEntry) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            CatalogError::Cache(format!(
                "Failed to create cache directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.entry_path(&entry.fingerprint);
        let json = serde_json::to_string(entry)?;
        fs::write(&path, json).map_err(|e| {
            CatalogError::Cache(format!("Failed to write {}: {}", path.display(), e))
        })?;
        Ok(path)
    }
}

fn millis_since_epoch(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
