//! Catalog configuration loading from YAML files
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration. Environment variables can override the values most
//! likely to differ between machines.

use crate::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root structure for catalog configuration files
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory searched recursively for API documents
    pub catalog_path: PathBuf,
    /// Persistent catalog cache
    pub cache: CacheSettings,
    /// Reference resolution limits
    pub resolver: ResolverSettings,
    /// How operations are grouped into categories
    pub grouping: GroupingSettings,
    /// Endpoint identifier policy
    pub ids: IdSettings,
}

/// Persistent cache settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Directory holding one `<fingerprint>.json` per cache key
    pub dir: PathBuf,
    /// Entry lifetime in seconds, measured from the entry file's mtime
    pub ttl_secs: u64,
}

/// Reference resolver settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Maximum nesting depth of a resolution walk
    pub max_depth: usize,
}

/// Category grouping settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GroupingSettings {
    pub group_by: GroupBy,
    /// Prefixes stripped from `info.title` to form category names
    pub title_prefixes: Vec<String>,
    /// In document mode, split each category into per-tag subcategories
    pub subcategories_by_tag: bool,
}

/// Category grouping policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// One category per document title
    Document,
    /// One category per first declared tag
    Tag,
    /// One category per first non-version path segment
    PathPrefix,
}

/// Endpoint identifier settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IdSettings {
    pub on_collision: CollisionPolicy,
}

/// What to do when two endpoints map to the same identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Re-qualify the later endpoint with its document stem
    Disambiguate,
    /// Fail the catalog build
    Reject,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("./models"),
            cache: CacheSettings::default(),
            resolver: ResolverSettings::default(),
            grouping: GroupingSettings::default(),
            ids: IdSettings::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("./.cache"),
            ttl_secs: 24 * 60 * 60,
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

impl Default for GroupingSettings {
    fn default() -> Self {
        Self {
            group_by: GroupBy::Document,
            title_prefixes: vec!["Selling Partner API for ".to_string()],
            subcategories_by_tag: false,
        }
    }
}

impl Default for IdSettings {
    fn default() -> Self {
        Self {
            on_collision: CollisionPolicy::Disambiguate,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl CatalogConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_yaml_str(&content).map_err(|e| match e {
            CatalogError::Config(msg) => CatalogError::Config(format!("{:?}: {}", path, msg)),
            other => other,
        })
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(yaml)
            .map_err(|e| CatalogError::Config(format!("Failed to parse config YAML: {}", e)))
    }

    /// Apply `API_CATALOG_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("API_CATALOG_PATH").filter(|v| !v.is_empty()) {
            self.catalog_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("API_CATALOG_CACHE_DIR").filter(|v| !v.is_empty()) {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Some(ttl) = lookup("API_CATALOG_CACHE_TTL_SECS").filter(|v| !v.is_empty()) {
            self.cache.ttl_secs = ttl.trim().parse().map_err(|_| {
                CatalogError::Config(format!(
                    "API_CATALOG_CACHE_TTL_SECS must be a whole number of seconds, got '{}'",
                    ttl
                ))
            })?;
        }
        if lookup("API_CATALOG_CACHE_DISABLED").is_some_and(|v| !v.is_empty()) {
            self.cache.enabled = false;
        }

        Ok(self)
    }
}
