//! Common types and utilities for the API catalog compiler
//!
//! This crate contains the catalog data model, the error taxonomy and the
//! configuration shared by the parser, catalog and CLI components.

pub mod catalog;
pub mod config;

pub use catalog::{
    ApiCatalog, ApiCategory, ApiSubcategory, CatalogEndpoint, EndpointMatch, EndpointParameter,
    EndpointResponse, IntentMapping, RelatedEndpoint, UsageExample,
};
pub use config::{
    CacheSettings, CatalogConfig, CollisionPolicy, GroupBy, GroupingSettings, IdSettings,
    ResolverSettings,
};

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while compiling or querying a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Discovery error in {}: {message}", path.display())]
    Discovery { path: PathBuf, message: String },

    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid API document {}: {message}", path.display())]
    Validation { path: PathBuf, message: String },

    #[error("Resolve error in {}: {message}", path.display())]
    Resolve { path: PathBuf, message: String },

    #[error("Duplicate endpoint id '{id}' (defined by {first} and {second})")]
    DuplicateEndpointId {
        id: String,
        first: String,
        second: String,
    },

    #[error("Catalog not loaded")]
    NotLoaded,

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Pipeline stage an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Discovery,
    Parse,
    Resolve,
    Map,
    Cache,
    Config,
    Render,
    Lookup,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadStage::Discovery => "discovery",
            LoadStage::Parse => "parse",
            LoadStage::Resolve => "resolve",
            LoadStage::Map => "map",
            LoadStage::Cache => "cache",
            LoadStage::Config => "config",
            LoadStage::Render => "render",
            LoadStage::Lookup => "lookup",
        };
        f.write_str(name)
    }
}

impl CatalogError {
    /// Stage of the load pipeline that produced this error
    pub fn stage(&self) -> LoadStage {
        match self {
            CatalogError::Discovery { .. } | CatalogError::Io(_) => LoadStage::Discovery,
            CatalogError::Parse { .. }
            | CatalogError::Validation { .. }
            | CatalogError::Json(_)
            | CatalogError::Yaml(_) => LoadStage::Parse,
            CatalogError::Resolve { .. } => LoadStage::Resolve,
            CatalogError::DuplicateEndpointId { .. } => LoadStage::Map,
            CatalogError::NotLoaded => LoadStage::Lookup,
            CatalogError::Cache(_) => LoadStage::Cache,
            CatalogError::Config(_) => LoadStage::Config,
            CatalogError::Render(_) => LoadStage::Render,
        }
    }
}

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
