//! API catalog compilation
//!
//! Turns processed API documents into an [`ApiCatalog`] and keeps it
//! available for lookups:
//! - [`CatalogMapper`]: operations -> categorized endpoints
//! - [`intent`]: "I want to ..." phrases mapped to endpoints
//! - [`CatalogCache`]: fingerprinted on-disk cache of compiled catalogs
//! - [`CatalogLoader`]: load/refresh state machine tying the pipeline together
//! - [`CatalogRenderer`]: Markdown views for the command line
//!
//! [`ApiCatalog`]: api_catalog_common::ApiCatalog

pub mod cache;
pub mod intent;
pub mod loader;
pub mod mapper;
pub mod render;

pub use cache::{CacheEntry, CatalogCache, SourceStamp};
pub use loader::{CatalogLoader, CatalogState};
pub use mapper::CatalogMapper;
pub use render::CatalogRenderer;
