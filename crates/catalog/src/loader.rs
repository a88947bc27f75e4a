//! Catalog loading orchestrator
//!
//! `CatalogLoader` owns the held catalog and moves between three states:
//! `Unloaded`, `Loading` (only while a compile is running) and `Loaded`.
//! A load either adopts a cached catalog or runs the full pipeline
//! (discover, parse, resolve, map). Failures leave the loader unloaded;
//! there is never a partially built catalog.

use crate::cache::{CatalogCache, SourceStamp};
use crate::mapper::CatalogMapper;
use api_catalog_common::{
    ApiCatalog, ApiCategory, CatalogConfig, CatalogError, EndpointMatch, Result,
};
use api_catalog_parser::DocumentLoader;
use std::time::Instant;
use tracing::{error, info};

/// Observable loader state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogState {
    Unloaded,
    Loading,
    Loaded,
}

#[derive(Debug)]
enum LoadState {
    Unloaded,
    Loading,
    Loaded(ApiCatalog),
}

/// Loads, holds and queries the API catalog
#[derive(Debug)]
pub struct CatalogLoader {
    config: CatalogConfig,
    documents: DocumentLoader,
    mapper: CatalogMapper,
    cache: Option<CatalogCache>,
    state: LoadState,
}

impl CatalogLoader {
    pub fn new(config: CatalogConfig) -> Self {
        let documents = DocumentLoader::new().with_max_depth(config.resolver.max_depth);
        let mapper = CatalogMapper::from_config(&config);
        let cache = config
            .cache
            .enabled
            .then(|| CatalogCache::from_settings(&config.cache));

        Self {
            config,
            documents,
            mapper,
            cache,
            state: LoadState::Unloaded,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn state(&self) -> CatalogState {
        match self.state {
            LoadState::Unloaded => CatalogState::Unloaded,
            LoadState::Loading => CatalogState::Loading,
            LoadState::Loaded(_) => CatalogState::Loaded,
        }
    }

    /// Return the held catalog, loading it first if needed
    pub fn load_catalog(&mut self) -> Result<&ApiCatalog> {
        if !matches!(self.state, LoadState::Loaded(_)) {
            self.state = LoadState::Loading;
            let started = Instant::now();

            match self.compile() {
                Ok(catalog) => {
                    info!(
                        categories = catalog.categories.len(),
                        endpoints = catalog.total_endpoints(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "API catalog loaded"
                    );
                    self.state = LoadState::Loaded(catalog);
                }
                Err(e) => {
                    error!(stage = %e.stage(), error = %e, "Failed to load API catalog");
                    self.state = LoadState::Unloaded;
                    return Err(e);
                }
            }
        }

        self.catalog()
    }

    /// Drop the held catalog and load again
    ///
    /// The persistent cache is still consulted; call
    /// [`invalidate_cache`](Self::invalidate_cache) first for a cold rebuild.
    pub fn refresh_catalog(&mut self) -> Result<&ApiCatalog> {
        info!("Refreshing API catalog");
        self.state = LoadState::Unloaded;
        self.load_catalog()
    }

    /// Delete every persistent cache entry, returning how many were removed
    pub fn invalidate_cache(&self) -> usize {
        self.cache.as_ref().map_or(0, CatalogCache::invalidate_all)
    }

    /// The held catalog, or `NotLoaded`
    pub fn catalog(&self) -> Result<&ApiCatalog> {
        match &self.state {
            LoadState::Loaded(catalog) => Ok(catalog),
            _ => Err(CatalogError::NotLoaded),
        }
    }

    /// Case-insensitive category lookup
    pub fn category_by_name(&self, name: &str) -> Result<Option<&ApiCategory>> {
        Ok(self.catalog()?.category_by_name(name))
    }

    pub fn endpoint_by_id(&self, id: &str) -> Result<Option<EndpointMatch<'_>>> {
        Ok(self.catalog()?.endpoint_by_id(id))
    }

    pub fn total_endpoints(&self) -> Result<usize> {
        Ok(self.catalog()?.total_endpoints())
    }

    fn compile(&self) -> Result<ApiCatalog> {
        let root = &self.config.catalog_path;
        info!(root = %root.display(), "Loading API catalog");

        let files = self.documents.discover(root)?;

        let stamps: Vec<SourceStamp> = match &self.cache {
            Some(_) => CatalogCache::stamp_sources(&files),
            None => Vec::new(),
        };
        if let Some(catalog) = self.cache.as_ref().and_then(|c| c.get(&stamps)) {
            return Ok(catalog);
        }

        let sources = self.documents.load_files(&files);
        let processed = self.documents.process_all(&sources)?;
        let catalog = self.mapper.map(&processed)?;

        if let Some(cache) = &self.cache {
            cache.put(&catalog, &stamps);
        }

        Ok(catalog)
    }
}
