//! API Catalog CLI
//!
//! Command-line interface for compiling and browsing API catalogs built from
//! directories of OpenAPI/Swagger documents.

use anyhow::{bail, Context, Result};
use api_catalog::{CatalogLoader, CatalogRenderer};
use api_catalog_common::{ApiCatalog, CatalogConfig};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "api-catalog")]
#[command(version, about = "Compile OpenAPI/Swagger documents into a navigable API catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory searched for API documents (overrides the config file)
    #[arg(long, global = true)]
    catalog_path: Option<PathBuf>,

    /// Cache directory (overrides the config file)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Disable the persistent catalog cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the catalog (from cache when possible) and print a summary
    #[command(after_help = "EXAMPLES:\n  \
        # Load documents from ./models\n  \
        api-catalog load\n\n  \
        # Load from another directory without touching the cache\n  \
        api-catalog --catalog-path ./specs --no-cache load")]
    Load,

    /// Reload the catalog, still consulting the persistent cache
    Refresh,

    /// Clear the persistent cache and compile from scratch
    Rebuild,

    /// Show every category with its endpoint count
    Categories,

    /// Show the endpoints of one category
    #[command(after_help = "EXAMPLES:\n  \
        api-catalog category Orders")]
    Category {
        /// Category name (case-insensitive)
        name: String,
    },

    /// Show the details of one endpoint
    #[command(after_help = "EXAMPLES:\n  \
        api-catalog endpoint orders_getOrder")]
    Endpoint {
        /// Endpoint id (e.g., "orders_getOrder")
        id: String,
    },

    /// List "I want to ..." intents and the endpoints that serve them
    #[command(after_help = "EXAMPLES:\n  \
        # Every intent\n  \
        api-catalog intents\n\n  \
        # Intents mentioning both words\n  \
        api-catalog intents find order")]
    Intents {
        /// Words that must all appear in the intent (case-insensitive)
        query: Vec<String>,
    },

    /// Write the whole catalog as JSON
    Export {
        /// Output file (stdout if not given)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete every persistent cache entry
    ClearCache,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = resolve_config(&cli)?;
    if cli.verbose {
        println!("{} Catalog path: {}", "→".cyan(), config.catalog_path.display());
        if config.cache.enabled {
            println!("{} Cache: {}", "→".cyan(), config.cache.dir.display());
        } else {
            println!("{} Cache: disabled", "→".cyan());
        }
    }

    let mut loader = CatalogLoader::new(config);

    match cli.command {
        Commands::Load => {
            let catalog = loader.load_catalog().context("Failed to load API catalog")?;
            print_summary(catalog);
        }
        Commands::Refresh => {
            let catalog = loader
                .refresh_catalog()
                .context("Failed to refresh API catalog")?;
            print_summary(catalog);
        }
        Commands::Rebuild => {
            let removed = loader.invalidate_cache();
            println!("{} Removed {} cache entries", "→".cyan(), removed);
            let catalog = loader.load_catalog().context("Failed to rebuild API catalog")?;
            print_summary(catalog);
        }
        Commands::Categories => {
            let catalog = loader.load_catalog().context("Failed to load API catalog")?;
            let renderer = CatalogRenderer::new().context("Failed to load templates")?;
            print!("{}", renderer.render_overview(catalog)?);
        }
        Commands::Category { name } => {
            loader.load_catalog().context("Failed to load API catalog")?;
            let Some(category) = loader.category_by_name(&name)? else {
                bail!("Unknown category: {}", name);
            };
            let renderer = CatalogRenderer::new().context("Failed to load templates")?;
            print!("{}", renderer.render_category(category)?);
        }
        Commands::Endpoint { id } => {
            loader.load_catalog().context("Failed to load API catalog")?;
            let Some(found) = loader.endpoint_by_id(&id)? else {
                bail!("Unknown endpoint: {}", id);
            };
            let renderer = CatalogRenderer::new().context("Failed to load templates")?;
            print!("{}", renderer.render_endpoint(&found)?);
        }
        Commands::Intents { query } => {
            let catalog = loader.load_catalog().context("Failed to load API catalog")?;
            let found = catalog.intents_matching(&query.join(" "));
            if found.is_empty() {
                println!("{} No matching intents", "→".cyan());
            }
            for mapping in found {
                println!("{}", mapping.intent.bold());
                println!("  {} {}", "→".cyan(), mapping.endpoint_id.yellow());
                println!("    {}", mapping.reason.dimmed());
            }
        }
        Commands::Export { output } => {
            let catalog = loader.load_catalog().context("Failed to load API catalog")?;
            let json = serde_json::to_string_pretty(catalog).context("Failed to serialize catalog")?;
            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("{} Catalog written to {}", "✓".green(), path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::ClearCache => {
            let removed = loader.invalidate_cache();
            println!("{} Removed {} cache entries", "✓".green(), removed);
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Config file, then environment, then command-line flags
fn resolve_config(cli: &Cli) -> Result<CatalogConfig> {
    let config = match &cli.config {
        Some(path) => CatalogConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CatalogConfig::default(),
    };
    let config = config
        .with_env_overrides()
        .context("Invalid environment override")?;

    Ok(apply_flags(cli, config))
}

fn apply_flags(cli: &Cli, mut config: CatalogConfig) -> CatalogConfig {
    if let Some(path) = &cli.catalog_path {
        config.catalog_path = path.clone();
    }
    if let Some(dir) = &cli.cache_dir {
        config.cache.dir = dir.clone();
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }
    config
}

fn print_summary(catalog: &ApiCatalog) {
    println!("\n{}", "✓ API catalog loaded!".green().bold());
    println!(
        "  Categories: {}",
        catalog.categories.len().to_string().yellow()
    );
    println!(
        "  Endpoints: {}",
        catalog.total_endpoints().to_string().yellow()
    );

    for category in &catalog.categories {
        println!(
            "  • {} ({})",
            category.name.cyan(),
            category.endpoint_count()
        );
    }
}
