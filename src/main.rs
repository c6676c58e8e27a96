//! Book Review Service
//!
//! Main entry point for the bookreview CLI.

use anyhow::Context;
use bookreview::cache::{CacheStore, SqliteCacheStore, BOOKS_CACHE_KEY};
use bookreview::config::{validate_config_result, CacheBackend, ServiceConfig};
use bookreview::server::BookServer;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

/// Book Review Service - books, reviews and a cached book listing
#[derive(Parser, Debug)]
#[command(name = "bookreview")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/bookreview/config.yaml)
    #[arg(short, long, global = true, env = "BOOKREVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level when RUST_LOG is unset
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind (overrides server.addr)
        #[arg(short, long, env = "BOOKREVIEW_ADDR")]
        addr: Option<String>,

        /// SQLite database file (overrides database.path)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Cache backend: memory or sqlite (overrides cache.backend)
        #[arg(long)]
        cache: Option<CacheBackend>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Load and validate the configuration
    CheckConfig,

    /// Drop the cached book listing from the SQLite cache store
    ClearCache {
        /// Remove every cache entry, not only the book listing
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if let Err(e) = bookreview::logging::init(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(ServiceConfig::default_path);

    match cli.command {
        Commands::Init { force } => handle_init(&config_path, force),
        Commands::CheckConfig => handle_check_config(&config_path),
        Commands::ClearCache { all } => handle_clear_cache(&config_path, all),
        Commands::Serve {
            addr,
            database,
            cache,
        } => {
            let mut config = ServiceConfig::load_or_default(&config_path)
                .with_context(|| format!("loading {}", config_path.display()))?;

            if let Some(addr) = addr {
                config.server.addr = addr;
            }
            if let Some(database) = database {
                config.database.path = database;
            }
            if let Some(cache) = cache {
                config.cache.backend = cache;
            }

            validate_config_result(&config)?;

            let server = BookServer::from_config(&config).context("starting server")?;
            server.run(&config.server.addr).await?;
            Ok(())
        }
    }
}

fn handle_init(config_path: &Path, force: bool) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            config_path.display()
        );
    }

    ServiceConfig::new()
        .save(config_path)
        .with_context(|| format!("writing {}", config_path.display()))?;

    println!("Wrote {}", config_path.display());
    Ok(())
}

fn handle_check_config(config_path: &Path) -> anyhow::Result<()> {
    let config = ServiceConfig::load(config_path)?;

    match bookreview::config::validate_config(&config) {
        Ok(()) => {
            println!("Configuration OK: {}", config_path.display());
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                println!("  - {}", error);
            }
            anyhow::bail!("{} configuration error(s)", errors.len())
        }
    }
}

fn handle_clear_cache(config_path: &Path, all: bool) -> anyhow::Result<()> {
    let config = ServiceConfig::load_or_default(config_path)?;

    match config.cache.backend {
        CacheBackend::Memory => {
            println!("In-memory cache is not persisted; nothing to clear");
        }
        CacheBackend::Sqlite => {
            let store = SqliteCacheStore::open(&config.cache.path)
                .with_context(|| format!("opening {}", config.cache.path.display()))?;
            if all {
                store.clear()?;
            } else {
                store.delete(BOOKS_CACHE_KEY)?;
            }

            if store.is_empty()? {
                println!("Cleared {}", config.cache.path.display());
            } else {
                println!(
                    "Cleared book listing from {} ({} other entries kept)",
                    config.cache.path.display(),
                    store.len()?
                );
            }
        }
    }

    Ok(())
}
