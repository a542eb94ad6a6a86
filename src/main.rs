// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! OnGi CLI - browse nearby stores through the offline-first cache

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ongi::commands::{self, stores::StoresArgs, Output};
use ongi::config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ongi")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "ONGI_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stores for a filter, paging through the local cache
    Stores {
        /// Category code (KOREAN_FOOD, BAKERY, ...)
        #[arg(long)]
        category: Option<String>,

        /// Sort order (NAME, FAVORITE, DISTANCE)
        #[arg(long)]
        sort: Option<String>,

        /// Distance range (M_5, K_1, K_3, K_5, K_10, K_15, NONE)
        #[arg(long)]
        distance: Option<String>,

        /// Search keyword
        #[arg(short, long)]
        keyword: Option<String>,

        /// Only favorite stores
        #[arg(long)]
        favorites: bool,

        /// Latitude (defaults to the configured location)
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude (defaults to the configured location)
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,

        /// Rows per page
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Show stores near you, falling back to cached rows when offline
    Home {
        /// Latitude (defaults to the configured location)
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude (defaults to the configured location)
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Show one store
    Store {
        /// Store ID
        id: String,

        /// Include description, hours and tags
        #[arg(long)]
        detail: bool,

        /// Include the menu
        #[arg(long)]
        menus: bool,

        /// Latitude for the distance
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude for the distance
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Like a cached store
    Favorite {
        /// Store ID
        id: String,

        /// Remove a like instead
        #[arg(long)]
        unlike: bool,
    },

    /// Show server store count and sync time
    Sync,

    /// Evict least recently used queries from the cache
    Prune {
        /// Queries to keep (defaults to max_cached_queries)
        #[arg(long)]
        keep: Option<usize>,
    },

    /// Replay navigation operations and print the resulting state
    Nav {
        /// Operations: navigate:store:<id>, navigate:filtered[:<CATEGORY>],
        /// navigate:search, select:<tab>, pop, back, wait:<ms>
        #[arg(required = true)]
        ops: Vec<String>,

        /// Throttle window applied during replay (defaults to navigation_throttle_ms)
        #[arg(long)]
        throttle_ms: Option<u64>,
    },

    /// Print the effective configuration
    Config {
        /// Configuration key (e.g. retry.max_retries); all when omitted
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    // Initialize logging: -v/-q win over RUST_LOG, which wins over the config
    let filter = match cli.verbose {
        0 if cli.quiet => EnvFilter::new("error"),
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let out = Output {
        json: cli.json,
        color: !cli.no_color,
    };

    // Execute command
    match cli.command {
        Commands::Stores {
            category,
            sort,
            distance,
            keyword,
            favorites,
            lat,
            lon,
            pages,
            page_size,
        } => {
            let args = StoresArgs {
                category,
                sort,
                distance,
                keyword,
                favorites,
                latitude: lat,
                longitude: lon,
                pages,
                page_size,
            };
            commands::stores::run(&config, args, out).await
        }
        Commands::Home { lat, lon } => commands::home::run(&config, (lat, lon), out).await,
        Commands::Store {
            id,
            detail,
            menus,
            lat,
            lon,
        } => commands::store::run(&config, &id, (lat, lon), detail, menus, out).await,
        Commands::Favorite { id, unlike } => {
            commands::favorite::run(&config, &id, unlike, out).await
        }
        Commands::Sync => commands::sync::run(&config, out).await,
        Commands::Prune { keep } => commands::prune::run(&config, keep, out).await,
        Commands::Nav { ops, throttle_ms } => commands::nav::run(&config, &ops, throttle_ms, out),
        Commands::Config { key } => commands::config::run(&config, key.as_deref(), out),
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}
