//! CLI command definitions and handlers

use clap::{Parser, Subcommand};

pub mod analyze;
pub mod args;
pub mod cache;
pub mod context;
pub mod init;
pub mod report;
pub mod status;

pub use args::OutputFormat;
pub use context::CommandContext;

/// ASOLens - command-line companion for the App Store Optimization backend
#[derive(Parser, Debug)]
#[command(name = "asolens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json) [default: pretty]
    #[arg(
        long,
        global = true,
        env = "ASOLENS_FORMAT",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: Option<OutputFormat>,

    /// Override config file location
    #[arg(long, global = true, env = "ASOLENS_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Analysis backend base URL
    #[arg(long, global = true, env = "ASOLENS_API_HOST", hide_env = true)]
    pub api_host: Option<String>,

    /// Override cache directory
    #[arg(long, global = true, env = "ASOLENS_CACHE_DIR", hide_env = true)]
    pub cache_dir: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "ASOLENS_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Keep cached responses in memory only for this run
    #[arg(long, global = true, env = "ASOLENS_NO_PERSIST", hide_env = true)]
    pub no_persist: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize ASOLens configuration
    Init,

    /// Show configuration and cache status
    Status,

    /// Display version information
    Version,

    /// Submit an analysis job and follow it to completion
    #[command(after_help = "EXAMPLES:\n  \
            asolens analyze com.example.app\n  \
            asolens analyze com.example.app -c com.rival.one -c com.rival.two -k wholesale\n  \
            asolens analyze com.example.app --no-wait          # Print task id and exit")]
    Analyze {
        /// Package name of the app to analyze
        package: String,

        /// Competitor package names, comma-separated or repeated
        #[arg(long = "competitor", short = 'c', value_delimiter = ',')]
        competitors: Vec<String>,

        /// Keywords to evaluate, comma-separated or repeated
        #[arg(long = "keyword", short = 'k', value_delimiter = ',')]
        keywords: Vec<String>,

        /// Submit only; do not poll for the result
        #[arg(long)]
        no_wait: bool,
    },

    /// Cached app, competitor and keyword report
    #[command(after_help = "EXAMPLES:\n  \
            asolens report com.example.app\n  \
            asolens report com.example.app -c com.rival.one --fresh\n  \
            asolens report com.example.app --format json | jq '.data.keywordAnalysis'")]
    Report {
        /// App id (package name)
        app_id: String,

        /// Competitor app ids, comma-separated or repeated
        #[arg(long = "competitor", short = 'c', value_delimiter = ',')]
        competitors: Vec<String>,

        /// Ignore cached results and refresh them
        #[arg(long)]
        fresh: bool,
    },

    /// Manage local response cache
    #[command(subcommand)]
    Cache(CacheCommands),
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache statistics
    Status,
    /// Clear all cached data
    Clear,
    /// Print cache directory path
    Path,
    /// List cached keys with their expiry
    Keys,
    /// Drop a single cached entry
    Invalidate {
        /// Cache key, as shown by `asolens cache keys`
        key: String,
    },
}
