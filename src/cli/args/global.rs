//! Global CLI options shared across all commands

use clap::ValueEnum;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;

/// Global CLI options passed to all command handlers.
///
/// # Precedence
///
/// For most options, the precedence is: CLI flag > environment variable > config file > default.
/// This struct captures the CLI/env layer; config file values are applied in
/// `CommandContext`.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format, when given on the command line or in the environment
    pub format: Option<OutputFormat>,

    /// Custom config file path (defaults to ~/.asolens/config.yaml)
    pub config: Option<String>,

    /// Backend base URL override
    pub api_host: Option<String>,

    /// Cache directory override (defaults to the XDG cache dir)
    pub cache_dir: Option<String>,

    /// Keep the cache in memory for this run only
    pub no_persist: bool,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            api_host: cli.api_host.clone(),
            cache_dir: cli.cache_dir.clone(),
            no_persist: cli.no_persist,
        }
    }

    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    pub fn api_host_ref(&self) -> Option<&str> {
        self.api_host.as_deref()
    }

    pub fn cache_dir_ref(&self) -> Option<&str> {
        self.cache_dir.as_deref()
    }

    /// Output format after applying the config file preference.
    ///
    /// An unrecognised preference falls back to the default.
    pub fn resolve_format(&self, config: &Config) -> OutputFormat {
        self.format
            .or_else(|| {
                config
                    .preferences
                    .format
                    .as_deref()
                    .and_then(|f| OutputFormat::from_str(f, true).ok())
            })
            .unwrap_or_default()
    }
}
