//! Command execution context
//!
//! Loads configuration, opens the response cache and builds the backend
//! client, so command handlers start from one place.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{CacheStore, CachedFetcher, SqliteStorage};
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::client::{AsoClient, RetryPolicy};
use crate::config::Config;
use crate::error::Result;
use crate::job::PollSettings;

/// Context for command execution containing config, cache and runtime options.
pub struct CommandContext {
    /// Loaded and validated configuration (defaults when no file exists)
    pub config: Config,
    /// Output format preference
    pub format: OutputFormat,
    /// Response cache shared by every fetcher in this run
    pub cache: Arc<CacheStore>,
    api_host: Option<String>,
}

impl CommandContext {
    /// Create a new command context.
    ///
    /// # Errors
    /// Returns error if an existing config file cannot be parsed or is invalid.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = Config::load_or_default(opts.config_ref())?;
        let format = opts.resolve_format(&config);
        let (cache, _) = open_cache(opts);

        Ok(Self {
            config,
            format,
            cache,
            api_host: opts.api_host.clone(),
        })
    }

    /// Backend client configured from the loaded config and overrides
    pub fn client(&self) -> Result<Arc<AsoClient>> {
        let client = AsoClient::from_config(&self.config, self.api_host.as_deref())?;
        log::debug!("Using analysis backend at {}", client.base_url());
        Ok(Arc::new(client))
    }

    pub fn fetcher(&self) -> CachedFetcher {
        CachedFetcher::new(Arc::clone(&self.cache))
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings::from(&self.config)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.poll_settings().retry
    }
}

/// Directory holding the on-disk cache
pub fn cache_dir(opts: &GlobalOptions) -> Result<PathBuf> {
    match opts.cache_dir_ref() {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Ok(SqliteStorage::cache_dir()?),
    }
}

/// Open the cache store, falling back to memory when storage is unavailable.
///
/// Returns the database path when the store is backed by disk.
pub fn open_cache(opts: &GlobalOptions) -> (Arc<CacheStore>, Option<PathBuf>) {
    if opts.no_persist {
        log::debug!("Cache persistence disabled for this run");
        return (Arc::new(CacheStore::in_memory()), None);
    }

    let opened = cache_dir(opts).and_then(|dir| SqliteStorage::open_at(&dir).map_err(Into::into));
    match opened {
        Ok(storage) => {
            let path = storage.path().to_path_buf();
            (Arc::new(CacheStore::new(Box::new(storage))), Some(path))
        }
        Err(e) => {
            log::warn!("Cache storage unavailable, continuing in memory only: {}", e);
            (Arc::new(CacheStore::in_memory()), None)
        }
    }
}
