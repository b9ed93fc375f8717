//! Cache management commands

use chrono::Utc;

use crate::cache::CachedFetcher;
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::cli::context::{cache_dir, open_cache};
use crate::error::Result;
use crate::models::{CacheKeysView, CacheStatusView};
use crate::output::{self, json::format_json};

/// Show cache status/statistics
pub fn status(opts: &GlobalOptions, format: OutputFormat) -> Result<()> {
    let (cache, path) = open_cache(opts);
    let view = CacheStatusView {
        path: path.map(|p| p.display().to_string()),
        stats: cache.stats(),
    };
    output::print(&view, format)
}

/// Clear all cache entries
pub fn clear(opts: &GlobalOptions, format: OutputFormat) -> Result<()> {
    let (cache, _) = open_cache(opts);
    let removed = cache.clear();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "entries_removed": removed,
                "success": true,
            });
            println!("{}", format_json(&json)?);
        }
        _ => {
            if removed > 0 {
                println!("Cleared {} cache entries", removed);
            } else {
                println!("Cache was already empty");
            }
        }
    }

    Ok(())
}

/// Show cache path
pub fn path(opts: &GlobalOptions) -> Result<()> {
    println!("{}", cache_dir(opts)?.display());
    Ok(())
}

/// List cached keys
pub fn keys(opts: &GlobalOptions, format: OutputFormat) -> Result<()> {
    let (cache, _) = open_cache(opts);
    let view = CacheKeysView {
        entries: cache.entries(),
        now: Utc::now(),
    };
    output::print(&view, format)
}

/// Drop one cached entry
pub fn invalidate(opts: &GlobalOptions, key: &str, format: OutputFormat) -> Result<()> {
    let (cache, _) = open_cache(opts);
    let removed = CachedFetcher::new(cache).invalidate(key);

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "key": key, "removed": removed });
            println!("{}", format_json(&json)?);
        }
        _ => {
            if removed {
                println!("Removed {}", key);
            } else {
                println!("No cached entry named {}", key);
            }
        }
    }

    Ok(())
}
