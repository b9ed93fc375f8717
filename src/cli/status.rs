//! Status command implementation

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::cli::context::cache_dir;
use crate::config::Config;
use crate::error::{ConfigError, Error, Result};

/// Run the status command to display configuration status
pub fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}\n", "ASOLens Configuration Status".bold());

    let config_path = Config::resolve_path(opts.config_ref())?;
    let config = match Config::load_from(config_path.clone()) {
        Ok(config) => {
            println!("Config file: {}", config_path.display().to_string().cyan());
            config
        }
        Err(Error::Config(ConfigError::NotFound)) => {
            println!("{} Configuration not found (using defaults)", "○".dimmed());
            println!("  → Run {} to create one", "asolens init".cyan());
            Config::default()
        }
        Err(e) => {
            println!("{} Configuration invalid: {}", "✗".red(), e);
            return Ok(());
        }
    };

    println!();

    let host = config.api_host(opts.api_host_ref());
    let source = if opts.api_host.is_some() {
        " (override)"
    } else if config.api_host.is_some() {
        ""
    } else {
        " (default)"
    };
    println!("{} Backend: {}{}", "✓".green(), host, source.dimmed());

    println!(
        "{} Polling every {}s, {} attempt(s) per call, {}ms between attempts",
        "○".dimmed(),
        config.polling.interval_secs,
        config.polling.retry_attempts,
        config.polling.retry_delay_ms
    );
    println!(
        "{} Timeouts: job endpoints {}s, analysis endpoints {}s",
        "○".dimmed(),
        config.timeouts.job_secs,
        config.timeouts.analysis_secs
    );
    if config.preferences.treat_not_found_as_empty {
        println!("{} 'Not found' responses are treated as empty", "○".dimmed());
    }

    if opts.no_persist {
        println!("{} Cache: memory only (--no-persist)", "○".dimmed());
    } else {
        match cache_dir(opts) {
            Ok(dir) => println!("{} Cache: {}", "○".dimmed(), dir.display()),
            Err(e) => println!("{} Cache location unavailable: {}", "⚠".yellow(), e),
        }
    }

    println!();
    Ok(())
}
