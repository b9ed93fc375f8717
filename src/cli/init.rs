//! Init command implementation

use chrono::Utc;
use colored::Colorize;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

use crate::cli::args::GlobalOptions;
use crate::config::{Config, DEFAULT_API_HOST};
use crate::error::{ConfigError, Result};

const FORMATS: [&str; 3] = ["pretty", "table", "json"];

/// Run the init command
///
/// Existing settings are offered as defaults, so running `init` again edits
/// the current file rather than starting over.
pub fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}", "Welcome to ASOLens!".bold().green());
    println!("Let's point the CLI at your analysis backend.\n");

    let path = Config::resolve_path(opts.config_ref())?;
    let mut config = match Config::load_from(path.clone()) {
        Ok(config) => config,
        Err(crate::error::Error::Config(ConfigError::NotFound)) => Config::default(),
        Err(e) => return Err(e),
    };

    let theme = ColorfulTheme::default();

    let current_host = opts
        .api_host
        .clone()
        .or_else(|| config.api_host.clone())
        .unwrap_or_else(|| DEFAULT_API_HOST.to_string());
    let api_host: String = Input::with_theme(&theme)
        .with_prompt("Analysis backend URL")
        .default(current_host)
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.starts_with("http://") || input.starts_with("https://") {
                Ok(())
            } else {
                Err("URL must start with http:// or https://")
            }
        })
        .interact_text()?;

    let current_format = config
        .preferences
        .format
        .as_deref()
        .and_then(|f| FORMATS.iter().position(|known| known.eq_ignore_ascii_case(f)))
        .unwrap_or(0);
    let format = Select::with_theme(&theme)
        .with_prompt("Default output format")
        .items(&FORMATS)
        .default(current_format)
        .interact()?;

    let not_found_as_empty = Confirm::with_theme(&theme)
        .with_prompt("Treat 'not found' from the backend as an empty result?")
        .default(config.preferences.treat_not_found_as_empty)
        .interact()?;

    config.api_host = Some(api_host.trim_end_matches('/').to_string());
    config.preferences.format = Some(FORMATS[format].to_string());
    config.preferences.treat_not_found_as_empty = not_found_as_empty;
    config.created_at.get_or_insert_with(Utc::now);

    config.save_to(path.clone())?;

    println!(
        "\n{} Configuration saved to: {}",
        "✓".green(),
        path.display()
    );
    println!("  Backend: {}", config.api_host(None).bold());

    println!("\n{}", "You're all set! Try running:".bold());
    println!("  {} - Show configuration status", "asolens status".cyan());
    println!(
        "  {} - Analyze an app",
        "asolens analyze com.example.app".cyan()
    );

    Ok(())
}
