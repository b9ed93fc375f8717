//! ASOLens CLI - command-line companion for the App Store Optimization backend

use clap::Parser;

mod cache;
mod cli;
mod client;
mod config;
mod error;
mod job;
mod models;
mod orchestrator;
mod output;

use cli::analyze::AnalyzeArgs;
use cli::args::GlobalOptions;
use cli::{CacheCommands, Cli, Commands};
use config::Config;
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `RUST_LOG` applies unless `--debug` asks for everything from this crate
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_module(env!("CARGO_CRATE_NAME"), log::LevelFilter::Debug);
    }
    builder.format_timestamp_millis().init();
    log::debug!("Debug logging enabled");
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Init => cli::init::run(&opts),
        Commands::Status => cli::status::run(&opts),
        Commands::Version => {
            println!("asolens version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Analyze {
            package,
            competitors,
            keywords,
            no_wait,
        } => {
            let args = AnalyzeArgs {
                package,
                competitors,
                keywords,
                no_wait,
            };
            cli::analyze::run(&opts, args).await
        }
        Commands::Report {
            app_id,
            competitors,
            fresh,
        } => cli::report::run(&opts, &app_id, &competitors, fresh).await,
        Commands::Cache(cmd) => {
            let format = Config::load_or_default(opts.config_ref())
                .map(|config| opts.resolve_format(&config))
                .unwrap_or_else(|_| opts.format.unwrap_or_default());
            match cmd {
                CacheCommands::Status => cli::cache::status(&opts, format),
                CacheCommands::Clear => cli::cache::clear(&opts, format),
                CacheCommands::Path => cli::cache::path(&opts),
                CacheCommands::Keys => cli::cache::keys(&opts, format),
                CacheCommands::Invalidate { key } => cli::cache::invalidate(&opts, &key, format),
            }
        }
    }
}
