//! Report command: cached app, competitor and keyword analysis

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::client::AppDescriptor;
use crate::error::Result;
use crate::orchestrator::{AnalysisOrchestrator, AnalyzeOptions, StageProgress};
use crate::output;

const STAGE_NAMES: [&str; 3] = ["app analysis", "competitor analysis", "keyword analysis"];

/// Run the report command
pub async fn run(
    opts: &GlobalOptions,
    app_id: &str,
    competitors: &[String],
    fresh: bool,
) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let orchestrator = AnalysisOrchestrator::new(ctx.client()?, ctx.fetcher(), ctx.retry_policy());

    let app = AppDescriptor::new(app_id);
    let competitors: Vec<AppDescriptor> = competitors.iter().map(AppDescriptor::new).collect();

    let spinner = spinner(ctx.format);
    let mut progress = orchestrator.subscribe();
    let cancel = orchestrator.cancellation_token();

    let run = orchestrator.analyze(&app, &competitors, AnalyzeOptions { force_fresh: fresh });
    tokio::pin!(run);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            Ok(()) = progress.changed() => {
                let stage = *progress.borrow_and_update();
                spinner.set_message(stage_message(stage));
            }
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                spinner.set_message("Cancelling...".yellow().to_string());
                cancel.cancel();
            }
        }
    };
    spinner.finish_and_clear();

    output::print(&result?, ctx.format)
}

fn spinner(format: OutputFormat) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));
    spinner
}

fn stage_message(stage: StageProgress) -> String {
    match STAGE_NAMES.get(usize::from(stage.current)) {
        Some(name) if stage.is_running() => {
            format!("[{}/{}] Running {}...", stage.current + 1, stage.total, name)
        }
        _ => "Merging results...".to_string(),
    }
}
