//! Analyze command: submit a job and follow it to completion

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::client::{AnalysisApi, AnalysisRequest};
use crate::error::{JobError, Result};
use crate::job::{JobState, JobTracker, MAX_PROGRESS, stage_label};
use crate::output::{self, json::format_json};

/// Arguments of `asolens analyze`
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    pub package: String,
    pub competitors: Vec<String>,
    pub keywords: Vec<String>,
    pub no_wait: bool,
}

/// Run the analyze command
pub async fn run(opts: &GlobalOptions, args: AnalyzeArgs) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let request = AnalysisRequest::new(&args.package, &args.competitors, &args.keywords);
    request.validate()?;

    let mut tracker = JobTracker::new(ctx.client()?, ctx.poll_settings());
    tracker.submit(request)?;

    if args.no_wait {
        return print_task_id(&tracker, ctx.format).await;
    }

    follow(&mut tracker, ctx.format).await;
    let result = tracker.wait().await?;
    output::print(&result, ctx.format)
}

/// Wait until the backend has accepted the job, print its id and stop tracking
async fn print_task_id<A: AnalysisApi + 'static>(
    tracker: &JobTracker<A>,
    format: OutputFormat,
) -> Result<()> {
    let mut rx = tracker.subscribe();
    let state = rx
        .wait_for(|s| matches!(s, JobState::Polling { .. }) || s.is_terminal())
        .await
        .map(|s| (*s).clone())
        .map_err(|_| JobError::Cancelled)?;

    let task_id = match state {
        JobState::Failed { error, .. } => return Err(error.into()),
        other => other.task_id().map(str::to_string).unwrap_or_default(),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", format_json(&serde_json::json!({ "task_id": task_id }))?)
        }
        _ => println!("{} Analysis submitted: {}", "✓".green(), task_id.bold()),
    }
    Ok(())
}

/// Drive a progress bar from job state until the job settles or Ctrl-C
async fn follow<A: AnalysisApi + 'static>(tracker: &mut JobTracker<A>, format: OutputFormat) {
    let mut rx = tracker.subscribe();
    let bar = progress_bar(format);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let state = loop {
        let state = rx.borrow_and_update().clone();
        render(&bar, &state);
        if state.is_terminal() {
            break state;
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break tracker.state();
                }
            }
            _ = &mut ctrl_c => {
                tracker.cancel();
                break tracker.state();
            }
        }
    };

    match &state {
        JobState::Completed { .. } => bar.finish_and_clear(),
        JobState::Failed { error, .. } => {
            bar.abandon_with_message(format!("{}", error.message().red()))
        }
        _ => bar.finish_and_clear(),
    }
}

fn progress_bar(format: OutputFormat) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(u64::from(MAX_PROGRESS));
    let style = ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn render(bar: &ProgressBar, state: &JobState) {
    match state {
        JobState::Submitting { attempt } if *attempt > 1 => {
            bar.set_message(format!("Submitting analysis (attempt {})...", attempt))
        }
        JobState::Submitting { .. } => bar.set_message("Submitting analysis..."),
        JobState::Polling { .. } | JobState::Completed { .. } => {
            let progress = state.progress();
            bar.set_position(u64::from(progress));
            bar.set_message(stage_label(progress));
        }
        JobState::Idle | JobState::Failed { .. } => {}
    }
}
