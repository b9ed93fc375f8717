//! Analysis job submission and polling
//!
//! A job is submitted once, then polled until the backend reports a terminal
//! status. State changes are published on a `watch` channel.

use std::time::Duration;

use crate::client::RetryPolicy;
use crate::client::models::{AnalysisResult, TaskStatus};
use crate::config::Config;
use crate::error::JobError;

pub mod progress;
pub mod tracker;

pub use progress::{MAX_PROGRESS, progress_for, stage_label};
pub use tracker::JobTracker;

/// Lifecycle of a single analysis job
#[derive(Debug, Clone, Default)]
pub enum JobState {
    #[default]
    Idle,
    Submitting {
        attempt: u32,
    },
    Polling {
        task_id: String,
        progress: u8,
        status: TaskStatus,
    },
    Completed {
        task_id: String,
        result: AnalysisResult,
    },
    Failed {
        task_id: Option<String>,
        error: JobError,
    },
}

impl JobState {
    /// Completed or failed; stays this way until reset
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed { .. } | JobState::Failed { .. })
    }

    pub fn progress(&self) -> u8 {
        match self {
            JobState::Polling { progress, .. } => *progress,
            JobState::Completed { .. } => MAX_PROGRESS,
            _ => 0,
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        match self {
            JobState::Polling { task_id, .. } | JobState::Completed { task_id, .. } => {
                Some(task_id)
            }
            JobState::Failed { task_id, .. } => task_id.as_deref(),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Submitting { .. } => "submitting",
            JobState::Polling { .. } => "polling",
            JobState::Completed { .. } => "completed",
            JobState::Failed { .. } => "failed",
        }
    }
}

/// Poll cadence and retry budget for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&Config> for PollSettings {
    fn from(config: &Config) -> Self {
        Self {
            interval: Duration::from_secs(config.polling.interval_secs),
            retry: RetryPolicy {
                attempts: config.polling.retry_attempts,
                delay: Duration::from_millis(config.polling.retry_delay_ms),
            },
        }
    }
}
