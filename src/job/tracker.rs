//! Background job tracker
//!
//! `JobTracker` owns at most one running job. The job runs on its own Tokio
//! task and reports through a `watch` channel; the tracker cancels it on
//! reset, resubmission or drop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::progress::progress_for;
use super::{JobState, PollSettings};
use crate::client::models::{AnalysisRequest, AnalysisResult, TaskStatus};
use crate::client::{AnalysisApi, RetryFailure, with_retry_when};
use crate::error::{ApiError, JobError, Result};

/// Fallback message when the backend fails a job without saying why
const DEFAULT_FAILURE_MESSAGE: &str = "Analysis failed";

/// Submits analysis jobs and tracks them to completion
pub struct JobTracker<A: AnalysisApi + 'static> {
    api: Arc<A>,
    settings: PollSettings,
    state: Arc<watch::Sender<JobState>>,
    generation: Arc<AtomicU64>,
    cancel: Option<CancellationToken>,
}

impl<A: AnalysisApi + 'static> JobTracker<A> {
    pub fn new(api: Arc<A>, settings: PollSettings) -> Self {
        let (state, _) = watch::channel(JobState::Idle);
        Self {
            api,
            settings,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            cancel: None,
        }
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> JobState {
        self.state.borrow().clone()
    }

    /// Validate and submit a new job, replacing any previous one.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&mut self, request: AnalysisRequest) -> Result<()> {
        request.validate()?;
        self.reset();

        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        self.state.send_replace(JobState::Submitting { attempt: 1 });

        let publisher = Publisher {
            state: Arc::clone(&self.state),
            generation: Arc::clone(&self.generation),
            id: self.generation.load(Ordering::SeqCst),
        };

        info!("Submitting analysis for {}", request.package_name);
        tokio::spawn(run_job(
            Arc::clone(&self.api),
            request,
            self.settings,
            token,
            publisher,
        ));
        Ok(())
    }

    /// Stop the running job and mark it cancelled.
    ///
    /// Does nothing when no job is running.
    pub fn cancel(&mut self) {
        if self.cancel.is_none() {
            return;
        }
        self.stop();
        self.state.send_if_modified(|state| {
            if state.is_terminal() || matches!(state, JobState::Idle) {
                return false;
            }
            info!("Analysis cancelled");
            let task_id = state.task_id().map(str::to_string);
            *state = JobState::Failed {
                task_id,
                error: JobError::Cancelled,
            };
            true
        });
    }

    /// Stop any running job and return to `Idle`
    pub fn reset(&mut self) {
        self.stop();
        self.state.send_replace(JobState::Idle);
    }

    /// Wait for the current job to reach a terminal state
    pub async fn wait(&self) -> std::result::Result<AnalysisResult, JobError> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|state| state.is_terminal() || matches!(state, JobState::Idle))
            .await
            .map(|state| (*state).clone())
            .map_err(|_| JobError::Cancelled)?;

        match state {
            JobState::Completed { result, .. } => Ok(result),
            JobState::Failed { error, .. } => Err(error),
            _ => Err(JobError::Cancelled),
        }
    }

    fn stop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

impl<A: AnalysisApi + 'static> Drop for JobTracker<A> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State writer handed to a job task. Writes from a superseded job are
/// dropped.
struct Publisher {
    state: Arc<watch::Sender<JobState>>,
    generation: Arc<AtomicU64>,
    id: u64,
}

impl Publisher {
    fn publish(&self, next: JobState) {
        let generation = &self.generation;
        let id = self.id;
        self.state.send_if_modified(move |state| {
            if generation.load(Ordering::SeqCst) != id {
                return false;
            }
            debug!("Job state: {} -> {}", state.name(), next.name());
            *state = next;
            true
        });
    }
}

async fn run_job<A: AnalysisApi>(
    api: Arc<A>,
    request: AnalysisRequest,
    settings: PollSettings,
    cancel: CancellationToken,
    publisher: Publisher,
) {
    let mut attempt = 0;
    let submitted = with_retry_when(
        settings.retry,
        &cancel,
        "Submit analysis",
        ApiError::is_retryable_for_jobs,
        || {
            attempt += 1;
            publisher.publish(JobState::Submitting { attempt });
            let api = Arc::clone(&api);
            let request = request.clone();
            async move { api.submit_analysis(&request).await }
        },
    )
    .await;

    let task_id = match submitted {
        Ok(task_id) => task_id,
        Err(RetryFailure::Cancelled) => return,
        Err(RetryFailure::Exhausted {
            error: ApiError::Backend(message),
            ..
        }) => {
            warn!("Backend rejected analysis: {}", message);
            publisher.publish(JobState::Failed {
                task_id: None,
                error: JobError::Backend(message),
            });
            return;
        }
        Err(RetryFailure::Exhausted { attempts, error }) => {
            warn!("Analysis submission failed: {}", error);
            publisher.publish(JobState::Failed {
                task_id: None,
                error: JobError::Submission {
                    attempts,
                    source: error,
                },
            });
            return;
        }
    };

    info!("Analysis started: task {}", task_id);
    publisher.publish(JobState::Polling {
        task_id: task_id.clone(),
        progress: 0,
        status: TaskStatus::Pending,
    });

    loop {
        let polled = with_retry_when(
            settings.retry,
            &cancel,
            "Fetch analysis status",
            ApiError::is_retryable_for_jobs,
            || {
                let api = Arc::clone(&api);
                let task_id = task_id.clone();
                async move { api.get_task_status(&task_id).await }
            },
        )
        .await;

        let response = match polled {
            Ok(response) => response,
            Err(RetryFailure::Cancelled) => return,
            Err(RetryFailure::Exhausted { attempts, error }) => {
                warn!("Polling task {} failed: {}", task_id, error);
                publisher.publish(JobState::Failed {
                    task_id: Some(task_id),
                    error: JobError::Polling {
                        attempts,
                        source: error,
                    },
                });
                return;
            }
        };

        match response.status {
            TaskStatus::Completed => {
                info!("Analysis completed: task {}", task_id);
                publisher.publish(JobState::Completed {
                    task_id,
                    result: response.to_result(),
                });
                return;
            }
            TaskStatus::Error => {
                let message = response
                    .error
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                warn!("Analysis failed: task {}: {}", task_id, message);
                publisher.publish(JobState::Failed {
                    task_id: Some(task_id),
                    error: JobError::Backend(message),
                });
                return;
            }
            status => {
                let progress = progress_for(&response);
                debug!("Task {} is {} ({}%)", task_id, status, progress);
                publisher.publish(JobState::Polling {
                    task_id: task_id.clone(),
                    progress,
                    status,
                });
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(settings.interval) => {}
        }
    }
}
