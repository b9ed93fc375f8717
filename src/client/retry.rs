//! Fixed-budget retry for transient backend failures

use std::future::Future;
use std::time::Duration;

use log::warn;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;

/// Attempts and delay shared by every retried backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Why a retried call gave up
#[derive(Debug, Clone)]
pub enum RetryFailure {
    /// Last error after `attempts` tries, or the first non-transient one
    Exhausted { attempts: u32, error: ApiError },
    Cancelled,
}

/// Run `op` until it succeeds, fails with a non-transient error, or the
/// attempt budget runs out.
///
/// Cancellation is honoured both while a call is in flight (its response is
/// dropped) and while waiting between attempts.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    label: &str,
    op: F,
) -> Result<T, RetryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    with_retry_when(policy, cancel, label, ApiError::is_transient, op).await
}

/// Like [`with_retry`], but `retryable` decides which errors get another attempt
pub async fn with_retry_when<T, F, Fut, R>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    label: &str,
    retryable: R,
    mut op: F,
) -> Result<T, RetryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    R: Fn(&ApiError) -> bool,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryFailure::Cancelled),
            result = op() => result,
        };

        match result {
            Ok(value) => return Ok(value),
            Err(error) if retryable(&error) && attempt < attempts => {
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                    label, attempt, attempts, error, policy.delay
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(RetryFailure::Cancelled),
                    _ = tokio::time::sleep(policy.delay) => {}
                }
            }
            Err(error) => {
                return Err(RetryFailure::Exhausted {
                    attempts: attempt,
                    error,
                });
            }
        }
    }
}
