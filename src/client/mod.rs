//! Analysis backend API client

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiResult;

pub mod aso;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod rate_limit;
pub mod retry;

pub use aso::AsoClient;
#[cfg(test)]
pub use mock::MockAnalysisClient;
pub use models::{AnalysisRequest, AppDescriptor, TaskStatusResponse};
pub use retry::{RetryFailure, RetryPolicy, with_retry, with_retry_when};

/// Analysis backend API.
///
/// Covers both integration profiles: the job endpoints used by `analyze`
/// and the synchronous per-analysis endpoints used by the orchestrator.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// Create an analysis job; returns the backend's task id
    async fn submit_analysis(&self, request: &AnalysisRequest) -> ApiResult<String>;

    /// Current status and partial results of a job
    async fn get_task_status(&self, task_id: &str) -> ApiResult<TaskStatusResponse>;

    /// Synchronous single-app analysis
    async fn analyze_app(&self, app_id: &str) -> ApiResult<Value>;

    /// Compare an app against its competitors
    async fn compare_competitors(&self, app_id: &str, competitor_ids: &[String])
    -> ApiResult<Value>;

    /// Keyword discovery for an app and its competitors
    async fn discover_keywords(&self, app_id: &str, competitor_ids: &[String]) -> ApiResult<Value>;
}
