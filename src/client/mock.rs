//! Mock analysis backend for testing
//!
//! Responses are scripted per endpoint as a queue. Each call pops the front
//! of its queue; the last scripted response repeats once the queue is down
//! to one entry, so a poller can keep seeing a terminal status.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;

use super::AnalysisApi;
use super::models::{AnalysisRequest, TaskStatusResponse};
use crate::error::{ApiError, ApiResult};

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub submit_analysis: usize,
    pub get_task_status: usize,
    pub analyze_app: usize,
    pub compare_competitors: usize,
    pub discover_keywords: usize,
}

impl CallCounts {
    /// Get total number of API calls made.
    pub fn total(&self) -> usize {
        self.submit_analysis
            + self.get_task_status
            + self.analyze_app
            + self.compare_competitors
            + self.discover_keywords
    }
}

/// A captured API request for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRequest {
    /// The API method called (e.g., "compare_competitors")
    pub method: String,
    pub app_id: Option<String>,
    pub competitor_ids: Vec<String>,
}

/// Mock API client for testing.
///
/// # Example
/// ```ignore
/// let mock = MockAnalysisClient::new()
///     .with_status_sequence(vec![Ok(running()), Ok(completed())]);
/// ```
#[derive(Default)]
pub struct MockAnalysisClient {
    submit_results: Mutex<VecDeque<ApiResult<String>>>,
    status_results: Mutex<VecDeque<ApiResult<TaskStatusResponse>>>,
    app_results: Mutex<VecDeque<ApiResult<Value>>>,
    competitor_results: Mutex<VecDeque<ApiResult<Value>>>,
    keyword_results: Mutex<VecDeque<ApiResult<Value>>>,
    /// Artificial latency for status calls
    status_delay: Option<Duration>,
    call_count: Mutex<CallCounts>,
    captured_requests: Mutex<Vec<CapturedRequest>>,
    submitted: Mutex<Vec<AnalysisRequest>>,
}

impl MockAnalysisClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submit_results(mut self, results: Vec<ApiResult<String>>) -> Self {
        self.submit_results.get_mut().extend(results);
        self
    }

    pub fn with_status_sequence(mut self, results: Vec<ApiResult<TaskStatusResponse>>) -> Self {
        self.status_results.get_mut().extend(results);
        self
    }

    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    pub fn with_app_results(mut self, results: Vec<ApiResult<Value>>) -> Self {
        self.app_results.get_mut().extend(results);
        self
    }

    pub fn with_competitor_results(mut self, results: Vec<ApiResult<Value>>) -> Self {
        self.competitor_results.get_mut().extend(results);
        self
    }

    pub fn with_keyword_results(mut self, results: Vec<ApiResult<Value>>) -> Self {
        self.keyword_results.get_mut().extend(results);
        self
    }

    /// Snapshot of call counts
    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.captured_requests.lock().await.clone()
    }

    pub async fn submitted_requests(&self) -> Vec<AnalysisRequest> {
        self.submitted.lock().await.clone()
    }

    async fn capture_request(&self, method: &str, app_id: &str, competitor_ids: &[String]) {
        self.captured_requests.lock().await.push(CapturedRequest {
            method: method.to_string(),
            app_id: Some(app_id.to_string()),
            competitor_ids: competitor_ids.to_vec(),
        });
    }
}

/// Pop the next scripted response, repeating the last one
async fn next_result<T: Clone>(
    queue: &Mutex<VecDeque<ApiResult<T>>>,
    default: impl FnOnce() -> ApiResult<T>,
) -> ApiResult<T> {
    let mut queue = queue.lock().await;
    match queue.len() {
        0 => default(),
        1 => queue.front().cloned().unwrap_or_else(default),
        _ => queue.pop_front().unwrap_or_else(default),
    }
}

#[async_trait]
impl AnalysisApi for MockAnalysisClient {
    async fn submit_analysis(&self, request: &AnalysisRequest) -> ApiResult<String> {
        self.call_count.lock().await.submit_analysis += 1;
        self.submitted.lock().await.push(request.clone());
        next_result(&self.submit_results, || Ok("mock-task".to_string())).await
    }

    async fn get_task_status(&self, _task_id: &str) -> ApiResult<TaskStatusResponse> {
        self.call_count.lock().await.get_task_status += 1;
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        next_result(&self.status_results, || {
            Err(ApiError::InvalidResponse("no scripted status".to_string()))
        })
        .await
    }

    async fn analyze_app(&self, app_id: &str) -> ApiResult<Value> {
        self.call_count.lock().await.analyze_app += 1;
        self.capture_request("analyze_app", app_id, &[]).await;
        next_result(&self.app_results, || Ok(json!({"app_id": app_id}))).await
    }

    async fn compare_competitors(
        &self,
        app_id: &str,
        competitor_ids: &[String],
    ) -> ApiResult<Value> {
        self.call_count.lock().await.compare_competitors += 1;
        self.capture_request("compare_competitors", app_id, competitor_ids)
            .await;
        next_result(&self.competitor_results, || {
            Ok(json!({"app_id": app_id, "competitors": competitor_ids}))
        })
        .await
    }

    async fn discover_keywords(&self, app_id: &str, competitor_ids: &[String]) -> ApiResult<Value> {
        self.call_count.lock().await.discover_keywords += 1;
        self.capture_request("discover_keywords", app_id, competitor_ids)
            .await;
        next_result(&self.keyword_results, || {
            Ok(json!({"app_id": app_id, "keywords": ["wholesale", "b2b"]}))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::TaskStatus;

    #[tokio::test]
    async fn test_defaults() {
        let mock = MockAnalysisClient::new();
        let request = AnalysisRequest::new("com.test.app", Vec::<String>::new(), ["x"]);

        assert_eq!(mock.submit_analysis(&request).await.unwrap(), "mock-task");
        assert!(mock.get_task_status("mock-task").await.is_err());

        let counts = mock.call_counts().await;
        assert_eq!(counts.submit_analysis, 1);
        assert_eq!(counts.get_task_status, 1);
        assert_eq!(counts.total(), 2);
    }

    #[tokio::test]
    async fn test_last_result_repeats() {
        let running = TaskStatusResponse {
            status: TaskStatus::Running,
            ..Default::default()
        };
        let completed = TaskStatusResponse {
            status: TaskStatus::Completed,
            ..Default::default()
        };
        let mock = MockAnalysisClient::new().with_status_sequence(vec![Ok(running), Ok(completed)]);

        assert_eq!(
            mock.get_task_status("t").await.unwrap().status,
            TaskStatus::Running
        );
        assert_eq!(
            mock.get_task_status("t").await.unwrap().status,
            TaskStatus::Completed
        );
        assert_eq!(
            mock.get_task_status("t").await.unwrap().status,
            TaskStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_captures_requests() {
        let mock = MockAnalysisClient::new();
        let ids = vec!["com.a".to_string()];
        mock.compare_competitors("com.x", &ids).await.unwrap();

        let captured = mock.captured_requests().await;
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].method, "compare_competitors");
        assert_eq!(captured[0].competitor_ids, ids);
    }
}
