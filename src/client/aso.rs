//! ASO analysis backend client implementation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::models::{AnalysisRequest, CompareRequest, SubmitResponse, TaskStatusResponse};
use super::rate_limit::ReactiveRateLimiter;
use super::AnalysisApi;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};

/// Timeout for job submission and status calls
const JOB_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the synchronous analysis calls
const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(60);

/// Fallback when a 429 carries no usable Retry-After header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// HTTP client for the analysis backend
pub struct AsoClient {
    http: HttpClient,
    base_url: String,
    job_timeout: Duration,
    analysis_timeout: Duration,
    not_found_as_empty: bool,
    rate_limiter: Arc<ReactiveRateLimiter>,
}

impl AsoClient {
    /// Create a client for the backend at `base_url`
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let http = HttpClient::builder()
            .user_agent(concat!("asolens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            job_timeout: JOB_TIMEOUT,
            analysis_timeout: ANALYSIS_TIMEOUT,
            not_found_as_empty: false,
            rate_limiter: Arc::new(ReactiveRateLimiter::default()),
        })
    }

    /// Create a client from configuration, honouring a host override
    pub fn from_config(config: &Config, api_host: Option<&str>) -> ApiResult<Self> {
        Ok(Self::new(config.api_host(api_host))?
            .with_timeouts(config.timeouts.job(), config.timeouts.analysis())
            .with_not_found_as_empty(config.preferences.treat_not_found_as_empty))
    }

    pub fn with_timeouts(mut self, job: Duration, analysis: Duration) -> Self {
        self.job_timeout = job;
        self.analysis_timeout = analysis;
        self
    }

    /// Make 404 from the synchronous analysis endpoints an empty result
    pub fn with_not_found_as_empty(mut self, enabled: bool) -> Self {
        self.not_found_as_empty = enabled;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode the JSON body.
    ///
    /// `empty_on_404` turns a 404 into an empty JSON object decoded as `T`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        timeout: Duration,
        empty_on_404: bool,
    ) -> ApiResult<T> {
        self.rate_limiter.wait_if_active().await;

        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        log::debug!("{} {}", status.as_u16(), response.url());

        match status {
            status if status.is_success() => {
                let data = response.json::<T>().await.map_err(|e| {
                    if e.is_timeout() {
                        ApiError::Timeout
                    } else {
                        ApiError::InvalidResponse(format!("Failed to parse response: {}", e))
                    }
                })?;
                Ok(data)
            }
            StatusCode::NOT_FOUND if empty_on_404 => {
                log::debug!("Treating 404 as empty result");
                serde_json::from_value(Value::Object(Default::default()))
                    .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            }
            StatusCode::NOT_FOUND => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::NotFound(
                    error_detail(&body).unwrap_or_else(|| "Resource not found".to_string()),
                ))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                self.rate_limiter.activate();
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                Err(ApiError::RateLimit(Duration::from_secs(retry_after)))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::BadRequest(
                    error_detail(&body).unwrap_or_else(|| "Bad request".to_string()),
                ))
            }
            status if status.is_server_error() => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::ServerError(
                    error_detail(&body).unwrap_or_else(|| format!("Server error: {}", status)),
                ))
            }
            _ => Err(ApiError::InvalidResponse(format!(
                "Unexpected status code: {}",
                status
            ))),
        }
    }
}

/// Extract the message from a `{"detail": ...}` error body, falling back to
/// the raw text when the body is not in that shape.
fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(other) => Some(other.to_string()),
            None => Some(trimmed.to_string()),
        },
        _ => Some(trimmed.to_string()),
    }
}

#[async_trait]
impl AnalysisApi for AsoClient {
    async fn submit_analysis(&self, request: &AnalysisRequest) -> ApiResult<String> {
        let builder = self.http.post(self.url("/api/analyze")).json(request);
        let response: SubmitResponse = self.send(builder, self.job_timeout, false).await?;

        if let Some(error) = response.error {
            return Err(ApiError::Backend(error));
        }
        response
            .task_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("Response is missing task_id".to_string()))
    }

    async fn get_task_status(&self, task_id: &str) -> ApiResult<TaskStatusResponse> {
        let builder = self.http.get(self.url(&format!("/api/analyze/{}", task_id)));
        self.send(builder, self.job_timeout, false).await
    }

    async fn analyze_app(&self, app_id: &str) -> ApiResult<Value> {
        let builder = self
            .http
            .get(self.url(&format!("/api/analyze/app/{}", app_id)));
        self.send(builder, self.analysis_timeout, self.not_found_as_empty)
            .await
    }

    async fn compare_competitors(
        &self,
        app_id: &str,
        competitor_ids: &[String],
    ) -> ApiResult<Value> {
        let builder = self
            .http
            .post(self.url("/api/analyze/competitors/compare"))
            .json(&CompareRequest {
                app_id,
                competitor_ids,
            });
        self.send(builder, self.analysis_timeout, self.not_found_as_empty)
            .await
    }

    async fn discover_keywords(&self, app_id: &str, competitor_ids: &[String]) -> ApiResult<Value> {
        let builder = self
            .http
            .post(self.url("/api/analyze/keywords/discover"))
            .json(&CompareRequest {
                app_id,
                competitor_ids,
            });
        self.send(builder, self.analysis_timeout, self.not_found_as_empty)
            .await
    }
}
