//! Cached multi-stage analysis: app, then competitors, then keywords
//!
//! Each stage goes through the [`CachedFetcher`] with its own key and TTL.
//! Stages run strictly in sequence and the first failing stage aborts the
//! run; there is no partial result.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::cache::key::normalized_competitors;
use crate::cache::{AnalysisKind, CacheTtl, CachedFetcher, cache_key};
use crate::client::models::{AppDescriptor, validate_package_name};
use crate::client::{AnalysisApi, RetryFailure, RetryPolicy, with_retry};
use crate::error::{ApiResult, JobError, Result};

/// Number of stages in a full run
pub const STAGE_COUNT: u8 = 3;

/// Stage counter published while a run is in progress; `0/0` when idle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageProgress {
    pub current: u8,
    pub total: u8,
}

impl StageProgress {
    pub fn is_running(&self) -> bool {
        self.total > 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    /// Skip cached values and overwrite them with fresh results
    pub force_fresh: bool,
}

/// Combined result of one orchestration run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedAnalysis {
    pub app_analysis: Value,
    /// `None` when no competitors were given
    pub competitor_analysis: Option<Value>,
    pub keyword_analysis: Value,
}

pub struct AnalysisOrchestrator<A: AnalysisApi> {
    api: Arc<A>,
    fetcher: CachedFetcher,
    retry: RetryPolicy,
    progress: watch::Sender<StageProgress>,
    /// Token for the current run, replaced once a cancelled run has finished
    cancel: Mutex<CancellationToken>,
}

impl<A: AnalysisApi> AnalysisOrchestrator<A> {
    pub fn new(api: Arc<A>, fetcher: CachedFetcher, retry: RetryPolicy) -> Self {
        let (progress, _) = watch::channel(StageProgress::default());
        Self {
            api,
            fetcher,
            retry,
            progress,
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StageProgress> {
        self.progress.subscribe()
    }

    /// Token that aborts backend calls and retry waits of the current or
    /// next run. After a cancelled run returns, later runs get a fresh token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.lock_cancel().clone()
    }

    fn lock_cancel(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        self.cancel.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run all three analyses for `app` and merge them
    pub async fn analyze(
        &self,
        app: &AppDescriptor,
        competitors: &[AppDescriptor],
        options: AnalyzeOptions,
    ) -> Result<MergedAnalysis> {
        let app_id = app.app_id.trim();
        validate_package_name(app_id)?;

        let competitor_ids: Vec<String> = normalized_competitors(
            &competitors
                .iter()
                .map(|c| c.app_id.as_str())
                .collect::<Vec<_>>(),
        )
        .into_iter()
        .filter(|id| id != app_id)
        .collect();
        for id in &competitor_ids {
            validate_package_name(id)?;
        }

        info!(
            "Analyzing {} against {} competitor(s)",
            app_id,
            competitor_ids.len()
        );
        let cancel = self.cancellation_token();
        self.set_stage(0);
        let result = self
            .run_stages(app_id, &competitor_ids, options, &cancel)
            .await;
        self.progress.send_replace(StageProgress::default());

        if cancel.is_cancelled() {
            let mut current = self.lock_cancel();
            if current.is_cancelled() {
                *current = CancellationToken::new();
            }
        }
        result
    }

    async fn run_stages(
        &self,
        app_id: &str,
        competitor_ids: &[String],
        options: AnalyzeOptions,
        cancel: &CancellationToken,
    ) -> Result<MergedAnalysis> {
        let force = options.force_fresh;

        let app_key = cache_key::<&str>(AnalysisKind::App, app_id, &[]);
        let app_analysis = self
            .stage(&app_key, CacheTtl::APP, force, move || {
                self.call("App analysis", cancel, move || {
                    self.api.analyze_app(app_id)
                })
            })
            .await?;
        self.set_stage(1);

        let competitor_analysis = if competitor_ids.is_empty() {
            debug!("No competitors given, skipping comparison");
            None
        } else {
            let key = cache_key(AnalysisKind::Competitors, app_id, competitor_ids);
            let value = self
                .stage(&key, CacheTtl::COMPETITORS, force, move || {
                    self.call("Competitor analysis", cancel, move || {
                        self.api.compare_competitors(app_id, competitor_ids)
                    })
                })
                .await?;
            Some(value)
        };
        self.set_stage(2);

        let keyword_key = cache_key(AnalysisKind::Keywords, app_id, competitor_ids);
        let keyword_analysis = self
            .stage(&keyword_key, CacheTtl::KEYWORDS, force, move || {
                self.call("Keyword analysis", cancel, move || {
                    self.api.discover_keywords(app_id, competitor_ids)
                })
            })
            .await?;
        self.set_stage(STAGE_COUNT);

        Ok(MergedAnalysis {
            app_analysis,
            competitor_analysis,
            keyword_analysis,
        })
    }

    /// Cached stage result, or a refreshed one when `force` is set
    async fn stage<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        force: bool,
        producer: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        if force {
            self.fetcher.refresh(key, ttl, producer).await
        } else {
            self.fetcher.fetch(key, ttl, false, producer).await
        }
    }

    async fn call<F, Fut>(&self, label: &str, cancel: &CancellationToken, op: F) -> Result<Value>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<Value>>,
    {
        with_retry(self.retry, cancel, label, op)
            .await
            .map_err(|failure| match failure {
                RetryFailure::Cancelled => JobError::Cancelled.into(),
                RetryFailure::Exhausted { error, .. } => error.into(),
            })
    }

    fn set_stage(&self, current: u8) {
        self.progress.send_replace(StageProgress {
            current,
            total: STAGE_COUNT,
        });
    }
}
