//! Analysis job (task) models
//!
//! Every section of a status response is optional: a running job fills them
//! in as the backend progresses, and absence is never an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of `POST /api/analyze`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Backend-side job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Error,
    /// Anything else the backend may report; treated like `Running`
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Error => "error",
            TaskStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Analysis sections produced by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSections {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_analysis: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_analysis: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_suggestions: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_trends: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_optimization: Option<Value>,
}

/// Response of `GET /api/analyze/{task_id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisSections>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStatusResponse {
    /// Competitor data counts only when it is a non-empty list
    pub fn has_competitor_data(&self) -> bool {
        self.competitor_data
            .as_ref()
            .and_then(Value::as_array)
            .is_some_and(|list| !list.is_empty())
    }

    fn section(&self, pick: impl Fn(&AnalysisSections) -> &Option<Value>) -> Option<Value> {
        self.analysis.as_ref().and_then(|a| pick(a).clone())
    }

    /// Completed-job view handed to renderers
    pub fn to_result(&self) -> AnalysisResult {
        AnalysisResult {
            app_metadata: self.app_data.clone(),
            analysis: self.section(|a| &a.app_analysis),
            competitor_analysis: self.section(|a| &a.competitor_analysis),
            keyword_suggestions: self.section(|a| &a.keyword_suggestions),
            market_trends: self.section(|a| &a.market_trends),
            description_optimization: self.section(|a| &a.description_optimization),
        }
    }
}

/// Result of a completed analysis job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_metadata: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_analysis: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_suggestions: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_trends: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_optimization: Option<Value>,
}

impl AnalysisResult {
    /// Section names paired with their payloads, in display order
    pub fn sections(&self) -> [(&'static str, Option<&Value>); 6] {
        [
            ("App metadata", self.app_metadata.as_ref()),
            ("App analysis", self.analysis.as_ref()),
            ("Competitor analysis", self.competitor_analysis.as_ref()),
            ("Keyword suggestions", self.keyword_suggestions.as_ref()),
            ("Market trends", self.market_trends.as_ref()),
            ("Description optimization", self.description_optimization.as_ref()),
        ]
    }
}
