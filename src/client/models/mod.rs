//! Analysis backend data models
//!
//! Request bodies and response payloads exchanged with the backend. Analysis
//! content itself stays opaque JSON.

mod request;
mod task;

pub use request::{AnalysisRequest, AppDescriptor, CompareRequest, validate_package_name};
pub use task::{AnalysisResult, AnalysisSections, SubmitResponse, TaskStatus, TaskStatusResponse};
