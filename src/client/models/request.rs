//! Analysis request models

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Body of `POST /api/analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Target app package, e.g. `com.example.app`
    pub package_name: String,

    /// Competitor packages, deduplicated, in the order given
    #[serde(default)]
    pub competitor_package_names: Vec<String>,

    #[serde(default)]
    pub keywords: Vec<String>,
}

impl AnalysisRequest {
    /// Build a normalized request.
    ///
    /// Inputs are trimmed and blanks dropped. Competitors keep their first
    /// occurrence only, and the target app itself is never its own competitor.
    pub fn new<P, C, K>(package_name: P, competitors: C, keywords: K) -> Self
    where
        P: Into<String>,
        C: IntoIterator,
        C::Item: AsRef<str>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        let package_name = package_name.into().trim().to_string();

        let mut competitor_package_names: Vec<String> = Vec::new();
        for competitor in competitors {
            let competitor = competitor.as_ref().trim();
            if competitor.is_empty()
                || competitor == package_name
                || competitor_package_names.iter().any(|c| c == competitor)
            {
                continue;
            }
            competitor_package_names.push(competitor.to_string());
        }

        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            package_name,
            competitor_package_names,
            keywords,
        }
    }

    /// Check the target and competitor packages before anything is sent
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_package_name(&self.package_name)?;
        self.competitor_package_names
            .iter()
            .try_for_each(|competitor| validate_package_name(competitor))
    }
}

/// Android application id rules: at least two dot-separated segments, each
/// starting with a letter and made of ASCII letters, digits or `_`.
pub fn validate_package_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyPackageName);
    }

    let segments: Vec<&str> = name.split('.').collect();
    let valid = segments.len() >= 2
        && segments.iter().all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidPackageName(name.to_string()))
    }
}

/// An app as picked by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDescriptor {
    pub app_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AppDescriptor {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            name: None,
        }
    }
}

/// Body of the competitor comparison and keyword discovery endpoints
#[derive(Debug, Clone, Serialize)]
pub struct CompareRequest<'a> {
    pub app_id: &'a str,
    pub competitor_ids: &'a [String],
}
