//! Cache key composition for analysis responses
//!
//! Keys are readable so `asolens cache keys` can show what is stored. The
//! competitor part is sorted and deduplicated, so the order in which
//! competitors were given never changes the key. Competitor ids are joined
//! with `,`, which cannot occur in a package name, so two different
//! competitor lists never share a key.

use std::fmt;

/// Which analysis a cached payload belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    App,
    Competitors,
    Keywords,
}

impl AnalysisKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            AnalysisKind::App => "app_analysis",
            AnalysisKind::Competitors => "competitor_analysis",
            AnalysisKind::Keywords => "keyword_analysis",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Sorted, deduplicated competitor ids
pub fn normalized_competitors<S: AsRef<str>>(competitor_ids: &[S]) -> Vec<String> {
    let mut ids: Vec<String> = competitor_ids
        .iter()
        .map(|id| id.as_ref().trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Deterministic key for one analysis kind.
///
/// The app analysis key depends only on the app id; the other two also
/// include the normalized competitor list.
pub fn cache_key<S: AsRef<str>>(kind: AnalysisKind, app_id: &str, competitor_ids: &[S]) -> String {
    match kind {
        AnalysisKind::App => format!("{}_{}", kind.prefix(), app_id),
        AnalysisKind::Competitors | AnalysisKind::Keywords => format!(
            "{}_{}_{}",
            kind.prefix(),
            app_id,
            normalized_competitors(competitor_ids).join(",")
        ),
    }
}
