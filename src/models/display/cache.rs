//! Cache display models

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use super::common::{format_age, format_remaining};
use crate::cache::store::{CacheEntrySummary, CacheStats};
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::output::{Formattable, json::format_json, table::format_table};

/// Cached entry display model for `cache keys`
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct CacheEntryRow {
    #[tabled(rename = "KEY")]
    pub key: String,

    #[tabled(rename = "STORED")]
    pub stored: String,

    #[tabled(rename = "EXPIRES")]
    pub expires: String,
}

impl CacheEntryRow {
    pub fn from_summary(entry: &CacheEntrySummary, now: DateTime<Utc>) -> Self {
        Self {
            key: entry.key.clone(),
            stored: format_age(entry.stored_at, now),
            expires: if entry.expired {
                "expired".to_string()
            } else {
                format_remaining(entry.expires_at, now)
            },
        }
    }
}

/// Key listing; JSON keeps the raw timestamps
pub struct CacheKeysView {
    pub entries: Vec<CacheEntrySummary>,
    pub now: DateTime<Utc>,
}

impl Formattable for CacheKeysView {
    fn format(&self, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Json {
            return Ok(format_json(&self.entries)?);
        }
        let rows: Vec<CacheEntryRow> = self
            .entries
            .iter()
            .map(|e| CacheEntryRow::from_summary(e, self.now))
            .collect();
        Ok(format_table(&rows))
    }
}

/// `cache status` output
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatusView {
    /// Database file, `None` when the cache lives in memory only
    pub path: Option<String>,
    #[serde(flatten)]
    pub stats: CacheStats,
}

impl CacheStatusView {
    fn render(&self) -> String {
        let stamp = |at: Option<DateTime<Utc>>| {
            at.map(|d| {
                d.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            })
        };

        let mut lines = vec![
            "Cache Status".to_string(),
            "────────────────────────────────────────".to_string(),
            format!(
                "Location:       {}",
                self.path.as_deref().unwrap_or("memory only")
            ),
            format!("Valid entries:  {}", self.stats.valid_entries),
            format!("Expired:        {}", self.stats.expired_entries),
        ];
        if let Some(oldest) = stamp(self.stats.oldest_entry) {
            lines.push(format!("Oldest entry:   {}", oldest));
        }
        if let Some(newest) = stamp(self.stats.newest_entry) {
            lines.push(format!("Newest entry:   {}", newest));
        }
        lines.join("\n")
    }
}

impl Formattable for CacheStatusView {
    fn format(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Json => format_json(self)?,
            _ => self.render(),
        })
    }
}
