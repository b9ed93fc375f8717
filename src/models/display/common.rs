//! Common display utilities and helpers

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;

/// Placeholder for absent values
pub const EMPTY: &str = "--";

/// Truncate string to max length (in characters) with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Compact span such as `45s`, `12m`, `3h 5m` or `2d`
pub fn format_span(span: TimeDelta) -> String {
    let seconds = span.num_seconds().max(0);
    match seconds {
        0..=59 => format!("{}s", seconds),
        60..=3599 => format!("{}m", seconds / 60),
        3600..=86_399 => {
            let minutes = (seconds % 3600) / 60;
            if minutes == 0 {
                format!("{}h", seconds / 3600)
            } else {
                format!("{}h {}m", seconds / 3600, minutes)
            }
        }
        _ => format!("{}d", seconds / 86_400),
    }
}

/// "12m ago" style age of a timestamp
pub fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let span = now.signed_duration_since(at);
    if span < TimeDelta::zero() {
        return "just now".to_string();
    }
    format!("{} ago", format_span(span))
}

/// "in 12m" for future instants, "expired" for past ones
pub fn format_remaining(until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match until {
        Some(until) if until > now => format!("in {}", format_span(until.signed_duration_since(now))),
        Some(_) => "expired".to_string(),
        None => EMPTY.to_string(),
    }
}

/// One-line summary of an opaque analysis payload
pub fn summarize_value(value: &Value, max_len: usize) -> String {
    let summary = match value {
        Value::Null => EMPTY.to_string(),
        Value::String(s) => s.replace('\n', " "),
        Value::Array(items) if items.is_empty() => "(empty list)".to_string(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Array(items) => format!("{} items", items.len()),
        Value::Object(map) if map.is_empty() => "(empty)".to_string(),
        Value::Object(map) => map.keys().cloned().collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    };
    truncate_string(&summary, max_len)
}
