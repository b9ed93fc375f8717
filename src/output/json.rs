//! JSON output formatting
//!
//! Every JSON result is printed as `{"data": ..., "meta": {...}}` so scripts
//! can tell which asolens build produced it and when.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Envelope around a borrowed result
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a, T: ?Sized> {
    pub data: &'a T,
    pub meta: Meta,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    #[serde(rename = "timestamp", serialize_with = "rfc3339")]
    pub generated_at: DateTime<Utc>,
    pub version: &'static str,
}

fn rfc3339<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

impl<'a, T: ?Sized> JsonOutput<'a, T> {
    pub fn new(data: &'a T) -> Self {
        Self {
            data,
            meta: Meta {
                generated_at: Utc::now(),
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}

/// Pretty-printed JSON inside the standard envelope
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(data))
}
