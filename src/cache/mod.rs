//! Local cache for analysis responses
//!
//! A TTL-aware key/value store persisted as one versioned record, plus a
//! fetcher that consults it before calling the backend.

pub mod clock;
pub mod fetcher;
pub mod key;
pub mod storage;
pub mod store;

use std::time::Duration;

/// Cache TTL configuration per analysis kind
pub struct CacheTtl;

impl CacheTtl {
    pub const APP: Duration = Duration::from_secs(30 * 60); // 30 min
    pub const COMPETITORS: Duration = Duration::from_secs(60 * 60); // 1 hr
    pub const KEYWORDS: Duration = Duration::from_secs(2 * 60 * 60); // 2 hr
}

// Re-export main types
pub use fetcher::CachedFetcher;
pub use key::{AnalysisKind, cache_key};
pub use storage::SqliteStorage;
pub use store::CacheStore;
