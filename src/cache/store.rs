//! TTL-aware key/value store for analysis responses
//!
//! Entries live in memory and the whole map is rewritten to durable storage
//! after every mutation, as one versioned `{version, data}` record. Storage
//! failures are logged and the store carries on memory-only: callers never
//! see a cache error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::storage::{DurableStorage, MemoryStorage};

/// Record name under which the cache map is persisted
pub const STORAGE_KEY: &str = "app_cache";

/// Envelope version; any other stored version is discarded on load
pub const CACHE_VERSION: &str = "1.0";

/// TTL used when the caller does not pick one
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A single cached payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,

    #[serde(rename = "timestamp")]
    pub stored_at: DateTime<Utc>,

    #[serde(rename = "ttl", with = "ttl_millis")]
    pub ttl: Duration,
}

impl CacheEntry {
    /// Valid iff `now - stored_at < ttl`
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.stored_at);
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => age < ttl,
            // TTL beyond chrono's range never expires
            Err(_) => true,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| self.stored_at.checked_add_signed(ttl))
    }
}

mod ttl_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(ttl.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: &'a str,
    data: &'a HashMap<String, CacheEntry>,
}

#[derive(Deserialize)]
struct RawEnvelope {
    version: String,
    #[serde(default)]
    data: HashMap<String, Value>,
}

struct Inner {
    entries: HashMap<String, CacheEntry>,
    /// `None` once persistence has failed or was never available
    storage: Option<Box<dyn DurableStorage>>,
}

impl Inner {
    fn persist(&mut self) {
        let Some(storage) = self.storage.as_mut() else {
            return;
        };

        let envelope = EnvelopeRef {
            version: CACHE_VERSION,
            data: &self.entries,
        };
        let result = serde_json::to_string(&envelope)
            .map_err(crate::error::CacheError::from)
            .and_then(|json| storage.set_item(STORAGE_KEY, &json));

        if let Err(e) = result {
            log::warn!("Failed to save cache, continuing in memory only: {}", e);
            self.storage = None;
        }
    }
}

/// Statistics about cache state
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
    pub persistent: bool,
}

/// Per-key view used by `cache keys`
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntrySummary {
    pub key: String,
    pub stored_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub expired: bool,
}

/// TTL cache shared by every fetcher in the process
pub struct CacheStore {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Build a store over `storage`, loading whatever it already holds
    pub fn new(storage: Box<dyn DurableStorage>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    /// Memory-only store
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    pub fn with_clock(storage: Box<dyn DurableStorage>, clock: Arc<dyn Clock>) -> Self {
        let entries = load_entries(storage.as_ref());
        log::debug!("Loaded {} cache entries", entries.len());
        Self {
            inner: Mutex::new(Inner {
                entries,
                storage: Some(storage),
            }),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves a usable map behind
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached value for `key`, or `None` if missing or expired.
    ///
    /// Expired entries are evicted as a side effect.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let mut inner = self.lock();

        let valid = match inner.entries.get(key) {
            None => return None,
            Some(entry) => entry.is_valid(now),
        };

        if valid {
            return inner.entries.get(key).map(|e| e.data.clone());
        }

        log::debug!("Cache entry expired: {}", key);
        inner.entries.remove(key);
        inner.persist();
        None
    }

    /// Insert or overwrite `key`, stamped with the current time.
    ///
    /// `None` stores the entry for [`DEFAULT_TTL`].
    pub fn set(&self, key: &str, value: Value, ttl: impl Into<Option<Duration>>) {
        let entry = CacheEntry {
            data: value,
            stored_at: self.clock.now(),
            ttl: ttl.into().unwrap_or(DEFAULT_TTL),
        };
        let mut inner = self.lock();
        inner.entries.insert(key.to_string(), entry);
        inner.persist();
    }

    /// Remove a single entry. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut inner = self.lock();
        let existed = inner.entries.remove(key).is_some();
        inner.persist();
        existed
    }

    /// Drop every entry and the persisted record. Returns the number removed.
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let removed = inner.entries.len();
        inner.entries.clear();

        if let Some(storage) = inner.storage.as_mut()
            && let Err(e) = storage.remove_item(STORAGE_KEY)
        {
            log::warn!("Failed to clear persisted cache: {}", e);
            inner.storage = None;
        }
        removed
    }

    /// Whether writes still reach durable storage
    pub fn is_persistent(&self) -> bool {
        self.lock().storage.is_some()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let persistent = self.is_persistent();
        let inner = self.lock();

        let valid: Vec<&CacheEntry> = inner
            .entries
            .values()
            .filter(|e| e.is_valid(now))
            .collect();

        CacheStats {
            total_entries: inner.entries.len(),
            valid_entries: valid.len(),
            expired_entries: inner.entries.len() - valid.len(),
            oldest_entry: valid.iter().map(|e| e.stored_at).min(),
            newest_entry: valid.iter().map(|e| e.stored_at).max(),
            persistent,
        }
    }

    /// All entries sorted by key
    pub fn entries(&self) -> Vec<CacheEntrySummary> {
        let now = self.clock.now();
        let inner = self.lock();

        let mut summaries: Vec<CacheEntrySummary> = inner
            .entries
            .iter()
            .map(|(key, entry)| CacheEntrySummary {
                key: key.clone(),
                stored_at: entry.stored_at,
                expires_at: entry.expires_at(),
                expired: !entry.is_valid(now),
            })
            .collect();
        summaries.sort_by(|a, b| a.key.cmp(&b.key));
        summaries
    }
}

fn load_entries(storage: &dyn DurableStorage) -> HashMap<String, CacheEntry> {
    let raw = match storage.get_item(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return HashMap::new(),
        Err(e) => {
            log::warn!("Failed to load cache from storage: {}", e);
            return HashMap::new();
        }
    };

    let envelope: RawEnvelope = match serde_json::from_str(&raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            log::warn!("Ignoring corrupt cache record: {}", e);
            return HashMap::new();
        }
    };

    if envelope.version != CACHE_VERSION {
        log::info!(
            "Cache version mismatch ({} != {}), discarding",
            envelope.version,
            CACHE_VERSION
        );
        return HashMap::new();
    }

    envelope
        .data
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(entry) => Some((key, entry)),
            Err(e) => {
                log::debug!("Skipping unreadable cache entry {}: {}", key, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::error::CacheError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Storage that shares its record with the test so reloads can be simulated
    #[derive(Clone, Default)]
    struct SharedStorage {
        items: Arc<Mutex<HashMap<String, String>>>,
        writes: Arc<AtomicUsize>,
    }

    impl DurableStorage for SharedStorage {
        fn get_item(&self, key: &str) -> std::result::Result<Option<String>, CacheError> {
            Ok(self.items.lock().unwrap().get(key).cloned())
        }

        fn set_item(&mut self, key: &str, value: &str) -> std::result::Result<(), CacheError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.items
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove_item(&mut self, key: &str) -> std::result::Result<(), CacheError> {
            self.items.lock().unwrap().remove(key);
            Ok(())
        }
    }

    /// Storage whose writes always fail (quota exceeded, disabled storage...)
    struct FailingStorage;

    impl DurableStorage for FailingStorage {
        fn get_item(&self, _key: &str) -> std::result::Result<Option<String>, CacheError> {
            Err(CacheError::Io("storage disabled".into()))
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> std::result::Result<(), CacheError> {
            Err(CacheError::Io("quota exceeded".into()))
        }

        fn remove_item(&mut self, _key: &str) -> std::result::Result<(), CacheError> {
            Err(CacheError::Io("storage disabled".into()))
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc::now()))
    }

    #[test]
    fn test_set_then_get() {
        let store = CacheStore::in_memory();
        store.set("k", json!({"score": 42}), Duration::from_secs(60));
        assert_eq!(store.get("k"), Some(json!({"score": 42})));
    }

    #[test]
    fn test_missing_key() {
        let store = CacheStore::in_memory();
        assert!(store.get("absent").is_none());
    }

    #[test]
    fn test_ttl_expiry_is_lazy_and_evicts() {
        let clock = clock();
        let store = CacheStore::with_clock(Box::new(MemoryStorage::new()), clock.clone());

        store.set("k", json!("v"), Duration::from_millis(5000));

        clock.advance(Duration::from_millis(4000));
        assert_eq!(store.get("k"), Some(json!("v")));
        assert_eq!(store.len(), 1);

        clock.advance(Duration::from_millis(2000));
        assert!(store.get("k").is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_expires_exactly_at_ttl() {
        let clock = clock();
        let store = CacheStore::with_clock(Box::new(MemoryStorage::new()), clock.clone());
        store.set("k", json!(1), Duration::from_secs(10));
        clock.advance(Duration::from_secs(10));
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_default_ttl_is_five_minutes() {
        let clock = clock();
        let store = CacheStore::with_clock(Box::new(MemoryStorage::new()), clock.clone());
        store.set("k", json!(1), None);

        clock.advance(Duration::from_secs(299));
        assert!(store.get("k").is_some());
        clock.advance(Duration::from_secs(1));
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_set_overwrites_and_restamps() {
        let clock = clock();
        let store = CacheStore::with_clock(Box::new(MemoryStorage::new()), clock.clone());

        store.set("k", json!(1), Duration::from_secs(10));
        clock.advance(Duration::from_secs(8));
        store.set("k", json!(2), Duration::from_secs(10));
        clock.advance(Duration::from_secs(8));

        assert_eq!(store.get("k"), Some(json!(2)));
    }

    #[test]
    fn test_invalidate() {
        let store = CacheStore::in_memory();
        store.set("k", json!(1), None);
        assert!(store.invalidate("k"));
        assert!(store.get("k").is_none());
        assert!(!store.invalidate("k"));
    }

    #[test]
    fn test_clear_removes_persisted_record() {
        let storage = SharedStorage::default();
        let store = CacheStore::new(Box::new(storage.clone()));
        store.set("a", json!(1), DEFAULT_TTL);
        store.set("b", json!(2), DEFAULT_TTL);

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert!(storage.items.lock().unwrap().get(STORAGE_KEY).is_none());
    }

    #[test]
    fn test_every_mutation_persists() {
        let storage = SharedStorage::default();
        let store = CacheStore::new(Box::new(storage.clone()));

        store.set("a", json!(1), DEFAULT_TTL);
        store.set("b", json!(2), DEFAULT_TTL);
        store.invalidate("a");

        assert_eq!(storage.writes.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_survives_reload() {
        let storage = SharedStorage::default();
        {
            let store = CacheStore::new(Box::new(storage.clone()));
            store.set("app_analysis_com.test.app", json!({"ok": true}), DEFAULT_TTL);
        }

        let reloaded = CacheStore::new(Box::new(storage));
        assert_eq!(
            reloaded.get("app_analysis_com.test.app"),
            Some(json!({"ok": true}))
        );
    }

    #[test]
    fn test_version_mismatch_discards_everything() {
        let storage = SharedStorage::default();
        storage.items.lock().unwrap().insert(
            STORAGE_KEY.to_string(),
            json!({
                "version": "0.9",
                "data": {
                    "k": {"data": 1, "timestamp": Utc::now().to_rfc3339(), "ttl": 60000}
                }
            })
            .to_string(),
        );

        let store = CacheStore::new(Box::new(storage));
        assert!(store.is_empty());
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_persisted_format() {
        let storage = SharedStorage::default();
        let store = CacheStore::new(Box::new(storage.clone()));
        store.set("k", json!({"x": 1}), Duration::from_secs(30));

        let raw = storage.items.lock().unwrap().get(STORAGE_KEY).cloned().unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["version"], CACHE_VERSION);
        assert_eq!(parsed["data"]["k"]["data"], json!({"x": 1}));
        assert_eq!(parsed["data"]["k"]["ttl"], 30_000);
        assert!(parsed["data"]["k"]["timestamp"].is_string());
    }

    #[test]
    fn test_corrupt_record_is_ignored() {
        let storage = SharedStorage::default();
        storage
            .items
            .lock()
            .unwrap()
            .insert(STORAGE_KEY.to_string(), "{not json".to_string());

        let store = CacheStore::new(Box::new(storage));
        assert!(store.is_empty());

        // Still usable afterwards
        store.set("k", json!(1), DEFAULT_TTL);
        assert_eq!(store.get("k"), Some(json!(1)));
    }

    #[test]
    fn test_storage_failure_degrades_to_memory() {
        let store = CacheStore::new(Box::new(FailingStorage));
        assert!(store.is_persistent());

        store.set("k", json!("v"), DEFAULT_TTL);
        assert!(!store.is_persistent());
        assert_eq!(store.get("k"), Some(json!("v")));

        store.invalidate("k");
        assert_eq!(store.clear(), 0);
    }

    #[test]
    fn test_stats() {
        let clock = clock();
        let store = CacheStore::with_clock(Box::new(MemoryStorage::new()), clock.clone());

        store.set("short", json!(1), Duration::from_secs(1));
        store.set("long", json!(2), Duration::from_secs(600));
        clock.advance(Duration::from_secs(5));

        let stats = store.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.valid_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert!(stats.oldest_entry.is_some());
        assert!(stats.persistent);
    }

    #[test]
    fn test_entries_sorted_with_expiry_flag() {
        let clock = clock();
        let store = CacheStore::with_clock(Box::new(MemoryStorage::new()), clock.clone());

        store.set("b", json!(1), Duration::from_secs(1));
        store.set("a", json!(2), Duration::from_secs(600));
        clock.advance(Duration::from_secs(2));

        let entries = store.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "a");
        assert!(!entries[0].expired);
        assert_eq!(entries[1].key, "b");
        assert!(entries[1].expired);
    }
}
