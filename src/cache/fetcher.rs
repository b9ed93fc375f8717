//! "Check cache, else fetch and populate" wrapper around any async producer

use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::CacheStore;
use crate::error::Result;

/// Cache-keyed fetcher over a shared [`CacheStore`].
///
/// A hit returns without invoking the producer. A miss invokes it once and
/// writes the result; a failed producer leaves the cache untouched.
#[derive(Clone)]
pub struct CachedFetcher {
    store: Arc<CacheStore>,
}

impl CachedFetcher {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Try to get cached data
    fn get_cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.store.get(key)?;
        match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                log::debug!("Cached value for {} has unexpected shape: {}", key, e);
                None
            }
        }
    }

    /// Return fresh cached data for `key`, or run `producer` and cache its result
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        force_fresh: bool,
        producer: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !force_fresh {
            if let Some(cached) = self.get_cached(key) {
                log::debug!("Cache hit: {}", key);
                return Ok(cached);
            }
            log::debug!("Cache miss: {}", key);
        } else {
            log::debug!("Bypassing cache: {}", key);
        }

        let result = producer().await?;

        match serde_json::to_value(&result) {
            Ok(value) => self.store.set(key, value, ttl),
            Err(e) => log::warn!("Not caching {}: {}", key, e),
        }
        Ok(result)
    }

    /// Fetch ignoring any cached value, then overwrite the entry
    pub async fn refresh<T, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.fetch(key, ttl, true, producer).await
    }

    /// Drop the cached value for `key`
    pub fn invalidate(&self, key: &str) -> bool {
        self.store.invalidate(key)
    }
}
