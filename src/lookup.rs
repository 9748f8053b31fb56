//! Lookup Service
//!
//! Composes the cache and the remote transliterator.
//!
//! ## Resolution
//! 1. Fresh cache entry: return it (no remote traffic, no file write)
//! 2. Otherwise ask the remote once
//!    - conversion: store it with `now`, persist, return it
//!    - nothing: return nothing, cache untouched (no negative caching)

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::Result;
use crate::remote::Transliterator;

/// Resolves readings to conversions
///
/// Owns its cache and remote client; the server hands out `&mut` access
/// from its single accept loop thread.
pub struct LookupService<T> {
    /// Expiring memo of remote answers
    cache: CacheStore,

    /// Fallback on a cache miss
    remote: T,
}

impl<T: Transliterator> LookupService<T> {
    pub fn new(cache: CacheStore, remote: T) -> Self {
        Self { cache, remote }
    }

    /// Build a service whose cache follows `config`
    pub fn from_config(config: &Config, remote: T) -> Self {
        let cache = CacheStore::with_ttl(config.cache_path.clone(), config.cache_ttl_secs);
        Self::new(cache, remote)
    }

    /// Resolve `reading` as of `now` (Unix seconds)
    ///
    /// Returns:
    /// - `Ok(Some(conversion))` from the cache or a fresh remote answer
    /// - `Ok(None)` when the remote has nothing
    /// - `Err(_)` when the cache file cannot be read or written
    pub fn resolve(&mut self, reading: &str, now: u64) -> Result<Option<String>> {
        if let Some(entry) = self.cache.get(reading, now)? {
            tracing::debug!("Cache hit for {:?}", reading);
            return Ok(Some(entry.conversion.clone()));
        }

        tracing::debug!("Cache miss for {:?}, asking remote", reading);

        match self.remote.transliterate(reading) {
            Some(conversion) => {
                self.cache.put(reading, &conversion, now)?;
                Ok(Some(conversion))
            }
            None => Ok(None),
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut CacheStore {
        &mut self.cache
    }

    pub fn remote(&self) -> &T {
        &self.remote
    }
}
