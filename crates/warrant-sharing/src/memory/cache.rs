use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use warrant_types::RequestContext;

use super::sieve::SieveMap;
use crate::ports::{Cache, CacheError};

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10_000) {
    Some(n) => n,
    None => unreachable!(),
};

/// Process-local [`Cache`] with SIEVE eviction and per-entry TTL.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: Mutex<SieveMap<String, Vec<u8>>>,
}

impl InMemoryCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(SieveMap::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
        ctx: &RequestContext,
    ) -> Result<std::sync::MutexGuard<'_, SieveMap<String, Vec<u8>>>, CacheError> {
        if ctx.is_cancelled() {
            return Err(CacheError::Cancelled);
        }
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".to_string()))
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Cache for InMemoryCache {
    fn get(&self, ctx: &RequestContext, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.lock(ctx)?;
        Ok(entries.get(&key.to_string(), Instant::now()).cloned())
    }

    fn set_with_ttl(
        &self,
        ctx: &RequestContext,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut entries = self.lock(ctx)?;
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Codec(format!("ttl out of range: {ttl:?}")))?;
        entries.insert(key.to_string(), value, expires_at, now);
        Ok(())
    }

    fn delete(&self, ctx: &RequestContext, key: &str) -> Result<(), CacheError> {
        self.lock(ctx)?.remove(&key.to_string());
        Ok(())
    }
}
