//! Best-effort typed access to the share cache.
//!
//! Every failure here is logged and swallowed. A cache miss and a cache
//! outage look the same to the service.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use warrant_types::{RequestContext, ShareId};

use crate::ports::Cache;

pub(crate) fn link_key(id: ShareId) -> String {
    format!("share:link:{id}")
}

pub(crate) fn token_key(fingerprint: &str) -> String {
    format!("share:token:{fingerprint}")
}

#[derive(Clone)]
pub(crate) struct ShareCache {
    inner: Arc<dyn Cache>,
}

impl ShareCache {
    pub(crate) fn new(inner: Arc<dyn Cache>) -> Self {
        Self { inner }
    }

    pub(crate) fn get<T: DeserializeOwned>(&self, ctx: &RequestContext, key: &str) -> Option<T> {
        let bytes = match self.inner.get(ctx, key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                self.delete(ctx, key);
                None
            }
        }
    }

    /// Stores `value` for `ttl`. Zero TTLs are skipped.
    pub(crate) fn put<T: Serialize>(&self, ctx: &RequestContext, key: &str, value: &T, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "Cache encode failed");
                return;
            }
        };
        if let Err(e) = self.inner.set_with_ttl(ctx, key, bytes, ttl) {
            warn!(key, error = %e, "Cache write failed");
        }
    }

    pub(crate) fn delete(&self, ctx: &RequestContext, key: &str) {
        if let Err(e) = self.inner.delete(ctx, key) {
            warn!(key, error = %e, "Cache delete failed");
        }
    }
}
