//! Pool Snapshot Cache (C2)
//!
//! Single-flight, TTL'd cache of composite pool snapshots, grounded on the
//! teacher's `dashmap`+`once_cell` shared-state pattern and the TTL refresh
//! style of its price oracle.
//!
//! Author: AI-Generated
//! Created: 2026-01-29

use crate::error::EngineError;
use crate::transport::GatewayClient;
use crate::types::{PoolSnapshot, TokenKey};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

pub type PoolKey = (TokenKey, TokenKey, u32);

fn canonical_key(t0: &TokenKey, t1: &TokenKey, fee: u32) -> PoolKey {
    if t0 <= t1 {
        (t0.clone(), t1.clone(), fee)
    } else {
        (t1.clone(), t0.clone(), fee)
    }
}

struct Entry {
    snapshot: OnceCell<Result<PoolSnapshot, String>>,
    expires_at: Instant,
}

/// TTL'd, single-flight cache of pool snapshots (C2).
pub struct PoolCache {
    gateway: Arc<GatewayClient>,
    ttl: Duration,
    entries: DashMap<PoolKey, Arc<Entry>>,
}

impl PoolCache {
    pub fn new(gateway: Arc<GatewayClient>, ttl: Duration) -> Self {
        Self {
            gateway,
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Returns a live snapshot for `(t0,t1,fee)`, fetching it from the
    /// gateway if absent or expired. Concurrent `get`s for the same key
    /// coalesce onto a single in-flight fetch.
    pub async fn get(
        &self,
        t0: &TokenKey,
        t1: &TokenKey,
        fee: u32,
    ) -> Result<PoolSnapshot, EngineError> {
        let key = canonical_key(t0, t1, fee);
        let now = Instant::now();

        let needs_fresh_entry = match self.entries.get(&key) {
            Some(existing) if existing.expires_at > now => false,
            _ => true,
        };

        let entry = if needs_fresh_entry {
            let fresh = Arc::new(Entry {
                snapshot: OnceCell::new(),
                expires_at: now + self.ttl,
            });
            self.entries.insert(key.clone(), Arc::clone(&fresh));
            fresh
        } else {
            Arc::clone(&*self.entries.get(&key).expect("just checked present"))
        };

        let gateway = Arc::clone(&self.gateway);
        let (t0c, t1c) = (key.0.clone(), key.1.clone());
        let result = entry
            .snapshot
            .get_or_init(|| async move {
                debug!(%t0c, %t1c, fee, "pool cache miss, fetching");
                gateway
                    .get_composite_pool(&t0c, &t1c, fee)
                    .await
                    .map_err(|e| e.to_string())
            })
            .await;

        match result {
            Ok(snapshot) => Ok(snapshot.clone()),
            Err(msg) => {
                warn!(%t0, %t1, fee, error = %msg, "pool fetch failed");
                Err(EngineError::Transport(msg.clone()))
            }
        }
    }

    /// Returns every currently-live (unexpired) snapshot, used by the path
    /// finder. Expired entries are skipped, not evicted, by this call.
    pub fn snapshot_all(&self) -> Vec<PoolSnapshot> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|e| e.expires_at > now)
            .filter_map(|e| e.snapshot.get().and_then(|r| r.as_ref().ok()).cloned())
            .collect()
    }

    /// Removes all expired entries.
    pub fn evict_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, v| v.expires_at > now);
    }

    pub fn evict_all(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayUrls;

    fn test_gateway() -> Arc<GatewayClient> {
        Arc::new(GatewayClient::new(GatewayUrls {
            gateway_url: "https://example.invalid".into(),
            gateway_base_path: "/api".into(),
            bundler_url: "https://example.invalid".into(),
            bundler_base_path: "/api".into(),
            backend_url: "https://example.invalid".into(),
            backend_base_path: "/api".into(),
        }))
    }

    #[test]
    fn canonical_key_is_order_independent() {
        let a = TokenKey::from_symbol("A");
        let b = TokenKey::from_symbol("B");
        assert_eq!(canonical_key(&a, &b, 3000), canonical_key(&b, &a, 3000));
    }

    #[tokio::test]
    async fn evict_expired_removes_stale_entries() {
        let cache = PoolCache::new(test_gateway(), Duration::from_millis(1));
        let a = TokenKey::from_symbol("A");
        let b = TokenKey::from_symbol("B");
        // seed a fake entry directly without hitting the network.
        let key = canonical_key(&a, &b, 3000);
        cache.entries.insert(
            key,
            Arc::new(Entry {
                snapshot: OnceCell::new(),
                expires_at: Instant::now() - Duration::from_secs(1),
            }),
        );
        assert_eq!(cache.entries.len(), 1);
        cache.evict_expired();
        assert_eq!(cache.entries.len(), 0);
    }
}
