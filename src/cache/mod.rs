//! In-process cache with per-entry expiry.
//!
//! Stands in for the external cache backend. Callers write through a
//! tenant-scoped prefix (see `TenantContext::cache_prefix`) so entries
//! from different tenants can never collide.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct Entry {
    value: String,
    expires_at: Instant,
}

pub struct CacheStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl CacheStore {
    pub fn instance() -> &'static CacheStore {
        static INSTANCE: OnceLock<CacheStore> = OnceLock::new();
        INSTANCE.get_or_init(|| CacheStore {
            entries: Mutex::new(HashMap::new()),
        })
    }

    #[cfg(test)]
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn put(&self, key: &str, value: &str, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                // Expired; drop it on the way out
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn forget(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
    }

    /// Build a cache key under a tenant (or landlord) prefix.
    pub fn scoped_key(prefix: &str, key: &str) -> String {
        format!("{}:{}", prefix, key)
    }
}
