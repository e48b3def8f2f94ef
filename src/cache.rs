//! The shared key/value store.
//!
//! One [`Cache`] is created at server startup (optionally seeded from an RDB
//! snapshot) and lives for the lifetime of the process. Every connection
//! handler holds an `Arc` to it; access goes through a reader/writer lock so
//! that lookups from many connections proceed in parallel while writes take
//! the lock exclusively.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// A stored value and its optional absolute expiry deadline.
///
/// The deadline is a monotonic [`Instant`] so wall-clock jumps cannot revive
/// or prematurely kill an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: Bytes,
    pub expiry: Option<Instant>,
}

/// Thread-safe mapping from key to [`CacheEntry`].
///
/// An entry whose expiry has passed is logically absent: [`Cache::get`]
/// never returns it. The entry may remain physically present until it is
/// overwritten, which [`Cache::keys`] is allowed to expose.
#[derive(Debug, Default)]
pub struct Cache {
    entries: RwLock<HashMap<Bytes, CacheEntry>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cache pre-populated with the given entries.
    pub fn from_entries(entries: HashMap<Bytes, CacheEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Returns the value stored under `key`, if the key exists and has not
    /// expired. Takes the lock shared, so concurrent lookups do not contend.
    pub async fn get(&self, key: &[u8]) -> Option<Bytes> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;

        if let Some(expiry) = entry.expiry {
            if Instant::now() > expiry {
                return None;
            }
        }

        Some(entry.value.clone())
    }

    /// Inserts or overwrites the entry for `key`.
    ///
    /// With a `ttl`, the entry expires `ttl` past now on the monotonic
    /// clock. Without one, the entry never expires; any expiry left over
    /// from a previous write is cleared.
    pub async fn set(&self, key: Bytes, value: Bytes, ttl: Option<Duration>) {
        let expiry = ttl.map(|ttl| Instant::now() + ttl);

        let mut entries = self.entries.write().await;
        entries.insert(key, CacheEntry { value, expiry });
    }

    /// Snapshot of the currently stored keys, in no particular order.
    /// Expired entries may still appear; a subsequent GET resolves them.
    pub async fn keys(&self) -> Vec<Bytes> {
        let entries = self.entries.read().await;
        entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::time::sleep;

    fn b(text: &str) -> Bytes {
        Bytes::copy_from_slice(text.as_bytes())
    }

    #[tokio::test]
    async fn test_get_after_set_returns_value() {
        let cache = Cache::new();

        cache.set(b("grape"), b("mango"), None).await;

        assert_eq!(cache.get(b"grape").await, Some(b("mango")));
        assert_eq!(cache.get(b"missing").await, None);
    }

    #[tokio::test]
    async fn test_set_overwrites_value() {
        let cache = Cache::new();

        cache.set(b("grape"), b("mango"), None).await;
        cache.set(b("grape"), b("banana"), None).await;

        assert_eq!(cache.get(b"grape").await, Some(b("banana")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = Cache::new();

        cache
            .set(b("grape"), b("mango"), Some(Duration::from_millis(100)))
            .await;

        assert_eq!(cache.get(b"grape").await, Some(b("mango")));

        sleep(Duration::from_millis(99)).await;
        assert_eq!(cache.get(b"grape").await, Some(b("mango")));

        sleep(Duration::from_millis(2)).await;
        assert_eq!(cache.get(b"grape").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_clears_expiry() {
        let cache = Cache::new();

        cache
            .set(b("grape"), b("mango"), Some(Duration::from_millis(50)))
            .await;
        cache.set(b("grape"), b("banana"), None).await;

        sleep(Duration::from_secs(3600)).await;
        assert_eq!(cache.get(b"grape").await, Some(b("banana")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_may_include_expired_entries() {
        let cache = Cache::new();

        cache.set(b("grape"), b("mango"), None).await;
        cache
            .set(b("banana"), b("pear"), Some(Duration::from_millis(10)))
            .await;

        sleep(Duration::from_millis(20)).await;

        let mut keys = cache.keys().await;
        keys.sort();
        assert_eq!(keys, vec![b("banana"), b("grape")]);
        assert_eq!(cache.get(b"banana").await, None);
    }

    #[tokio::test]
    async fn test_from_entries_seeds_the_cache() {
        let entries = HashMap::from([(
            b("mykey"),
            CacheEntry {
                value: b("myval"),
                expiry: None,
            },
        )]);

        let cache = Cache::from_entries(entries);

        assert_eq!(cache.get(b"mykey").await, Some(b("myval")));
    }
}
