use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{Cache, Expiration, DEFAULT_CACHE_TTL};
use crate::context::RequestContext;
use crate::error::CacheError;

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Option<Duration>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.stored_at) > ttl,
            None => false,
        }
    }
}

type Entries<V> = Mutex<HashMap<String, CacheEntry<V>>>;

/// In-process [`Cache`] guarded by a single async mutex.
///
/// Expiry is lazy: a lapsed entry is dropped when it is looked up. A
/// background sweep can additionally be enabled with
/// [`with_sweep_interval`](Self::with_sweep_interval) to bound memory held by
/// keys that are never read again.
pub struct MemoryCache<V> {
    entries: Arc<Entries<V>>,
    default_ttl: Option<Duration>,
    sweeper: Option<JoinHandle<()>>,
}

impl<V> std::fmt::Debug for MemoryCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("default_ttl", &self.default_ttl)
            .field("sweeping", &self.sweeper.is_some())
            .finish_non_exhaustive()
    }
}

impl<V> Default for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache whose [`Expiration::Default`] lifetime is 7200 seconds.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            default_ttl: Some(DEFAULT_CACHE_TTL),
            sweeper: None,
        }
    }

    /// Override the lifetime used for [`Expiration::Default`]; `None` keeps
    /// such entries forever.
    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Purge expired entries every `interval` on a background task.
    ///
    /// Only takes effect when called from within a tokio runtime. The task
    /// stops when the cache is dropped.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            return self;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            log::debug!("no tokio runtime available, cache sweep disabled");
            return self;
        };

        if let Some(previous) = self.sweeper.take() {
            previous.abort();
        }

        let entries = Arc::downgrade(&self.entries);
        self.sweeper = Some(handle.spawn(sweep(entries, interval)));
        self
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every expired entry; returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        purge(&self.entries).await
    }
}

async fn purge<V>(entries: &Entries<V>) -> usize {
    let now = Instant::now();
    let mut entries = entries.lock().await;
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired(now));
    before - entries.len()
}

async fn sweep<V>(entries: Weak<Entries<V>>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(entries) = entries.upgrade() else {
            break;
        };
        let removed = purge(&entries).await;
        if removed > 0 {
            log::trace!("cache sweep removed {} expired entries", removed);
        }
    }
}

impl<V> Drop for MemoryCache<V> {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

#[async_trait]
impl<V> Cache<V> for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, ctx: &RequestContext, key: &str) -> Result<V, CacheError> {
        ctx.run(async {
            let now = Instant::now();
            let mut entries = self.entries.lock().await;
            if let Some(entry) = entries.get(key) {
                if !entry.is_expired(now) {
                    return Ok(entry.value.clone());
                }
                entries.remove(key);
            }
            Err(CacheError::KeyNotFound)
        })
        .await
    }

    async fn set(
        &self,
        ctx: &RequestContext,
        key: &str,
        value: V,
        ttl: Expiration,
    ) -> Result<(), CacheError> {
        ctx.run(async {
            let entry = CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl: ttl.resolve(self.default_ttl),
            };
            self.entries.lock().await.insert(key.to_string(), entry);
            Ok(())
        })
        .await
    }

    async fn delete(&self, ctx: &RequestContext, key: &str) -> Result<(), CacheError> {
        ctx.run(async {
            self.entries.lock().await.remove(key);
            Ok(())
        })
        .await
    }
}
