//! Expiring key/value cache
//!
//! The SDK stores access tokens in a [`Cache`]. [`MemoryCache`] is the
//! default in-process backend; any other store (Redis, a shared map, ...) can
//! be plugged into the client by implementing the trait.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use wechat_sdk::cache::{Cache, Expiration, MemoryCache};
//! use wechat_sdk::RequestContext;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), wechat_sdk::error::CacheError> {
//! let cache = MemoryCache::<String>::new();
//! let ctx = RequestContext::new();
//!
//! cache
//!     .set(&ctx, "key", "value".to_string(), Expiration::After(Duration::from_secs(60)))
//!     .await?;
//! assert_eq!(cache.get(&ctx, "key").await?, "value");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::CacheError;

mod memory;

pub use memory::MemoryCache;

/// Default lifetime of entries stored with [`Expiration::Default`].
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(7200);

/// Default interval between background purges of expired entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(240 * 60);

/// Lifetime of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiration {
    /// Use the backend's default lifetime.
    #[default]
    Default,
    /// Keep the entry until it is overwritten or deleted.
    Never,
    /// Expire after the given duration. A zero duration never expires.
    After(Duration),
}

impl Expiration {
    /// Resolve to a concrete TTL; `None` means no expiry.
    pub fn resolve(self, default_ttl: Option<Duration>) -> Option<Duration> {
        match self {
            Expiration::Default => default_ttl.filter(|ttl| !ttl.is_zero()),
            Expiration::Never => None,
            Expiration::After(ttl) if ttl.is_zero() => None,
            Expiration::After(ttl) => Some(ttl),
        }
    }
}

impl From<Duration> for Expiration {
    fn from(ttl: Duration) -> Self {
        Expiration::After(ttl)
    }
}

/// Thread-safe mapping from string key to value with per-entry expiry.
///
/// Every operation honours the caller's [`RequestContext`]: a cancelled or
/// expired context fails with [`CacheError::Cancelled`] or
/// [`CacheError::Timeout`] instead of blocking.
#[async_trait]
pub trait Cache<V>: Send + Sync {
    /// Fetch a value; [`CacheError::KeyNotFound`] when absent or expired.
    async fn get(&self, ctx: &RequestContext, key: &str) -> Result<V, CacheError>;

    /// Store a value, replacing any previous entry for `key`.
    async fn set(
        &self,
        ctx: &RequestContext,
        key: &str,
        value: V,
        ttl: Expiration,
    ) -> Result<(), CacheError>;

    /// Remove a value. Removing an absent key is not an error.
    async fn delete(&self, ctx: &RequestContext, key: &str) -> Result<(), CacheError>;
}
