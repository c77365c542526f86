//! Access token management for WeChat API
//!
//! Handles token caching, refresh and concurrency safety. Tokens live in the
//! client's [`Cache`](crate::cache::Cache) under
//! `"wechat-sdk.token." + fingerprint`, so every manager built for the same
//! remote credential shares one slot.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::Expiration;
use crate::client::WechatClient;
use crate::context::RequestContext;
use crate::credential::{Credential, CredentialSource};
use crate::error::{CacheError, WechatError};

/// Prefix of every token cache key.
pub const CACHE_KEY_PREFIX: &str = "wechat-sdk.token.";

/// Manages access_token lifecycle for one credential source
#[derive(Clone)]
pub struct TokenManager {
    client: WechatClient,
    source: Arc<dyn CredentialSource>,
    cache_key: String,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("cache_key", &self.cache_key)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(client: WechatClient, source: Arc<dyn CredentialSource>) -> Self {
        let cache_key = format!("{}{}", CACHE_KEY_PREFIX, source.fingerprint());
        Self {
            client,
            source,
            cache_key,
        }
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    pub fn source(&self) -> &Arc<dyn CredentialSource> {
        &self.source
    }

    /// Return a usable access token.
    ///
    /// Unless `force_refresh` is set, a cached token is returned without any
    /// network I/O. Concurrent misses for the same cache key wait for a
    /// single in-flight fetch.
    pub async fn get_token(
        &self,
        ctx: &RequestContext,
        force_refresh: bool,
    ) -> Result<String, WechatError> {
        if !force_refresh {
            if let Some(token) = self.cached(ctx).await? {
                return Ok(token);
            }
        }

        let guard = self.client.refresh_guard(&self.cache_key);
        let _lock = ctx
            .run(async { Ok::<_, WechatError>(guard.lock_owned().await) })
            .await?;

        if !force_refresh {
            // another caller may have refreshed while we waited
            if let Some(token) = self.cached(ctx).await? {
                return Ok(token);
            }
        }

        let credential = self
            .source
            .fetch_credential(ctx, &self.client)
            .await
            .map_err(|e| {
                log::error!(
                    "[Wechat] fetching access token for {} failed: {}",
                    self.cache_key,
                    e
                );
                WechatError::Credential {
                    name: self.source.name(),
                    source: Box::new(e),
                }
            })?;

        self.set_token(ctx, &credential).await?;
        Ok(credential.access_token)
    }

    /// Fetch a new token even if a cached one exists.
    pub async fn refresh_token(&self, ctx: &RequestContext) -> Result<String, WechatError> {
        self.get_token(ctx, true).await
    }

    /// Store `credential` with a lifetime of `expires_in` minus the client's
    /// safety margin.
    ///
    /// A credential that would expire within the margin is not stored.
    pub async fn set_token(
        &self,
        ctx: &RequestContext,
        credential: &Credential,
    ) -> Result<(), WechatError> {
        let margin = self.client.config().token_safety_margin.as_secs();
        let lifetime = credential.expires_in.saturating_sub_unsigned(margin);
        if lifetime <= 0 {
            log::warn!(
                "[Wechat] access token for {} expires in {}s, within the {}s safety margin; not caching",
                self.cache_key,
                credential.expires_in,
                margin
            );
            return Ok(());
        }

        let ttl = Duration::from_secs(lifetime.unsigned_abs());
        self.client
            .cache()
            .set(
                ctx,
                &self.cache_key,
                credential.access_token.clone(),
                Expiration::After(ttl),
            )
            .await?;
        Ok(())
    }

    /// Drop the cached token, e.g. after the API reported it invalid.
    pub async fn invalidate(&self, ctx: &RequestContext) -> Result<(), WechatError> {
        self.client.cache().delete(ctx, &self.cache_key).await?;
        Ok(())
    }

    async fn cached(&self, ctx: &RequestContext) -> Result<Option<String>, WechatError> {
        match self.client.cache().get(ctx, &self.cache_key).await {
            Ok(token) => Ok(Some(token)),
            Err(CacheError::KeyNotFound) => {
                log::trace!("[Wechat] access token cache miss for {}", self.cache_key);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
