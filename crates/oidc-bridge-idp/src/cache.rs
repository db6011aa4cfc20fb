//! Expiry-aware token caching
//!
//! [`CachingProvider`] decorates any [`IdentityProvider`]:
//! - the service-account token is a single entry behind an async mutex, so
//!   concurrent callers that miss produce exactly one token endpoint call
//! - exchanged tokens are cached per subject in a concurrent map
//! - subject resolution is never cached
//!
//! Entries are refreshed `refresh_margin` before the issuer-reported expiry.
//! Tokens without `expires_in` are not cached. On a miss the wrapped provider
//! is called exactly as it would be without the cache, and its errors are
//! returned unchanged.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::IdpResult;
use crate::provider::IdentityProvider;
use crate::token::AccessToken;

/// Default safety margin before expiry at which a cached token is refreshed
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(10);

/// Upper bound on how long any entry is reused, whatever the issuer reports
pub const MAX_CACHE_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Refresh entries this long before they expire
    pub refresh_margin: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_margin: DEFAULT_REFRESH_MARGIN,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: AccessToken,
    refresh_at: Instant,
}

impl CachedToken {
    /// `None` when the token has no expiry or would already need refreshing
    ///
    /// Lifetimes are clamped to [`MAX_CACHE_LIFETIME`].
    fn new(token: AccessToken, refresh_margin: Duration) -> Option<Self> {
        let usable = token
            .expires_in()?
            .checked_sub(refresh_margin)?
            .min(MAX_CACHE_LIFETIME);
        if usable.is_zero() {
            return None;
        }

        Some(Self {
            refresh_at: Instant::now().checked_add(usable)?,
            token,
        })
    }

    fn is_fresh(&self) -> bool {
        Instant::now() < self.refresh_at
    }
}

/// Identity provider decorator caching service-account and exchanged tokens
pub struct CachingProvider<P> {
    inner: P,
    config: CacheConfig,
    service_account: Mutex<Option<CachedToken>>,
    exchanged: DashMap<String, CachedToken>,
}

impl<P> std::fmt::Debug for CachingProvider<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingProvider")
            .field("config", &self.config)
            .field("exchanged_entries", &self.exchanged.len())
            .finish_non_exhaustive()
    }
}

impl<P: IdentityProvider> CachingProvider<P> {
    /// Wrap a provider with default cache settings
    pub fn new(inner: P) -> Self {
        Self::with_config(inner, CacheConfig::default())
    }

    /// Wrap a provider with custom cache settings
    pub fn with_config(inner: P, config: CacheConfig) -> Self {
        Self {
            inner,
            config,
            service_account: Mutex::new(None),
            exchanged: DashMap::new(),
        }
    }

    /// The wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of subjects with a cached exchanged token (fresh or stale)
    pub fn cached_subjects(&self) -> usize {
        self.exchanged.len()
    }

    /// Drop every cached token
    pub async fn clear(&self) {
        *self.service_account.lock().await = None;
        self.exchanged.clear();
    }
}

#[async_trait]
impl<P: IdentityProvider> IdentityProvider for CachingProvider<P> {
    async fn resolve_subject(&self, access_token: &str) -> IdpResult<String> {
        self.inner.resolve_subject(access_token).await
    }

    async fn obtain_service_account_token(&self) -> IdpResult<AccessToken> {
        // Held across the fetch so that concurrent misses wait for one refresh
        let mut slot = self.service_account.lock().await;

        if let Some(cached) = slot.as_ref()
            && cached.is_fresh()
        {
            debug!("Service account token still valid, reusing cached token");
            return Ok(cached.token.clone());
        }

        *slot = None;
        let token = self.inner.obtain_service_account_token().await?;
        *slot = CachedToken::new(token.clone(), self.config.refresh_margin);

        if slot.is_some() {
            debug!(
                "Cached service account token for {:?}",
                token.expires_in()
            );
        }
        Ok(token)
    }

    async fn exchange_for_user(
        &self,
        service_account_token: &AccessToken,
        subject: &str,
    ) -> IdpResult<AccessToken> {
        let cached = self
            .exchanged
            .get(subject)
            .and_then(|entry| entry.is_fresh().then(|| entry.token.clone()));
        if let Some(token) = cached {
            debug!("Reusing cached exchanged token");
            return Ok(token);
        }

        // Sweep on every miss so subjects that are never seen again do not linger
        self.exchanged.retain(|_, entry| entry.is_fresh());

        let token = self
            .inner
            .exchange_for_user(service_account_token, subject)
            .await?;

        if let Some(entry) = CachedToken::new(token.clone(), self.config.refresh_margin) {
            self.exchanged.insert(subject.to_string(), entry);
        }
        Ok(token)
    }
}
