//! Identity provider trait
//!
//! The seam between the translators and the issuer. [`OidcClient`](crate::OidcClient)
//! is the production implementation; [`CachingProvider`](crate::CachingProvider)
//! decorates any implementation with token caching. Tests substitute fakes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::IdpResult;
use crate::token::AccessToken;

/// Operations the translators need from the identity provider
///
/// Implementations must be safe to call concurrently; each call is an
/// independent unit of work.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the subject claim for an external access token
    ///
    /// # Errors
    ///
    /// - `Network` if the userinfo call fails or returns a non-success status
    /// - `TokenInvalid` if the response has no usable `sub` claim
    async fn resolve_subject(&self, access_token: &str) -> IdpResult<String>;

    /// Obtain a token for the bridge's own client identity
    ///
    /// # Errors
    ///
    /// - `Network` on transport failure or non-success status
    /// - `TokenInvalid` if the response carries no access token
    async fn obtain_service_account_token(&self) -> IdpResult<AccessToken>;

    /// Exchange the service-account token for a token on behalf of `subject`
    ///
    /// # Errors
    ///
    /// - `Network` on transport failure or non-success status
    /// - `TokenInvalid` if the response carries no access token
    async fn exchange_for_user(
        &self,
        service_account_token: &AccessToken,
        subject: &str,
    ) -> IdpResult<AccessToken>;
}

#[async_trait]
impl<P> IdentityProvider for Arc<P>
where
    P: IdentityProvider + ?Sized,
{
    async fn resolve_subject(&self, access_token: &str) -> IdpResult<String> {
        (**self).resolve_subject(access_token).await
    }

    async fn obtain_service_account_token(&self) -> IdpResult<AccessToken> {
        (**self).obtain_service_account_token().await
    }

    async fn exchange_for_user(
        &self,
        service_account_token: &AccessToken,
        subject: &str,
    ) -> IdpResult<AccessToken> {
        (**self)
            .exchange_for_user(service_account_token, subject)
            .await
    }
}
