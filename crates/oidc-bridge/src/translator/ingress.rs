//! Ingress: internal subject to delegated bearer token
//!
//! Two sequential calls per check: a client credentials grant for the
//! bridge's own service account, then an RFC 8693 exchange of that token for
//! one issued on behalf of the subject. The service-account token never
//! leaves this module.

use std::sync::Arc;

use async_trait::async_trait;
use oidc_bridge_idp::{IdentityProvider, IdpResult};
use tracing::debug;

use super::{AUTHORIZATION_HEADER, Translation, Translator};
use crate::check::{CheckRequest, Direction};
use crate::error::{BridgeError, BridgeResult};

/// Outcome of ingress translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressResult {
    /// Headers to add to the forwarded request; exactly `authorization`
    pub headers_to_add: Vec<(String, String)>,
}

/// Attaches a delegated bearer token for an already-trusted subject
#[derive(Clone)]
pub struct IngressTranslator {
    provider: Arc<dyn IdentityProvider>,
    identity_header: String,
}

impl std::fmt::Debug for IngressTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngressTranslator")
            .field("identity_header", &self.identity_header)
            .finish_non_exhaustive()
    }
}

impl IngressTranslator {
    /// Create an ingress translator reading the subject from `identity_header`
    pub fn new(provider: Arc<dyn IdentityProvider>, identity_header: impl Into<String>) -> Self {
        Self {
            provider,
            identity_header: identity_header.into().to_ascii_lowercase(),
        }
    }

    /// Header the subject is read from
    pub fn identity_header(&self) -> &str {
        &self.identity_header
    }

    /// Obtain a bearer token issued on behalf of `subject`
    ///
    /// No retry and no fallback.
    ///
    /// # Errors
    ///
    /// The first failing identity provider call, unchanged. A failed
    /// service-account fetch means the exchange is never attempted.
    pub async fn ingress(&self, subject: &str) -> IdpResult<IngressResult> {
        let service_account = self.provider.obtain_service_account_token().await?;
        let delegated = self
            .provider
            .exchange_for_user(&service_account, subject)
            .await?;

        debug!("Attached delegated token for ingress request");
        Ok(IngressResult {
            headers_to_add: vec![(
                AUTHORIZATION_HEADER.to_string(),
                delegated.bearer_header_value(),
            )],
        })
    }
}

#[async_trait]
impl Translator for IngressTranslator {
    fn direction(&self) -> Direction {
        Direction::Ingress
    }

    async fn translate(&self, request: &CheckRequest) -> BridgeResult<Translation> {
        let subject = request
            .header(&self.identity_header)
            .filter(|subject| !subject.is_empty())
            .ok_or_else(|| BridgeError::missing_identity(&self.identity_header))?;

        let result = self.ingress(subject).await?;
        Ok(Translation::Ingress(result))
    }
}
