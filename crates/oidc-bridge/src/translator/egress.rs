//! Egress: external bearer token to internal subject

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use oidc_bridge_idp::{IdentityProvider, IdpResult};
use tracing::debug;

use super::{AUTHORIZATION_HEADER, BEARER_PREFIX, Translation, Translator};
use crate::check::{CheckRequest, Direction};
use crate::error::BridgeResult;

/// Outcome of egress translation
///
/// Either skipped (no subject, nothing to remove) or resolved (non-empty
/// subject, `authorization` to remove). No other shape can be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgressResult {
    subject: Option<String>,
    skip: bool,
    headers_to_remove: Vec<String>,
}

impl EgressResult {
    /// Not a bearer request; pass through unmodified
    pub fn skipped() -> Self {
        Self {
            subject: None,
            skip: true,
            headers_to_remove: Vec::new(),
        }
    }

    /// Bearer token resolved to `subject`
    pub fn resolved(subject: String) -> Self {
        Self {
            subject: Some(subject),
            skip: false,
            headers_to_remove: vec![AUTHORIZATION_HEADER.to_string()],
        }
    }

    /// Whether the request should pass through unmodified
    pub fn is_skip(&self) -> bool {
        self.skip
    }

    /// Resolved subject, `None` when skipped
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Header names the proxy must strip
    pub fn headers_to_remove(&self) -> &[String] {
        &self.headers_to_remove
    }
}

/// Resolves bearer tokens to subjects via the userinfo endpoint
#[derive(Clone)]
pub struct EgressTranslator {
    provider: Arc<dyn IdentityProvider>,
}

impl std::fmt::Debug for EgressTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EgressTranslator").finish_non_exhaustive()
    }
}

impl EgressTranslator {
    /// Create an egress translator over `provider`
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Translate an inbound header map
    ///
    /// The `authorization` header is matched case-insensitively by name. A
    /// missing header, or one using another scheme, is a skip and not an error.
    ///
    /// # Errors
    ///
    /// Any subject resolution failure, unchanged. No partial result is
    /// returned alongside an error.
    pub async fn egress(&self, headers: &BTreeMap<String, String>) -> IdpResult<EgressResult> {
        let authorization = headers.get(AUTHORIZATION_HEADER).or_else(|| {
            headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION_HEADER))
                .map(|(_, value)| value)
        });
        let Some(authorization) = authorization else {
            debug!("No authorization header, skipping");
            return Ok(EgressResult::skipped());
        };

        let Some(token) = authorization.strip_prefix(BEARER_PREFIX) else {
            debug!("Authorization header is not a bearer token, skipping");
            return Ok(EgressResult::skipped());
        };

        let subject = self.provider.resolve_subject(token).await?;
        Ok(EgressResult::resolved(subject))
    }
}

#[async_trait]
impl Translator for EgressTranslator {
    fn direction(&self) -> Direction {
        Direction::Egress
    }

    async fn translate(&self, request: &CheckRequest) -> BridgeResult<Translation> {
        let result = self.egress(request.headers()).await?;
        Ok(Translation::Egress(result))
    }
}
