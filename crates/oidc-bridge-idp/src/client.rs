//! OIDC identity provider client
//!
//! Wraps a single configured issuer and implements the three outbound calls:
//! - userinfo lookup (`GET`, bearer auth) to resolve a subject
//! - client credentials grant for the bridge's service account
//! - RFC 8693 token exchange on behalf of a subject
//!
//! Token endpoint requests are form-encoded and authenticated with HTTP Basic
//! (`client_secret_basic`). Nothing is retried; a failed call fails the check.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::{ClientCredentials, IdpConfig};
use crate::discovery::{DiscoveryConfig, DiscoveryFetcher};
use crate::error::{IdpError, IdpResult, from_reqwest};
use crate::provider::IdentityProvider;
use crate::token::{
    AccessToken, GRANT_TYPE_CLIENT_CREDENTIALS, GRANT_TYPE_TOKEN_EXCHANGE,
    TOKEN_TYPE_ACCESS_TOKEN, TokenResponse, UserInfoResponse,
};

const OP_USERINFO: &str = "userinfo";
const OP_CLIENT_CREDENTIALS: &str = "client_credentials";
const OP_TOKEN_EXCHANGE: &str = "token_exchange";

/// Largest userinfo or token endpoint body accepted
pub const MAX_RESPONSE_SIZE: usize = 64 * 1024;

/// Identity provider client for one issuer
///
/// Discovery metadata and credentials are immutable after construction, so
/// the client can be shared across concurrent checks without locking.
#[derive(Clone)]
pub struct OidcClient {
    discovery: DiscoveryConfig,
    credentials: ClientCredentials,
    http: reqwest::Client,
}

impl std::fmt::Debug for OidcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcClient")
            .field("discovery", &self.discovery)
            .field("credentials", &self.credentials)
            .field("http", &"<reqwest::Client>")
            .finish()
    }
}

impl OidcClient {
    /// Perform discovery against the issuer and build the client
    ///
    /// The document is fetched from [`IdpConfig::discovery_url`] when set, else
    /// from the well-known path below the issuer.
    ///
    /// Called once at startup. There is no degraded mode: any failure here
    /// should stop the process.
    ///
    /// # Errors
    ///
    /// - [`IdpError::Configuration`] if the issuer URL is malformed or the HTTP
    ///   client cannot be built
    /// - [`IdpError::Discovery`] if the issuer is unreachable or its metadata is malformed
    pub async fn initialize(config: IdpConfig) -> IdpResult<Self> {
        let fetcher = DiscoveryFetcher::with_config(config.discovery.clone())?;
        let discovery = match config.discovery_url.as_deref() {
            Some(url) => fetcher.fetch_url(DiscoveryFetcher::explicit_url(url)?).await?,
            None => fetcher.fetch(&config.issuer).await?,
        };

        info!(
            "Discovered issuer endpoints (token: {}, userinfo: {})",
            discovery.token_endpoint, discovery.userinfo_endpoint
        );

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| IdpError::configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self::from_discovery(discovery, config.credentials, http))
    }

    /// Build a client from already-known endpoints
    ///
    /// The HTTP client should be configured with `redirect::Policy::none()`.
    pub fn from_discovery(
        discovery: DiscoveryConfig,
        credentials: ClientCredentials,
        http: reqwest::Client,
    ) -> Self {
        Self {
            discovery,
            credentials,
            http,
        }
    }

    /// The issuer endpoints in use
    pub fn discovery(&self) -> &DiscoveryConfig {
        &self.discovery
    }

    /// The client identifier in use
    pub fn client_id(&self) -> &str {
        self.credentials.client_id()
    }

    /// POST a grant request to the token endpoint
    async fn token_request(
        &self,
        operation: &'static str,
        form: &[(&str, &str)],
    ) -> IdpResult<AccessToken> {
        let response = self
            .http
            .post(self.discovery.token_endpoint.clone())
            .basic_auth(
                self.credentials.client_id(),
                Some(self.credentials.client_secret()),
            )
            .form(form)
            .send()
            .await
            .map_err(|e| from_reqwest(operation, e))?;

        let token: TokenResponse = read_json(operation, response).await?;
        if token.access_token.is_empty() {
            return Err(IdpError::token_invalid(operation, "empty access_token"));
        }

        Ok(token.into())
    }
}

/// Check the status and decode a JSON body
///
/// Error bodies are dropped unread: they may reflect submitted tokens.
async fn read_json<T: DeserializeOwned>(
    operation: &'static str,
    response: reqwest::Response,
) -> IdpResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(IdpError::status(operation, status.as_u16()));
    }

    if let Some(content_length) = response.content_length()
        && content_length > MAX_RESPONSE_SIZE as u64
    {
        return Err(IdpError::token_invalid(operation, "response size limit exceeded"));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| from_reqwest(operation, e))?;

    if body.len() > MAX_RESPONSE_SIZE {
        return Err(IdpError::token_invalid(operation, "response size limit exceeded"));
    }

    serde_json::from_slice(&body)
        .map_err(|e| IdpError::token_invalid(operation, format!("malformed response: {e}")))
}

#[async_trait]
impl IdentityProvider for OidcClient {
    async fn resolve_subject(&self, access_token: &str) -> IdpResult<String> {
        let response = self
            .http
            .get(self.discovery.userinfo_endpoint.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| from_reqwest(OP_USERINFO, e))?;

        let user_info: UserInfoResponse = read_json(OP_USERINFO, response).await?;
        if user_info.sub.is_empty() {
            return Err(IdpError::token_invalid(OP_USERINFO, "empty sub claim"));
        }

        debug!("Resolved subject from userinfo endpoint");
        Ok(user_info.sub)
    }

    async fn obtain_service_account_token(&self) -> IdpResult<AccessToken> {
        let token = self
            .token_request(
                OP_CLIENT_CREDENTIALS,
                &[("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS)],
            )
            .await?;

        debug!(
            "Obtained service account token (expires_in: {:?})",
            token.expires_in()
        );
        Ok(token)
    }

    async fn exchange_for_user(
        &self,
        service_account_token: &AccessToken,
        subject: &str,
    ) -> IdpResult<AccessToken> {
        let token = self
            .token_request(
                OP_TOKEN_EXCHANGE,
                &[
                    ("grant_type", GRANT_TYPE_TOKEN_EXCHANGE),
                    ("subject_token", service_account_token.secret()),
                    ("subject_token_type", TOKEN_TYPE_ACCESS_TOKEN),
                    ("requested_subject", subject),
                    ("requested_token_type", TOKEN_TYPE_ACCESS_TOKEN),
                ],
            )
            .await?;

        debug!("Exchanged service account token for delegated token");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OidcClient {
        OidcClient::from_discovery(
            DiscoveryConfig::new(
                "https://idp.example.com/oauth/v2/token",
                "https://idp.example.com/oidc/v1/userinfo",
            )
            .unwrap(),
            ClientCredentials::new("bridge", "s3cr3t").unwrap(),
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_client_accessors() {
        let client = client();
        assert_eq!(client.client_id(), "bridge");
        assert_eq!(
            client.discovery().token_endpoint.as_str(),
            "https://idp.example.com/oauth/v2/token"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", client());
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("[REDACTED]"));
    }
}
