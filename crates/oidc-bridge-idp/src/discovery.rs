//! # OpenID Connect Discovery
//!
//! One-shot fetch of the issuer's `/.well-known/openid-configuration`
//! document at startup, or of an explicitly configured document URL. Only the two endpoints the bridge needs are kept:
//! the token endpoint and the userinfo endpoint.
//!
//! ## Fetch behaviour
//!
//! - **No Redirects**: redirect following disabled
//! - **Size Limits**: response size capped (64 KiB by default)
//! - **Timeouts**: 5-second request timeout (configurable)
//! - **No Caching**: the document is owned by the client for the process lifetime

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{IdpError, IdpResult};

/// Well-known path of the OIDC discovery document
pub const OIDC_DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// Issuer endpoints required by the bridge
///
/// Loaded once, read-only afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Token endpoint (client credentials and token exchange grants)
    pub token_endpoint: Url,
    /// Userinfo endpoint (subject resolution)
    pub userinfo_endpoint: Url,
}

impl DiscoveryConfig {
    /// Build a discovery config from endpoint strings
    ///
    /// # Errors
    ///
    /// Returns [`IdpError::Discovery`] if an endpoint is not an absolute http(s) URL.
    pub fn new(token_endpoint: &str, userinfo_endpoint: &str) -> IdpResult<Self> {
        Ok(Self {
            token_endpoint: parse_endpoint("token_endpoint", token_endpoint)?,
            userinfo_endpoint: parse_endpoint("userinfo_endpoint", userinfo_endpoint)?,
        })
    }
}

/// Subset of the OIDC provider metadata document
#[derive(Deserialize)]
struct ProviderMetadata {
    token_endpoint: Option<String>,
    userinfo_endpoint: Option<String>,
}

/// Configuration for the discovery fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Maximum response size in bytes (default: 64 KiB)
    pub max_response_size: usize,

    /// Request timeout (default: 5 seconds)
    pub request_timeout: Duration,

    /// User agent for HTTP requests
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_response_size: 64 * 1024,
            request_timeout: Duration::from_secs(5),
            user_agent: format!("oidc-bridge/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Discovery document fetcher
pub struct DiscoveryFetcher {
    client: reqwest::Client,
    config: FetcherConfig,
}

impl std::fmt::Debug for DiscoveryFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryFetcher")
            .field("client", &"<reqwest::Client>")
            .field("config", &self.config)
            .finish()
    }
}

impl DiscoveryFetcher {
    /// Create a fetcher with default configuration
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails
    pub fn new() -> IdpResult<Self> {
        Self::with_config(FetcherConfig::default())
    }

    /// Create a fetcher with custom configuration
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails
    pub fn with_config(config: FetcherConfig) -> IdpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| IdpError::discovery(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Build the OIDC discovery URL for an issuer
    ///
    /// The issuer path is preserved: `https://idp.example.com/realms/x` becomes
    /// `https://idp.example.com/realms/x/.well-known/openid-configuration`.
    ///
    /// # Errors
    ///
    /// Returns [`IdpError::Configuration`] if the issuer is not an absolute http(s) URL.
    pub fn discovery_url(issuer: &str) -> IdpResult<Url> {
        let issuer_url = Url::parse(issuer)
            .map_err(|e| IdpError::configuration(format!("invalid issuer URL: {e}")))?;

        if !matches!(issuer_url.scheme(), "http" | "https") {
            return Err(IdpError::configuration(
                "issuer URL must use http or https scheme",
            ));
        }

        let mut url = issuer_url;
        let path = format!("{}{}", url.path().trim_end_matches('/'), OIDC_DISCOVERY_PATH);
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    /// Fetch and validate the discovery document for an issuer
    ///
    /// # Errors
    ///
    /// - [`IdpError::Configuration`] if the issuer URL is malformed
    /// - [`IdpError::Discovery`] if the issuer is unreachable, answers with a
    ///   non-success status, or returns malformed metadata
    pub async fn fetch(&self, issuer: &str) -> IdpResult<DiscoveryConfig> {
        self.fetch_url(Self::discovery_url(issuer)?).await
    }

    /// Validate an explicit discovery document URL
    ///
    /// Used when the document does not live at the well-known path below the
    /// issuer. The URL is taken as-is.
    ///
    /// # Errors
    ///
    /// Returns [`IdpError::Configuration`] if the URL is not an absolute http(s) URL.
    pub fn explicit_url(discovery_url: &str) -> IdpResult<Url> {
        let url = Url::parse(discovery_url)
            .map_err(|e| IdpError::configuration(format!("invalid discovery URL: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(IdpError::configuration(
                "discovery URL must use http or https scheme",
            ));
        }
        Ok(url)
    }

    /// Fetch and validate the discovery document at a full URL
    ///
    /// # Errors
    ///
    /// Returns [`IdpError::Discovery`] if the document is unreachable, answered
    /// with a non-success status, or malformed.
    pub async fn fetch_url(&self, discovery_url: Url) -> IdpResult<DiscoveryConfig> {
        debug!("Fetching OIDC discovery document: {}", discovery_url);

        let response = self
            .client
            .get(discovery_url)
            .send()
            .await
            .map_err(|e| IdpError::discovery(format!("request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            return Err(IdpError::discovery(format!(
                "HTTP {} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        if let Some(content_length) = response.content_length()
            && content_length > self.config.max_response_size as u64
        {
            return Err(IdpError::discovery("response size limit exceeded"));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| IdpError::discovery(format!("failed to read response: {}", e.without_url())))?;

        if body.len() > self.config.max_response_size {
            return Err(IdpError::discovery("response size limit exceeded"));
        }

        Self::parse(&body)
    }

    /// Parse a discovery document body
    fn parse(body: &[u8]) -> IdpResult<DiscoveryConfig> {
        let metadata: ProviderMetadata = serde_json::from_slice(body)
            .map_err(|e| IdpError::discovery(format!("failed to parse JSON: {e}")))?;

        let token_endpoint = metadata
            .token_endpoint
            .ok_or_else(|| IdpError::discovery("missing required field: token_endpoint"))?;
        let userinfo_endpoint = metadata
            .userinfo_endpoint
            .ok_or_else(|| IdpError::discovery("missing required field: userinfo_endpoint"))?;

        DiscoveryConfig::new(&token_endpoint, &userinfo_endpoint)
    }
}

fn parse_endpoint(field: &str, value: &str) -> IdpResult<Url> {
    let url = Url::parse(value)
        .map_err(|e| IdpError::discovery(format!("invalid URL for {field}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(IdpError::discovery(format!(
            "{field} must use http or https scheme"
        )));
    }

    Ok(url)
}
