//! Identity provider configuration
//!
//! All values are loaded once at startup and never mutated. The client owns
//! its configuration; nothing here is global.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::discovery::FetcherConfig;
use crate::error::{IdpError, IdpResult};

/// Default timeout for userinfo and token endpoint calls
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Client identifier and secret used to authenticate against the token endpoint
///
/// The secret is held in a [`SecretString`] and is redacted from `Debug`.
#[derive(Clone)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: SecretString,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl ClientCredentials {
    /// Create credentials, rejecting empty values
    ///
    /// # Errors
    ///
    /// Returns [`IdpError::Configuration`] if the client id or secret is empty.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> IdpResult<Self> {
        let client_id = client_id.into();
        let client_secret = SecretString::from(client_secret.into());

        if client_id.trim().is_empty() {
            return Err(IdpError::configuration("client id must not be empty"));
        }
        if client_secret.expose_secret().trim().is_empty() {
            return Err(IdpError::configuration("client secret must not be empty"));
        }

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    /// The client identifier
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

/// Configuration for [`OidcClient::initialize`](crate::OidcClient::initialize)
#[derive(Debug, Clone)]
pub struct IdpConfig {
    /// Issuer base URL (discovery document lives below it)
    pub issuer: String,
    /// Full discovery document URL, replacing the well-known path below the issuer
    pub discovery_url: Option<String>,
    /// Client credentials for the token endpoint
    pub credentials: ClientCredentials,
    /// Timeout applied to every userinfo / token endpoint call
    pub http_timeout: Duration,
    /// Discovery fetch settings
    pub discovery: FetcherConfig,
}

impl IdpConfig {
    /// Build a configuration from raw values with default timeouts
    ///
    /// # Errors
    ///
    /// Returns [`IdpError::Configuration`] if any value is empty.
    pub fn new(
        issuer: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> IdpResult<Self> {
        let issuer = issuer.into();
        if issuer.trim().is_empty() {
            return Err(IdpError::configuration("issuer must not be empty"));
        }

        Ok(Self {
            issuer,
            discovery_url: None,
            credentials: ClientCredentials::new(client_id, client_secret)?,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            discovery: FetcherConfig::default(),
        })
    }

    /// Override the outbound call timeout
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Fetch the discovery document from this URL instead of the well-known path
    #[must_use]
    pub fn with_discovery_url(mut self, discovery_url: impl Into<String>) -> Self {
        self.discovery_url = Some(discovery_url.into());
        self
    }

    /// Override discovery settings
    #[must_use]
    pub fn with_discovery(mut self, discovery: FetcherConfig) -> Self {
        self.discovery = discovery;
        self
    }
}
