//! Token endpoint and userinfo wire types

use std::time::Duration;

use serde::Deserialize;

/// RFC 8693 grant type for token exchange
pub const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";

/// RFC 8693 token type identifier for OAuth 2.0 access tokens
pub const TOKEN_TYPE_ACCESS_TOKEN: &str = "urn:ietf:params:oauth:token-type:access_token";

/// RFC 6749 client credentials grant type
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

/// An access token obtained from the issuer
///
/// Lives only for the duration of one check unless a cache is configured.
/// `Debug` output never contains the token value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    expires_in: Option<Duration>,
}

// Manual Debug impl to prevent token exposure in logs
impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl AccessToken {
    /// Create a token with an optional lifetime
    pub fn new(secret: impl Into<String>, expires_in: Option<Duration>) -> Self {
        Self {
            secret: secret.into(),
            expires_in,
        }
    }

    /// The raw token string
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Lifetime reported by the issuer, if any
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }

    /// `Authorization` header value for this token
    pub fn bearer_header_value(&self) -> String {
        format!("Bearer {}", self.secret)
    }
}

/// Token endpoint success response (RFC 6749 Section 5.1)
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl From<TokenResponse> for AccessToken {
    fn from(response: TokenResponse) -> Self {
        Self::new(
            response.access_token,
            response.expires_in.map(Duration::from_secs),
        )
    }
}

/// OIDC userinfo response; only the subject claim is consumed
#[derive(Deserialize)]
pub(crate) struct UserInfoResponse {
    pub sub: String,
}
