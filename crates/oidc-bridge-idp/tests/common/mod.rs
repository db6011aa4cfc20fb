//! Common test utilities for integration tests
//!
//! Provides a wiremock-backed issuer exposing discovery, userinfo and token
//! endpoints.

#![allow(dead_code)]

use oidc_bridge_idp::{ClientCredentials, DiscoveryConfig, OidcClient};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{basic_auth, bearer_token, body_string_contains, method, path},
};

pub const CLIENT_ID: &str = "bridge-client";
pub const CLIENT_SECRET: &str = "bridge-secret";

/// Form-encoded token exchange grant type as it appears in a request body
pub const ENCODED_EXCHANGE_GRANT: &str =
    "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Atoken-exchange";

/// Form-encoded access token type as it appears in a request body
pub const ENCODED_ACCESS_TOKEN_TYPE: &str = "urn%3Aietf%3Aparams%3Aoauth%3Atoken-type%3Aaccess_token";

/// Mock OIDC issuer
pub struct MockIssuer {
    pub server: MockServer,
}

impl MockIssuer {
    /// Start a new mock issuer
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn issuer(&self) -> String {
        self.server.uri()
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth/v2/token", self.server.uri())
    }

    pub fn userinfo_endpoint(&self) -> String {
        format!("{}/oidc/v1/userinfo", self.server.uri())
    }

    /// Client pointed at this issuer without going through discovery
    pub fn client(&self) -> OidcClient {
        OidcClient::from_discovery(
            DiscoveryConfig::new(&self.token_endpoint(), &self.userinfo_endpoint()).unwrap(),
            ClientCredentials::new(CLIENT_ID, CLIENT_SECRET).unwrap(),
            reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap(),
        )
    }

    /// Mock a valid discovery document
    pub async fn mock_discovery(&self) {
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": self.issuer(),
                "token_endpoint": self.token_endpoint(),
                "userinfo_endpoint": self.userinfo_endpoint(),
                "jwks_uri": format!("{}/oauth/v2/keys", self.issuer()),
                "grant_types_supported": [
                    "client_credentials",
                    "urn:ietf:params:oauth:grant-type:token-exchange"
                ],
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock a userinfo response mapping `token` to `subject`
    pub async fn mock_userinfo(&self, token: &str, subject: &str) {
        Mock::given(method("GET"))
            .and(path("/oidc/v1/userinfo"))
            .and(bearer_token(token))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": subject,
                "email": format!("{subject}@example.com"),
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock a userinfo failure for any token
    pub async fn mock_userinfo_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/oidc/v1/userinfo"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": "invalid_token",
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock the client credentials grant, expecting `expected_calls` requests
    pub async fn mock_client_credentials(
        &self,
        access_token: &str,
        expires_in: Option<u64>,
        expected_calls: u64,
    ) {
        let mut body = json!({
            "access_token": access_token,
            "token_type": "Bearer",
        });
        if let Some(expires_in) = expires_in {
            body["expires_in"] = json!(expires_in);
        }

        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .and(basic_auth(CLIENT_ID, CLIENT_SECRET))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Mock the client credentials grant failing with `status`
    pub async fn mock_client_credentials_status(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": "invalid_client",
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock a token exchange for `subject`, expecting `expected_calls` requests
    pub async fn mock_exchange(
        &self,
        subject: &str,
        access_token: &str,
        expires_in: Option<u64>,
        expected_calls: u64,
    ) {
        let mut body = json!({
            "access_token": access_token,
            "issued_token_type": "urn:ietf:params:oauth:token-type:access_token",
            "token_type": "Bearer",
        });
        if let Some(expires_in) = expires_in {
            body["expires_in"] = json!(expires_in);
        }

        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .and(basic_auth(CLIENT_ID, CLIENT_SECRET))
            .and(body_string_contains(ENCODED_EXCHANGE_GRANT))
            .and(body_string_contains(format!("requested_subject={subject}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Number of requests received on the token endpoint
    pub async fn token_requests(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == "/oauth/v2/token")
            .count()
    }
}
