//! Common test utilities for bridge integration tests
//!
//! - [`FakeProvider`]: in-memory identity provider with call counters
//! - [`MockIssuer`]: wiremock issuer for end-to-end checks through `OidcClient`
//! - [`capture_logs`]: thread-local subscriber recording formatted output

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use oidc_bridge_idp::{
    AccessToken, ClientCredentials, DiscoveryConfig, IdentityProvider, IdpError, IdpResult,
    OidcClient,
};
use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{bearer_token, body_string_contains, method, path},
};

pub const CLIENT_ID: &str = "bridge-client";
pub const CLIENT_SECRET: &str = "bridge-secret";
pub const IDENTITY_HEADER: &str = "x-bridge-identity";

/// In-memory identity provider
#[derive(Default)]
pub struct FakeProvider {
    /// token → subject
    pub subjects: HashMap<String, String>,
    /// subject → exchanged token
    pub exchanged: HashMap<String, String>,
    pub fail_service_account: bool,
    /// Delay applied to every call
    pub latency: Option<Duration>,
    pub resolve_calls: AtomicUsize,
    pub service_account_calls: AtomicUsize,
    pub exchange_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn with_subject(mut self, token: &str, subject: &str) -> Self {
        self.subjects.insert(token.to_string(), subject.to_string());
        self
    }

    pub fn with_exchange(mut self, subject: &str, token: &str) -> Self {
        self.exchanged.insert(subject.to_string(), token.to_string());
        self
    }

    pub fn failing_service_account(mut self) -> Self {
        self.fail_service_account = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn resolve_subject(&self, access_token: &str) -> IdpResult<String> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        self.subjects
            .get(access_token)
            .cloned()
            .ok_or_else(|| IdpError::status("userinfo", 401))
    }

    async fn obtain_service_account_token(&self) -> IdpResult<AccessToken> {
        self.service_account_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        if self.fail_service_account {
            return Err(IdpError::network("client_credentials", "connection refused"));
        }
        Ok(AccessToken::new("sa-token", Some(Duration::from_secs(300))))
    }

    async fn exchange_for_user(
        &self,
        service_account_token: &AccessToken,
        subject: &str,
    ) -> IdpResult<AccessToken> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        if service_account_token.secret() != "sa-token" {
            return Err(IdpError::status("token_exchange", 401));
        }
        self.exchanged
            .get(subject)
            .map(|token| AccessToken::new(token.clone(), None))
            .ok_or_else(|| IdpError::status("token_exchange", 403))
    }
}

/// Mock OIDC issuer
pub struct MockIssuer {
    pub server: MockServer,
}

impl MockIssuer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Client pointed at this issuer
    pub fn client(&self) -> OidcClient {
        self.client_with_timeout(Duration::from_secs(10))
    }

    pub fn client_with_timeout(&self, timeout: Duration) -> OidcClient {
        let base = self.server.uri();
        OidcClient::from_discovery(
            DiscoveryConfig::new(
                &format!("{base}/oauth/v2/token"),
                &format!("{base}/oidc/v1/userinfo"),
            )
            .unwrap(),
            ClientCredentials::new(CLIENT_ID, CLIENT_SECRET).unwrap(),
            reqwest::Client::builder()
                .timeout(timeout)
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap(),
        )
    }

    pub async fn mock_userinfo(&self, token: &str, subject: &str) {
        Mock::given(method("GET"))
            .and(path("/oidc/v1/userinfo"))
            .and(bearer_token(token))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sub": subject })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_userinfo_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/oidc/v1/userinfo"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_userinfo_delay(&self, subject: &str, delay: Duration) {
        Mock::given(method("GET"))
            .and(path("/oidc/v1/userinfo"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "sub": subject }))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_client_credentials(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": token,
                "token_type": "Bearer",
                "expires_in": 3600,
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_client_credentials_status(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Mock an exchange for `subject`; `expected_calls` is verified on drop
    pub async fn mock_exchange(&self, subject: &str, token: &str, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .and(body_string_contains("token-exchange"))
            .and(body_string_contains(format!("requested_subject={subject}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": token,
                "issued_token_type": "urn:ietf:params:oauth:token-type:access_token",
                "token_type": "Bearer",
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Requests received on the token endpoint whose body contains `needle`
    pub async fn token_requests_containing(&self, needle: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == "/oauth/v2/token")
            .filter(|r| String::from_utf8_lossy(&r.body).contains(needle))
            .count()
    }
}

/// Shared buffer receiving formatted log output
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Record every event on the current thread until the guard drops
///
/// Only sees events from the test's own thread: use with the default
/// current-thread `#[tokio::test]` runtime.
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}
