//! Authorization gateway
//!
//! Maps a translation outcome onto a [`CheckResponse`]:
//!
//! | Outcome                  | Response                                          |
//! |--------------------------|---------------------------------------------------|
//! | egress, skipped          | allow, no mutation                                |
//! | egress, resolved         | allow, add identity header, remove authorization |
//! | ingress, success         | allow, add authorization                          |
//! | any failure or deadline  | deny (403)                                        |
//!
//! Internal errors never reach the caller. Failures are logged with request
//! id, host, path, method, direction and error kind only.
//!
//! A skipped egress check leaves every header untouched, including a
//! client-supplied identity header. Stripping that header from untrusted
//! traffic is up to the proxy in front of the egress listener.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::check::{CheckRequest, CheckResponse, Direction};
use crate::error::{BridgeError, BridgeResult};
use crate::translator::{DEFAULT_IDENTITY_HEADER, Translation, Translator};

/// Gateway settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Internal identity header attached on egress (lower-cased)
    pub identity_header: String,
    /// Deadline for one check; `None` leaves it to the HTTP client timeout
    pub check_timeout: Option<Duration>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            identity_header: DEFAULT_IDENTITY_HEADER.to_string(),
            check_timeout: None,
        }
    }
}

/// Per-listener authorization gateway
///
/// Stateless across checks; share one instance behind an `Arc`.
#[derive(Clone)]
pub struct Gateway {
    translator: Arc<dyn Translator>,
    config: GatewayConfig,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("direction", &self.translator.direction())
            .field("config", &self.config)
            .finish()
    }
}

impl Gateway {
    /// Create a gateway serving the translator's direction
    pub fn new(translator: Arc<dyn Translator>, mut config: GatewayConfig) -> Self {
        config.identity_header.make_ascii_lowercase();
        Self { translator, config }
    }

    /// Direction of this gateway's listener
    pub fn direction(&self) -> Direction {
        self.translator.direction()
    }

    /// Gateway settings
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run one check
    ///
    /// Never fails: every error becomes a deny.
    pub async fn check(&self, request: &CheckRequest) -> CheckResponse {
        match self.translate(request).await {
            Ok(translation) => self.allow(translation),
            Err(err) => {
                warn!(
                    request_id = %request.request_id,
                    host = %request.host,
                    path = %request.path,
                    method = %request.method,
                    direction = %self.direction(),
                    error_kind = err.kind(),
                    "Check denied"
                );
                CheckResponse::deny()
            }
        }
    }

    /// Translate, honouring the check deadline
    ///
    /// On expiry the translation future is dropped, which abandons any
    /// in-flight outbound call.
    async fn translate(&self, request: &CheckRequest) -> BridgeResult<Translation> {
        match self.config.check_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.translator.translate(request))
                .await
                .map_err(|_| BridgeError::Timeout { timeout })?,
            None => self.translator.translate(request).await,
        }
    }

    fn allow(&self, translation: Translation) -> CheckResponse {
        match translation {
            Translation::Egress(result) => match result.subject() {
                Some(subject) if !result.is_skip() => {
                    debug!("Egress check allowed with resolved subject");
                    CheckResponse::allow(
                        vec![(self.config.identity_header.clone(), subject.to_string())],
                        result.headers_to_remove().to_vec(),
                        Some(subject.to_string()),
                    )
                }
                _ => CheckResponse::pass_through(),
            },
            Translation::Ingress(result) => {
                debug!("Ingress check allowed");
                CheckResponse::allow(result.headers_to_add, Vec::new(), None)
            }
        }
    }
}
