//! # oidc-bridge
//!
//! Sidecar authorization filter bridging externally issued OIDC bearer
//! tokens and an internal subject identity.
//!
//! - **Egress**: `Authorization: Bearer <token>` is resolved to a subject via
//!   the issuer's userinfo endpoint. The proxy strips `Authorization` and
//!   attaches the internal identity header.
//! - **Ingress**: the internal subject is turned into a delegated bearer
//!   token via a service-account token and an RFC 8693 exchange.
//!
//! Any failure denies the check (403). Errors are logged with request
//! metadata only; tokens, secrets and subjects never reach the logs.
//!
//! ## Architecture
//!
//! ```text
//! server (axum, ext_authz) → Gateway → Translator → IdentityProvider → issuer
//! ```
//!
//! - [`check`] - Check request/response contract
//! - [`translator`] - [`EgressTranslator`] and [`IngressTranslator`]
//! - [`gateway`] - Outcome-to-verdict mapping, deadlines, failure logging
//! - [`server`] - HTTP check listener
//! - [`config`] - CLI / environment configuration
//! - [`logging`] - Tracing subscriber setup
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use oidc_bridge::{CheckRequest, EgressTranslator, Gateway, GatewayConfig};
//! use oidc_bridge_idp::{IdpConfig, OidcClient};
//!
//! # async fn example() -> Result<(), oidc_bridge::BridgeError> {
//! let idp = OidcClient::initialize(IdpConfig::new("https://idp.example.com", "bridge", "secret")?).await?;
//! let gateway = Gateway::new(
//!     Arc::new(EgressTranslator::new(Arc::new(idp))),
//!     GatewayConfig::default(),
//! );
//!
//! let request = CheckRequest::new("req-1", "api.example.com", "/", "GET")
//!     .with_header("authorization", "Bearer eyJ...");
//! let response = gateway.check(&request).await;
//! println!("allowed: {}", response.is_allowed());
//! # Ok(())
//! # }
//! ```

pub mod check;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod server;
pub mod translator;

pub use check::{CheckRequest, CheckResponse, Decision, Direction};
pub use config::{BridgeConfig, Cli, LogConfig};
pub use error::{BridgeError, BridgeResult};
pub use gateway::{Gateway, GatewayConfig};
pub use translator::{
    EgressResult, EgressTranslator, IngressResult, IngressTranslator, Translation, Translator,
};
