//! # oidc-bridge-idp
//!
//! Identity provider client for the OIDC token bridge. Wraps a single
//! configured OpenID Connect issuer and exposes the three operations the
//! translators need:
//!
//! - **Resolve subject**: userinfo lookup for an external access token
//! - **Service account token**: client credentials grant (RFC 6749 Section 4.4)
//! - **Exchange for user**: token exchange on behalf of a subject (RFC 8693)
//!
//! ## Architecture
//!
//! - [`discovery`] - One-shot OIDC discovery of the token and userinfo endpoints
//! - [`client`] - [`OidcClient`], the reqwest-backed implementation
//! - [`provider`] - [`IdentityProvider`], the trait the translators consume
//! - [`cache`] - [`CachingProvider`], optional expiry-aware token cache
//! - [`config`] - Issuer, credentials and timeouts
//! - [`token`] - [`AccessToken`] and wire constants
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oidc_bridge_idp::{IdentityProvider, IdpConfig, OidcClient};
//!
//! # async fn example() -> Result<(), oidc_bridge_idp::IdpError> {
//! let config = IdpConfig::new("https://idp.example.com", "bridge", "secret")?;
//! let client = OidcClient::initialize(config).await?;
//!
//! let service_account = client.obtain_service_account_token().await?;
//! let delegated = client.exchange_for_user(&service_account, "user-42").await?;
//! println!("Authorization: {}", delegated.bearer_header_value());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod provider;
pub mod token;

pub use cache::{CacheConfig, CachingProvider};
pub use client::OidcClient;
pub use config::{ClientCredentials, IdpConfig};
pub use discovery::{DiscoveryConfig, DiscoveryFetcher, FetcherConfig};
pub use error::{IdpError, IdpResult};
pub use provider::IdentityProvider;
pub use token::AccessToken;
