//! Command-line and environment configuration
//!
//! Every option has an environment fallback. [`Cli`] is parsed once and
//! validated into an immutable [`BridgeConfig`]; nothing is global.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use oidc_bridge_idp::{CacheConfig, DiscoveryFetcher, IdpConfig};

use crate::error::{BridgeError, BridgeResult};
use crate::gateway::GatewayConfig;
use crate::translator::{AUTHORIZATION_HEADER, DEFAULT_IDENTITY_HEADER};

/// oidc-bridge - OIDC bearer token / internal identity bridge
///
/// Runs two external-authorization listeners. Egress checks replace an
/// external bearer token with the internal identity header; ingress checks
/// attach a delegated bearer token for the internal subject.
#[derive(Parser)]
#[command(
    name = "oidc-bridge",
    version,
    about = "Sidecar authorization filter bridging OIDC bearer tokens and internal identities"
)]
pub struct Cli {
    /// OIDC issuer base URL
    #[arg(long, env = "ISSUER")]
    pub issuer: String,

    /// Full URL of the OIDC discovery document, when it is not served at
    /// `<issuer>/.well-known/openid-configuration`
    #[arg(long, env = "DISCOVERY_URL")]
    pub discovery_url: Option<String>,

    /// Client identifier at the issuer
    #[arg(long, env = "CLIENT_ID")]
    pub client_id: String,

    /// Client secret at the issuer
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Listener address for ingress checks
    #[arg(long, env = "INGRESS_ADDR", default_value = "0.0.0.0:50051")]
    pub ingress_addr: SocketAddr,

    /// Listener address for egress checks
    #[arg(long, env = "EGRESS_ADDR", default_value = "0.0.0.0:50052")]
    pub egress_addr: SocketAddr,

    /// Internal identity header carrying the subject
    #[arg(long, env = "IDENTITY_HEADER", default_value = DEFAULT_IDENTITY_HEADER)]
    pub identity_header: String,

    /// Timeout for each call to the issuer, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Deadline for a whole check, in milliseconds
    #[arg(long, env = "CHECK_TIMEOUT_MS")]
    pub check_timeout_ms: Option<u64>,

    /// Cache service-account and exchanged tokens until shortly before expiry
    #[arg(long, env = "BRIDGE_TOKEN_CACHE")]
    pub token_cache: bool,

    /// Refresh cached tokens this many seconds before they expire
    #[arg(long, env = "TOKEN_REFRESH_MARGIN_SECS", default_value_t = 10)]
    pub token_refresh_margin_secs: u64,

    /// Enable verbose logging (-v, -vv, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

/// Logging settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogConfig {
    /// Count of `-v` flags
    pub verbosity: u8,
    /// JSON output instead of human-readable
    pub json: bool,
}

/// Validated, immutable process configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Identity provider settings
    pub idp: IdpConfig,
    /// Ingress listener address
    pub ingress_addr: SocketAddr,
    /// Egress listener address
    pub egress_addr: SocketAddr,
    /// Settings shared by both gateways
    pub gateway: GatewayConfig,
    /// Token cache settings, `None` when caching is off
    pub token_cache: Option<CacheConfig>,
    /// Logging settings
    pub log: LogConfig,
}

impl TryFrom<Cli> for BridgeConfig {
    type Error = BridgeError;

    fn try_from(cli: Cli) -> BridgeResult<Self> {
        if cli.http_timeout_secs == 0 {
            return Err(BridgeError::configuration(
                "http timeout must be greater than zero",
            ));
        }
        if cli.ingress_addr == cli.egress_addr {
            return Err(BridgeError::configuration(format!(
                "ingress and egress listeners must use different addresses ({})",
                cli.ingress_addr
            )));
        }

        let identity_header = cli.identity_header.to_ascii_lowercase();
        if http::HeaderName::from_bytes(identity_header.as_bytes()).is_err() {
            return Err(BridgeError::configuration(format!(
                "'{identity_header}' is not a valid header name"
            )));
        }
        if identity_header == AUTHORIZATION_HEADER {
            return Err(BridgeError::configuration(
                "identity header must differ from the authorization header",
            ));
        }

        let check_timeout = match cli.check_timeout_ms {
            Some(0) => {
                return Err(BridgeError::configuration(
                    "check timeout must be greater than zero",
                ));
            }
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        };

        // Reject a malformed issuer before any network traffic
        DiscoveryFetcher::discovery_url(&cli.issuer)?;
        let mut idp = IdpConfig::new(cli.issuer, cli.client_id, cli.client_secret)?
            .with_http_timeout(Duration::from_secs(cli.http_timeout_secs));
        if let Some(discovery_url) = cli.discovery_url {
            DiscoveryFetcher::explicit_url(&discovery_url)?;
            idp = idp.with_discovery_url(discovery_url);
        }

        let token_cache = cli.token_cache.then(|| CacheConfig {
            refresh_margin: Duration::from_secs(cli.token_refresh_margin_secs),
        });

        Ok(Self {
            idp,
            ingress_addr: cli.ingress_addr,
            egress_addr: cli.egress_addr,
            gateway: GatewayConfig {
                identity_header,
                check_timeout,
            },
            token_cache,
            log: LogConfig {
                verbosity: cli.verbose,
                json: cli.log_json,
            },
        })
    }
}
