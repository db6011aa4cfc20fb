//! Error types for the identity provider client
//!
//! Four kinds, matching the life cycle of the client:
//! - Configuration / Discovery: startup only, fatal to the process
//! - Network / TokenInvalid: per request, fail the enclosing check

use thiserror::Error;

/// Result type for identity provider operations
pub type IdpResult<T> = std::result::Result<T, IdpError>;

/// Errors raised by the identity provider client
///
/// Messages never contain token or secret material. Response bodies from the
/// issuer are not echoed because error payloads may reflect the submitted
/// token back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdpError {
    /// Missing or malformed issuer / client id / client secret
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is wrong with the configuration
        message: String,
    },

    /// Issuer metadata unreachable or malformed
    #[error("Discovery error: {message}")]
    Discovery {
        /// Why discovery failed
        message: String,
    },

    /// Outbound call failed at transport level or returned a non-success status
    #[error("Network error during {operation}: {message}")]
    Network {
        /// Which outbound call failed (`userinfo`, `client_credentials`, `token_exchange`)
        operation: &'static str,
        /// Failure description
        message: String,
        /// HTTP status when the issuer answered with a non-success status
        status: Option<u16>,
    },

    /// Issuer response could not be parsed into the expected shape
    #[error("Invalid token response during {operation}: {message}")]
    TokenInvalid {
        /// Which outbound call produced the response
        operation: &'static str,
        /// Parse failure description
        message: String,
    },
}

impl IdpError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a discovery error
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
        }
    }

    /// Create a network error for a transport-level failure
    pub fn network(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Network {
            operation,
            message: message.into(),
            status: None,
        }
    }

    /// Create a network error for a non-success HTTP status
    pub fn status(operation: &'static str, status: u16) -> Self {
        Self::Network {
            operation,
            message: format!("issuer responded with HTTP {status}"),
            status: Some(status),
        }
    }

    /// Create a token-invalid error
    pub fn token_invalid(operation: &'static str, message: impl Into<String>) -> Self {
        Self::TokenInvalid {
            operation,
            message: message.into(),
        }
    }

    /// Static label for structured logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::Discovery { .. } => "discovery",
            Self::Network { .. } => "network",
            Self::TokenInvalid { .. } => "token_invalid",
        }
    }

    /// Whether this error can only happen at startup
    pub fn is_startup_error(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Discovery { .. })
    }
}

/// Map a reqwest failure into a network error without leaking the request URL
pub(crate) fn from_reqwest(operation: &'static str, err: reqwest::Error) -> IdpError {
    if err.is_timeout() {
        return IdpError::network(operation, "request timed out");
    }
    IdpError::network(operation, err.without_url().to_string())
}
