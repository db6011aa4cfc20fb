//! Error types for the bridge
//!
//! Two tiers:
//! - Identity provider errors, wrapped unchanged from `oidc-bridge-idp`
//! - Bridge errors: missing internal identity, check deadlines, configuration
//!   and listener I/O

use std::time::Duration;

use oidc_bridge_idp::IdpError;
use thiserror::Error;

/// Result type for bridge operations
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

/// Main error type for the bridge
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BridgeError {
    /// Identity provider call failed
    ///
    /// Preserves the provider error so the gateway can log its kind.
    #[error(transparent)]
    Idp(#[from] IdpError),

    /// Ingress check arrived without the internal identity header
    #[error("Missing internal identity header '{header}'")]
    MissingIdentity {
        /// Name of the header that was expected
        header: String,
    },

    /// Check exceeded its deadline; the outbound call was abandoned
    #[error("Check exceeded {}ms deadline", timeout.as_millis())]
    Timeout {
        /// Deadline that was exceeded
        timeout: Duration,
    },

    /// Invalid bridge configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is wrong
        message: String,
    },

    /// Listener I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Create a missing-identity error
    pub fn missing_identity(header: impl Into<String>) -> Self {
        Self::MissingIdentity {
            header: header.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Static label for structured logging
    ///
    /// Provider errors report the provider's own kind (`network`,
    /// `token_invalid`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Idp(err) => err.kind(),
            Self::MissingIdentity { .. } => "missing_identity",
            Self::Timeout { .. } => "timeout",
            Self::Configuration { .. } => "configuration",
            Self::Io(_) => "io",
        }
    }
}
