//! Direction-specific translation between bearer tokens and subjects
//!
//! Both directions implement [`Translator`]; a gateway holds exactly one,
//! chosen by the listener it serves.
//!
//! - [`EgressTranslator`]: `Authorization: Bearer <token>` → subject
//! - [`IngressTranslator`]: subject → `Authorization: Bearer <delegated token>`

use async_trait::async_trait;

use crate::check::{CheckRequest, Direction};
use crate::error::BridgeResult;

pub mod egress;
pub mod ingress;

pub use egress::{EgressResult, EgressTranslator};
pub use ingress::{IngressResult, IngressTranslator};

/// Header carrying the external bearer token
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Scheme prefix recognised on [`AUTHORIZATION_HEADER`] (case-sensitive)
pub const BEARER_PREFIX: &str = "Bearer ";

/// Default name of the internal identity header
pub const DEFAULT_IDENTITY_HEADER: &str = "x-bridge-identity";

/// Result of translating one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// Egress outcome
    Egress(EgressResult),
    /// Ingress outcome
    Ingress(IngressResult),
}

/// Translate a check in one fixed direction
#[async_trait]
pub trait Translator: Send + Sync {
    /// Direction this translator serves
    fn direction(&self) -> Direction;

    /// Translate one check
    ///
    /// # Errors
    ///
    /// Returns the identity provider error unchanged, or
    /// [`BridgeError::MissingIdentity`](crate::BridgeError::MissingIdentity)
    /// when an ingress check carries no subject.
    async fn translate(&self, request: &CheckRequest) -> BridgeResult<Translation>;
}
