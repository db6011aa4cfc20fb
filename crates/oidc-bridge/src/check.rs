//! Check contract exchanged with the transport layer
//!
//! A [`CheckRequest`] describes one proxied request; a [`CheckResponse`]
//! tells the proxy whether to let it through and how to rewrite its headers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side of the trust boundary a listener serves
///
/// Fixed per listener by configuration, never inferred from request content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Requests carrying an internal subject; a delegated bearer token is attached
    Ingress,
    /// Requests carrying an external bearer token; it is replaced by the subject
    Egress,
}

impl Direction {
    /// Lowercase label used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ingress => "ingress",
            Self::Egress => "egress",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One authorization check, immutable for its duration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    /// Correlation id, logged on failure
    pub request_id: String,
    /// Target host
    pub host: String,
    /// Request path including query
    pub path: String,
    /// HTTP method
    pub method: String,
    /// Inbound headers keyed by lower-cased name
    headers: BTreeMap<String, String>,
}

impl CheckRequest {
    /// Create a check request without headers
    pub fn new(
        request_id: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            host: host.into(),
            path: path.into(),
            method: method.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Add a header; names are stored lower-cased and later values win
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    /// Insert a header in place
    pub fn insert_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// All headers, lower-cased names
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

/// Outcome of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Forward the request, applying the header mutations
    Allow,
    /// Reject the request at the proxy boundary
    Deny,
}

/// Status used for every denied check
pub const DENY_STATUS: u16 = 403;

/// Status used for every allowed check
pub const ALLOW_STATUS: u16 = 200;

/// Response to the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    /// Allow or deny
    pub decision: Decision,
    /// HTTP status the proxy should use
    pub status: u16,
    /// Headers to add to (or overwrite on) the forwarded request
    pub headers_to_add: Vec<(String, String)>,
    /// Header names to strip from the forwarded request
    pub headers_to_remove: Vec<String>,
    /// Resolved subject, egress only
    pub subject: Option<String>,
}

impl CheckResponse {
    /// Allow without touching any header
    pub fn pass_through() -> Self {
        Self::allow(Vec::new(), Vec::new(), None)
    }

    /// Allow with header mutations
    pub fn allow(
        headers_to_add: Vec<(String, String)>,
        headers_to_remove: Vec<String>,
        subject: Option<String>,
    ) -> Self {
        Self {
            decision: Decision::Allow,
            status: ALLOW_STATUS,
            headers_to_add,
            headers_to_remove,
            subject,
        }
    }

    /// Deny with no mutations
    pub fn deny() -> Self {
        Self {
            decision: Decision::Deny,
            status: DENY_STATUS,
            headers_to_add: Vec::new(),
            headers_to_remove: Vec::new(),
            subject: None,
        }
    }

    /// Whether the request may proceed
    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allow
    }
}
