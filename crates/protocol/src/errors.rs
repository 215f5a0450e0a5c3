//! Error types for the VAC client.
//!
//! Three failure families are kept apart:
//!
//! - [`TransportError`]: the round trip never produced a response (connection
//!   refused, timeout, unencodable request). Returned from
//!   [`crate::Session::call`]; the session's receipts are untouched.
//! - [`VacError`]: the gateway answered with a non-2xx status. Never raised
//!   automatically; produced on demand by [`crate::Response::raise_for_status`]
//!   and classified by substring heuristics over the free-text message.
//! - Decode failures: `serde_json::Error`, surfaced only from
//!   [`crate::Response::json`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Transport failures
// ---------------------------------------------------------------------------

/// The request could not be completed by the underlying HTTP transport.
///
/// Transport failures are surfaced immediately and are never retried.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response arrived within the transport's fixed request timeout.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout {
        /// Target URL (without query string).
        url: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The connection could not be established (refused, DNS, TLS).
    #[error("connection to {url} failed: {message}")]
    Connect {
        /// Target URL (without query string).
        url: String,
        /// Underlying error description.
        message: String,
    },

    /// A header name or value could not be represented on the wire.
    #[error("invalid header '{name}': {message}")]
    InvalidHeader {
        /// Offending header name.
        name: String,
        /// Why the header was rejected.
        message: String,
    },

    /// The JSON request body could not be serialised.
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Any other I/O failure reported by the transport.
    #[error("transport failure: {0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// Gateway errors
// ---------------------------------------------------------------------------

/// A non-2xx answer from the gateway, with heuristic classification.
///
/// The flags are evaluated independently and may overlap: a 403 mentioning a
/// missing prior step is both a policy violation and a missing receipt.
/// Matching is literal substring search over server-supplied text, so a 403
/// that matches nothing should be treated as a generic policy denial.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("VAC Error {status}: {message}")]
pub struct VacError {
    status: u16,
    message: String,
}

impl VacError {
    /// Creates an error from a status code and the raw response text.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code returned by the gateway.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Raw response body text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Any 403 from the gateway.
    pub fn is_policy_violation(&self) -> bool {
        self.status == 403
    }

    /// A 403 whose message points at a missing prerequisite receipt.
    pub fn is_missing_receipt(&self) -> bool {
        self.status == 403
            && (self.message.contains("prior_event") || self.message.contains("prior step"))
    }

    /// A 403 whose message mentions expiry (case-insensitive).
    pub fn is_expired(&self) -> bool {
        self.status == 403 && self.message.to_lowercase().contains("expired")
    }

    /// Any 409: the presented receipts belong to another correlation id.
    pub fn is_correlation_mismatch(&self) -> bool {
        self.status == 409
    }

    /// Folds the independent flags into a single reason.
    ///
    /// Precedence: missing receipt, expired, correlation mismatch, policy
    /// denial, other.
    pub fn reason(&self) -> FailureReason {
        if self.is_missing_receipt() {
            FailureReason::MissingReceipt
        } else if self.is_expired() {
            FailureReason::Expired
        } else if self.is_correlation_mismatch() {
            FailureReason::CorrelationMismatch
        } else if self.is_policy_violation() {
            FailureReason::PolicyDenied
        } else {
            FailureReason::Other
        }
    }
}

/// Single-valued summary of a [`VacError`] classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Policy requires a receipt from a prior step that was not presented.
    MissingReceipt,
    /// A presented receipt has expired.
    Expired,
    /// Receipts were presented under a different correlation id.
    CorrelationMismatch,
    /// A 403 that matched no more specific heuristic.
    PolicyDenied,
    /// Any other non-2xx status.
    Other,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureReason::MissingReceipt => "missing_receipt",
            FailureReason::Expired => "expired",
            FailureReason::CorrelationMismatch => "correlation_mismatch",
            FailureReason::PolicyDenied => "policy_denied",
            FailureReason::Other => "other",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------

/// A method string that is not one of the supported HTTP verbs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported HTTP method '{0}'")]
pub struct InvalidMethod(pub String);
