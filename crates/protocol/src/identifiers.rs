//! Newtype protocol identifiers.
//!
//! Receipts, correlation ids, and root credentials are all strings on the
//! wire. Each gets its own newtype so a receipt can never be passed where a
//! correlation id is expected, and so the credential never leaks through
//! `Debug` output.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for non-empty String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new value, returning `None` if `value` is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Opaque proof string issued by the gateway after a successful call.
    ///
    /// Receipts are never parsed or verified here. They are collected from the
    /// `X-VAC-Receipt` response header and replayed, in order, on later calls.
    Receipt
}

string_id! {
    /// Binds a sequence of calls into one logical workflow (receipt chain).
    ///
    /// Sent as `X-Correlation-ID` on every request. A receipt chain is only
    /// valid together with the correlation id it was accumulated under.
    CorrelationId
}

impl CorrelationId {
    /// Generates a fresh, globally unique correlation id (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// The root credential presented as `Authorization: Bearer <credential>`.
///
/// The value is opaque: it is not validated, decoded, or inspected. An empty
/// credential is permitted and yields an empty bearer token; rejecting it is
/// the gateway's job.
///
/// `Debug` and `Display` never print the token.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for header construction.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if no token was supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            f.write_str("Credential(<empty>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}
