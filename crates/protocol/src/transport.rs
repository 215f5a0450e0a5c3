//! Transport port.
//!
//! [`Transport`] is the seam between the session and the network. The
//! `http-transport` crate supplies two implementations that differ only in
//! whether they can put the same header name on the wire more than once.
//! [`collapse_headers`] is the degraded encoding used by the one that cannot.

use async_trait::async_trait;

use crate::errors::TransportError;
use crate::request::{headers, HeaderList, WireRequest};

/// Status, headers, and body text exactly as the transport received them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers in arrival order; names may repeat.
    pub headers: HeaderList,
    /// Body decoded as text.
    pub body: String,
}

impl RawResponse {
    /// Bundles one received response.
    pub fn new(status: u16, headers: HeaderList, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

/// Sends one [`WireRequest`] and returns the raw result.
///
/// Implementations apply their own fixed timeout and map every I/O failure to
/// a [`TransportError`]. They must not interpret the status code.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs (e.g. `"multi-header"`).
    fn name(&self) -> &'static str;

    /// Whether repeated header names reach the wire as distinct headers.
    fn preserves_repeated_headers(&self) -> bool;

    /// Performs one round trip. Any status, 4xx and 5xx included, is `Ok`.
    async fn send(&self, request: &WireRequest) -> Result<RawResponse, TransportError>;
}

// ---------------------------------------------------------------------------
// Degraded-mode header encoding
// ---------------------------------------------------------------------------

/// Result of collapsing an ordered header list to one value per name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedHeaders {
    /// One pair per distinct name, in first-occurrence order.
    pub headers: Vec<(String, String)>,
    /// How many receipt headers were folded into the single receipt header.
    pub receipt_count: usize,
}

impl CollapsedHeaders {
    /// More than one receipt had to share one header.
    ///
    /// A gateway expecting distinct `X-VAC-Receipt` headers may reject the
    /// request; callers should warn.
    pub fn is_degraded(&self) -> bool {
        self.receipt_count > 1
    }
}

/// Collapses repeated headers so each name appears once.
///
/// `X-VAC-Receipt` values are joined with `", "` in accumulation order. Every
/// other repeated name keeps its last value. Names compare case-insensitively.
pub fn collapse_headers(list: &HeaderList) -> CollapsedHeaders {
    let mut out: Vec<(String, String)> = Vec::with_capacity(list.len());
    let mut receipt_count = 0;

    for (name, value) in list.iter() {
        let is_receipt = name.eq_ignore_ascii_case(headers::RECEIPT);
        if is_receipt {
            receipt_count += 1;
        }
        match out.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some((_, existing)) if is_receipt => {
                existing.push_str(headers::RECEIPT_SEPARATOR);
                existing.push_str(value);
            }
            Some((_, existing)) => *existing = value.to_string(),
            None => out.push((name.to_string(), value.to_string())),
        }
    }

    CollapsedHeaders {
        headers: out,
        receipt_count,
    }
}
