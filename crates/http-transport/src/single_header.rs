//! Single-header strategy: one header per name on the wire.
//!
//! For transports that cannot repeat a header name. Receipts are collapsed
//! into one comma-joined `X-VAC-Receipt` header. A gateway that expects
//! distinct receipt headers may reject that form, so every collapse of more
//! than one receipt logs a warning. The request is still sent.

use std::time::Duration;

use async_trait::async_trait;
use protocol::{collapse_headers, RawResponse, Transport, TransportError, WireRequest};
use reqwest::header::HeaderMap;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{build_client, HttpConfig};
use crate::exchange::{execute, header_pair};

/// Degraded-mode transport that sends at most one header per name.
#[derive(Debug, Clone)]
pub struct SingleHeaderTransport {
    client: Client,
    timeout: Duration,
}

impl SingleHeaderTransport {
    /// Builds the transport with its own reqwest client.
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_client(config)?,
            timeout: config.request_timeout,
        })
    }

    pub(crate) fn header_map(request: &WireRequest) -> Result<HeaderMap, TransportError> {
        let collapsed = collapse_headers(&request.headers);
        if collapsed.is_degraded() {
            warn!(
                receipts = collapsed.receipt_count,
                url = %request.url,
                "multiple receipts collapsed into one X-VAC-Receipt header; \
                 the gateway expects separate headers and multi-step workflows may fail"
            );
        }

        let mut map = HeaderMap::with_capacity(collapsed.headers.len());
        for (name, value) in &collapsed.headers {
            let (name, value) = header_pair(name, value)?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

#[async_trait]
impl Transport for SingleHeaderTransport {
    fn name(&self) -> &'static str {
        "single-header"
    }

    fn preserves_repeated_headers(&self) -> bool {
        false
    }

    async fn send(&self, request: &WireRequest) -> Result<RawResponse, TransportError> {
        let headers = Self::header_map(request)?;
        debug!(
            method = %request.method,
            url = %request.url,
            headers = headers.len(),
            "single-header send"
        );
        execute(&self.client, request, headers, self.timeout).await
    }
}
