//! Multi-header strategy: every header pair reaches the wire as given.

use std::time::Duration;

use async_trait::async_trait;
use protocol::{RawResponse, Transport, TransportError, WireRequest};
use reqwest::header::HeaderMap;
use reqwest::Client;
use tracing::debug;

use crate::config::{build_client, HttpConfig};
use crate::exchange::{execute, header_pair};

/// Sends each `X-VAC-Receipt` as its own header. The preferred strategy.
#[derive(Debug, Clone)]
pub struct MultiHeaderTransport {
    client: Client,
    timeout: Duration,
}

impl MultiHeaderTransport {
    /// Builds the transport with its own reqwest client.
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_client(config)?,
            timeout: config.request_timeout,
        })
    }

    /// Keeps every pair, repeated names included, in order.
    pub(crate) fn header_map(request: &WireRequest) -> Result<HeaderMap, TransportError> {
        let mut map = HeaderMap::with_capacity(request.headers.len());
        for (name, value) in request.headers.iter() {
            let (name, value) = header_pair(name, value)?;
            map.append(name, value);
        }
        Ok(map)
    }
}

#[async_trait]
impl Transport for MultiHeaderTransport {
    fn name(&self) -> &'static str {
        "multi-header"
    }

    fn preserves_repeated_headers(&self) -> bool {
        true
    }

    async fn send(&self, request: &WireRequest) -> Result<RawResponse, TransportError> {
        let headers = Self::header_map(request)?;
        debug!(
            method = %request.method,
            url = %request.url,
            headers = headers.len(),
            "multi-header send"
        );
        execute(&self.client, request, headers, self.timeout).await
    }
}
