//! Session state and the call path.
//!
//! A [`Session`] owns one receipt chain: the endpoint, the root credential,
//! the correlation id, and the receipts accumulated so far. Every call reads
//! that state to build its headers and, when the gateway issues a receipt,
//! appends it before returning.
//!
//! ## Concurrency
//!
//! [`Session::call`] takes `&mut self`, so one session serves one call at a
//! time and receipts are appended in call order. Sharing a session between
//! tasks requires an external lock (e.g. `tokio::sync::Mutex<Session>`);
//! without one the receipt order would be a race.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::TransportError;
use crate::identifiers::{CorrelationId, Credential, Receipt};
use crate::request::{
    build_headers, normalize_endpoint, normalize_path, CallRequest, HeaderList, WireRequest,
};
use crate::response::Response;
use crate::transport::Transport;

/// Endpoint used when the caller does not supply one.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000";

/// Construction parameters for a [`Session`].
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Gateway base URL. Defaults to [`DEFAULT_ENDPOINT`].
    pub endpoint: Option<String>,
    /// Root credential. Empty is allowed.
    pub credential: Credential,
    /// Correlation id to resume. A fresh one is generated when `None`.
    pub correlation_id: Option<CorrelationId>,
}

impl SessionConfig {
    /// Config with the default endpoint and a generated correlation id.
    pub fn new(credential: impl Into<Credential>) -> Self {
        Self {
            credential: credential.into(),
            ..Self::default()
        }
    }

    /// Overrides the gateway base URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Resumes an existing correlation id.
    pub fn correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = Some(id);
        self
    }
}

/// One receipt chain against one gateway.
pub struct Session {
    endpoint: String,
    credential: Credential,
    correlation_id: CorrelationId,
    receipts: Vec<Receipt>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential)
            .field("correlation_id", &self.correlation_id)
            .field("receipts", &self.receipts.len())
            .field("transport", &self.transport.name())
            .finish()
    }
}

impl Session {
    /// Creates a session with no receipts.
    ///
    /// The transport strategy is fixed for the life of the session and is
    /// shared with any [`fork`](Self::fork).
    pub fn new(config: SessionConfig, transport: Arc<dyn Transport>) -> Self {
        let endpoint = normalize_endpoint(config.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT));
        Self {
            endpoint,
            credential: config.credential,
            correlation_id: config
                .correlation_id
                .unwrap_or_else(CorrelationId::generate),
            receipts: Vec::new(),
            transport,
        }
    }

    /// Base URL without a trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Id sent as `X-Correlation-ID` on every call.
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Receipts in accumulation order.
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Number of receipts accumulated so far.
    pub fn receipt_count(&self) -> usize {
        self.receipts.len()
    }

    /// Whether a non-empty root credential was supplied.
    pub fn has_credential(&self) -> bool {
        !self.credential.is_empty()
    }

    /// Name of the transport strategy in use.
    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Drops all receipts and starts a new correlation id.
    ///
    /// A cleared chain never reuses the old id.
    pub fn clear_receipts(&mut self) {
        self.receipts.clear();
        self.correlation_id = CorrelationId::generate();
        debug!(correlation_id = %self.correlation_id, "receipts cleared");
    }

    /// Starts an independent workflow against the same gateway.
    ///
    /// The new session shares endpoint, credential, and transport, and has
    /// no receipts and a fresh correlation id. `self` is unchanged.
    pub fn fork(&self) -> Session {
        Session {
            endpoint: self.endpoint.clone(),
            credential: self.credential.clone(),
            correlation_id: CorrelationId::generate(),
            receipts: Vec::new(),
            transport: Arc::clone(&self.transport),
        }
    }

    /// Ordered request headers for the current state.
    pub fn build_headers(&self, include_content_type: bool) -> HeaderList {
        build_headers(
            &self.credential,
            &self.correlation_id,
            &self.receipts,
            include_content_type,
        )
    }

    /// Applies session state to a caller's request.
    pub fn build_request(&self, call: &CallRequest) -> Result<WireRequest, TransportError> {
        Ok(WireRequest {
            method: call.method,
            url: format!("{}{}", self.endpoint, normalize_path(&call.path)),
            query: call.query.clone(),
            headers: self.build_headers(call.includes_content_type()),
            body: call.body.encode()?,
        })
    }

    /// Sends one request through the gateway.
    ///
    /// On success any receipt in the response has already been appended to
    /// this session. A non-2xx status still returns `Ok`; inspect
    /// [`Response::ok`] or call [`Response::raise_for_status`]. On a transport
    /// failure the receipts are untouched.
    #[instrument(
        skip(self, call),
        fields(
            method = %call.method,
            path = %call.path,
            correlation_id = %self.correlation_id,
            transport = self.transport.name(),
        )
    )]
    pub async fn call(&mut self, call: CallRequest) -> Result<Response, TransportError> {
        let wire = self.build_request(&call)?;
        debug!(
            url = %wire.url,
            receipts = self.receipts.len(),
            "sending request"
        );

        let raw = self.transport.send(&wire).await?;
        let response = Response::from_raw(raw);

        if let Some(receipt) = response.receipt() {
            self.receipts.push(receipt.clone());
            debug!(total = self.receipts.len(), "receipt accumulated");
        }
        debug!(status = response.status(), "response received");

        Ok(response)
    }

    /// `GET` without query parameters.
    pub async fn get(&mut self, path: &str) -> Result<Response, TransportError> {
        self.call(CallRequest::get(path)).await
    }

    /// `POST` with a JSON body.
    pub async fn post(&mut self, path: &str, body: Value) -> Result<Response, TransportError> {
        self.call(CallRequest::post(path).json(body)).await
    }

    /// `PUT` with a JSON body.
    pub async fn put(&mut self, path: &str, body: Value) -> Result<Response, TransportError> {
        self.call(CallRequest::put(path).json(body)).await
    }

    /// `PATCH` with a JSON body.
    pub async fn patch(&mut self, path: &str, body: Value) -> Result<Response, TransportError> {
        self.call(CallRequest::patch(path).json(body)).await
    }

    /// `DELETE` without a body.
    pub async fn delete(&mut self, path: &str) -> Result<Response, TransportError> {
        self.call(CallRequest::delete(path)).await
    }
}
