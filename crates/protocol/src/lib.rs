//! Client-side protocol core for Verifiable Agent Credential (VAC) request chaining.
//!
//! Callers send requests through a VAC gateway (the "sidecar"). The gateway
//! answers successful steps with a receipt in the `X-VAC-Receipt` header, and
//! later steps must present every receipt collected so far. This crate builds
//! correctly shaped requests, accumulates receipts, manages the correlation
//! id, and classifies gateway refusals. It never inspects credentials or
//! receipts and implements no policy.
//!
//! ## Architectural Layer
//!
//! **Protocol logic + port definition.** No network I/O happens here. The
//! [`Transport`] trait defines what the session needs from an HTTP client;
//! the `http-transport` crate supplies it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | `Receipt`, `CorrelationId`, `Credential` newtypes |
//! | [`request`] | `Method`, `RequestBody`, `CallRequest`, header construction |
//! | [`response`] | `Response` wrapper and receipt extraction |
//! | [`session`] | `Session` state and the call path |
//! | [`transport`] | `Transport` port trait and degraded header collapsing |
//! | [`errors`] | `TransportError`, `VacError` classifier, `FailureReason` |
//!
//! ## Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use protocol::{CallRequest, Session, SessionConfig, Transport};
//! # async fn example(transport: Arc<dyn Transport>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new(SessionConfig::new("<root-biscuit>"), transport);
//!
//! session.call(CallRequest::get("/search").query("q", "flights")).await?;
//! let charge = session
//!     .call(CallRequest::post("/charge").json(serde_json::json!({"amount": 100})))
//!     .await?;
//!
//! if let Err(err) = charge.raise_for_status() {
//!     if err.is_missing_receipt() {
//!         eprintln!("policy requires a prior step: {}", err.message());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod identifiers;
pub mod request;
pub mod response;
pub mod session;
pub mod transport;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{FailureReason, InvalidMethod, TransportError, VacError};
pub use identifiers::{CorrelationId, Credential, Receipt};
pub use request::{
    build_headers, headers, normalize_endpoint, normalize_path, CallRequest, HeaderList, Method,
    RequestBody, WireRequest,
};
pub use response::{extract_receipt, Response};
pub use session::{Session, SessionConfig, DEFAULT_ENDPOINT};
pub use transport::{collapse_headers, CollapsedHeaders, RawResponse, Transport};
