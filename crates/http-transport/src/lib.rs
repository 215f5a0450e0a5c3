//! HTTP transport adapter for the VAC client.
//!
//! Implements the [`protocol::Transport`] trait over `reqwest` with two
//! strategies:
//!
//! - [`MultiHeaderTransport`]: repeated `X-VAC-Receipt` headers reach the
//!   wire as distinct headers. Preferred.
//! - [`SingleHeaderTransport`]: one header per name; receipts are collapsed
//!   into a comma-joined value and a warning is logged when more than one
//!   receipt is folded.
//!
//! Both apply a fixed 30 second request timeout (see [`HttpConfig`]) and map
//! I/O failures to [`protocol::TransportError`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Header encoding, timeouts, and error mapping live here.
//! The [`protocol`] crate sees only [`protocol::Transport`].

mod config;
mod exchange;
mod multi_header;
mod single_header;

use std::str::FromStr;
use std::sync::Arc;

use protocol::{Transport, TransportError};

pub use config::{build_client, HttpConfig, DEFAULT_REQUEST_TIMEOUT};
pub use multi_header::MultiHeaderTransport;
pub use single_header::SingleHeaderTransport;

/// Which transport strategy a session uses.
///
/// Chosen once when the session is built, so the degraded behaviour of
/// [`TransportKind::SingleHeader`] is predictable per session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Distinct header per receipt.
    #[default]
    MultiHeader,
    /// One comma-joined receipt header.
    SingleHeader,
}

impl TransportKind {
    /// Short name accepted by `VAC_TRANSPORT`.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::MultiHeader => "multi",
            TransportKind::SingleHeader => "single",
        }
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "multi" | "multi-header" => Ok(TransportKind::MultiHeader),
            "single" | "single-header" => Ok(TransportKind::SingleHeader),
            other => Err(format!(
                "unknown transport '{other}' (expected 'multi' or 'single')"
            )),
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the transport for `kind`.
pub fn build_transport(
    kind: TransportKind,
    config: &HttpConfig,
) -> Result<Arc<dyn Transport>, TransportError> {
    let transport: Arc<dyn Transport> = match kind {
        TransportKind::MultiHeader => Arc::new(MultiHeaderTransport::new(config)?),
        TransportKind::SingleHeader => Arc::new(SingleHeaderTransport::new(config)?),
    };
    tracing::debug!(transport = transport.name(), "transport built");
    Ok(transport)
}
