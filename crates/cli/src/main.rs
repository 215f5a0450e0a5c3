//! VAC CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: flags with environment fallbacks
//!    (`VAC_SIDECAR_URL`, `VAC_ROOT_BISCUIT`, `VAC_TRANSPORT`).
//! 2. **Wire observability**: `tracing-subscriber` with a JSON or pretty
//!    layer, plus an OpenTelemetry OTLP exporter when configured.
//! 3. **Construct infrastructure**: pick the transport strategy once and
//!    build the [`protocol::Session`] around it.
//! 4. **Run the subcommand**: `workflow`, `request`, or `health`.

mod commands;
mod config;
mod observability;

use anyhow::Context;
use clap::Parser;
use http_transport::{build_transport, HttpConfig};
use protocol::Session;
use tracing::info;

use crate::config::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let telemetry = observability::init(cli.log_format)?;

    let result = run(&cli).await;

    telemetry.shutdown();
    result
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let transport = build_transport(cli.transport, &HttpConfig::default())
        .context("failed to build HTTP transport")?;
    let mut session = Session::new(cli.session_config(), transport);

    info!(
        endpoint = session.endpoint(),
        transport = session.transport_name(),
        correlation_id = %session.correlation_id(),
        credential = session.has_credential(),
        "session ready"
    );

    commands::run(&cli.command, &mut session).await
}
