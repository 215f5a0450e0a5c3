//! Command-line and environment configuration.

use clap::{Parser, Subcommand, ValueEnum};
use http_transport::TransportKind;
use protocol::{Credential, SessionConfig, DEFAULT_ENDPOINT};

/// Drive receipt-chained requests through a VAC sidecar.
#[derive(Debug, Parser)]
#[command(name = "vac", version, about)]
pub struct Cli {
    /// Base URL of the VAC sidecar.
    #[arg(long, env = "VAC_SIDECAR_URL", default_value = DEFAULT_ENDPOINT)]
    pub sidecar_url: String,

    /// Root biscuit presented as the bearer credential.
    #[arg(long, env = "VAC_ROOT_BISCUIT", default_value = "", hide_env_values = true)]
    pub root_biscuit: String,

    /// Header strategy: `multi` (one header per receipt) or `single` (collapsed).
    #[arg(long, env = "VAC_TRANSPORT", default_value = "multi")]
    pub transport: TransportKind,

    /// Log output format (written to stderr).
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Session parameters taken from the flags.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(Credential::new(self.root_biscuit.clone())).endpoint(&self.sidecar_url)
    }
}

/// Subcommands of `vac`.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the search → select → charge workflow.
    Workflow {
        #[arg(long, default_value = "flights to NYC")]
        query: String,
        #[arg(long, default_value = "AA123")]
        flight_id: String,
        /// Amount in minor units.
        #[arg(long, default_value_t = 35000)]
        amount: u64,
        #[arg(long, default_value = "usd")]
        currency: String,
    },

    /// Send a single request and print a JSON summary.
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS).
        method: String,
        /// Path on the sidecar, e.g. `/search`.
        path: String,
        /// JSON body. On GET, a JSON object is sent as query parameters.
        #[arg(long)]
        body: Option<String>,
    },

    /// Check the sidecar's `/health` endpoint.
    Health,
}

/// Log line format written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable lines.
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["vac", "health"]).unwrap();
        assert_eq!(cli.transport, TransportKind::MultiHeader);
        assert_eq!(cli.log_format, LogFormat::Pretty);
        assert!(matches!(cli.command, Command::Health));
    }

    #[test]
    fn test_request_command() {
        let cli = Cli::try_parse_from([
            "vac",
            "--sidecar-url",
            "http://gw:9000/",
            "--root-biscuit",
            "tok",
            "--transport",
            "single",
            "request",
            "post",
            "/charge",
            "--body",
            r#"{"amount":1}"#,
        ])
        .unwrap();

        assert_eq!(cli.sidecar_url, "http://gw:9000/");
        assert_eq!(cli.transport, TransportKind::SingleHeader);
        match cli.command {
            Command::Request { method, path, body } => {
                assert_eq!(method, "post");
                assert_eq!(path, "/charge");
                assert_eq!(body.as_deref(), Some(r#"{"amount":1}"#));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_transport_is_rejected() {
        assert!(Cli::try_parse_from(["vac", "--transport", "pigeon", "health"]).is_err());
    }
}
