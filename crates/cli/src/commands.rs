//! Subcommand implementations.

use std::collections::BTreeMap;

use anyhow::{bail, Context};
use protocol::{CallRequest, FailureReason, Method, Response, Session};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::Command;

/// Longest response text echoed by the `request` summary.
const SUMMARY_TEXT_LIMIT: usize = 500;

/// Runs one subcommand against `session`.
pub async fn run(command: &Command, session: &mut Session) -> anyhow::Result<()> {
    match command {
        Command::Workflow {
            query,
            flight_id,
            amount,
            currency,
        } => workflow(session, query, flight_id, *amount, currency).await,
        Command::Request { method, path, body } => {
            let summary = request(session, method, path, body.as_deref()).await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Command::Health => health(session).await,
    }
}

fn short_receipt(resp: &Response) -> String {
    match resp.receipt() {
        Some(r) => format!("{}...", r.as_str().chars().take(50).collect::<String>()),
        None => "none".to_string(),
    }
}

async fn workflow(
    session: &mut Session,
    query: &str,
    flight_id: &str,
    amount: u64,
    currency: &str,
) -> anyhow::Result<()> {
    println!("Correlation ID: {}", session.correlation_id());

    println!("[Step 1] Searching for flights...");
    let search = session
        .call(CallRequest::get("/search").query("q", query))
        .await
        .context("search request failed")?;
    if !search.ok() {
        bail!("search rejected ({}): {}", search.status(), search.text());
    }
    println!("  Status: {}  Receipt: {}", search.status(), short_receipt(&search));

    println!("[Step 2] Selecting flight...");
    let select = session
        .post("/select", json!({ "flight_id": flight_id }))
        .await
        .context("select request failed")?;
    if !select.ok() {
        bail!("select rejected ({}): {}", select.status(), select.text());
    }
    println!("  Status: {}  Receipt: {}", select.status(), short_receipt(&select));

    println!("[Step 3] Charging customer...");
    let charge = session
        .post("/charge", json!({ "amount": amount, "currency": currency }))
        .await
        .context("charge request failed")?;
    if let Err(err) = charge.raise_for_status() {
        let reason = err.reason();
        warn!(status = err.status(), %reason, "charge refused");
        match reason {
            FailureReason::MissingReceipt => {
                println!("  Policy requires prior step: {}", err.message())
            }
            FailureReason::Expired => println!("  Receipt expired: {}", err.message()),
            FailureReason::CorrelationMismatch => {
                println!("  Correlation mismatch: {}", err.message())
            }
            FailureReason::PolicyDenied | FailureReason::Other => {
                println!("  Policy denied: {}", err.message())
            }
        }
        return Err(err.into());
    }
    println!("  Status: {}", charge.status());

    info!(receipts = session.receipt_count(), "workflow complete");
    println!(
        "Workflow complete! Receipts collected: {}",
        session.receipt_count()
    );
    Ok(())
}

async fn health(session: &mut Session) -> anyhow::Result<()> {
    let resp = session.get("/health").await.context("health check failed")?;
    println!("{} {}", resp.status(), resp.text());
    if !resp.ok() {
        bail!("sidecar unhealthy: status {}", resp.status());
    }
    Ok(())
}

/// Converts a JSON object into query parameters; non-string values use their JSON text.
fn object_to_query(body: &Value) -> anyhow::Result<BTreeMap<String, String>> {
    let Some(map) = body.as_object() else {
        bail!("GET body must be a JSON object");
    };
    Ok(map
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect())
}

/// Builds the call for the `request` command.
///
/// On `GET`, a JSON object body becomes query parameters and any other JSON
/// value is rejected; other methods send it as the JSON body.
pub fn build_call(
    method: Method,
    path: &str,
    body: Option<Value>,
) -> anyhow::Result<CallRequest> {
    let call = CallRequest::new(method, path);
    Ok(match (method, body) {
        (Method::Get, Some(body)) => call.with_query(object_to_query(&body)?),
        (_, Some(body)) => call.json(body),
        (_, None) => call,
    })
}

/// Summarises a response the way the thin tool adapter reports it.
pub fn summarize(resp: &Response) -> Value {
    let text: String = resp.text().chars().take(SUMMARY_TEXT_LIMIT).collect();
    let mut out = json!({
        "ok": resp.ok(),
        "status_code": resp.status(),
        "text": text,
    });
    if resp.receipt().is_some() {
        out["receipt_issued"] = json!(true);
    }
    if let Ok(Some(parsed)) = resp.json() {
        out["json"] = parsed;
    }
    out
}

fn failure(message: impl std::fmt::Display) -> Value {
    json!({ "ok": false, "error": message.to_string() })
}

async fn request(session: &mut Session, method: &str, path: &str, body: Option<&str>) -> Value {
    if !session.has_credential() {
        return failure("VAC_ROOT_BISCUIT not set");
    }
    let method: Method = match method.parse() {
        Ok(m) => m,
        Err(e) => return failure(e),
    };
    let body = match body.map(|b| serde_json::from_str::<Value>(b)).transpose() {
        Ok(b) => b,
        Err(e) => return failure(format!("invalid JSON body: {e}")),
    };

    let call = match build_call(method, path, body) {
        Ok(call) => call,
        Err(e) => return failure(e),
    };
    match session.call(call).await {
        Ok(resp) => summarize(&resp),
        Err(e) => failure(e),
    }
}
