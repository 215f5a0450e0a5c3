//! Session behaviour against a scripted in-memory transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use protocol::{
    CallRequest, FailureReason, HeaderList, RawResponse, Receipt, Session, SessionConfig,
    Transport, TransportError, WireRequest,
};
use serde_json::json;

enum Step {
    Reply {
        delay: Duration,
        response: RawResponse,
    },
    Fail,
}

/// Replays scripted outcomes in order and records every request it sees.
struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    seen: Mutex<Vec<WireRequest>>,
}

impl ScriptedTransport {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<WireRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn preserves_repeated_headers(&self) -> bool {
        true
    }

    async fn send(&self, request: &WireRequest) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted");
        match step {
            Step::Reply { delay, response } => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Step::Fail => Err(TransportError::Connect {
                url: request.url.clone(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

fn reply(status: u16, receipt: Option<&str>, body: &str, delay_ms: u64) -> Step {
    let mut headers = HeaderList::new();
    headers.push("content-type", "application/json");
    if let Some(r) = receipt {
        headers.push("x-vac-receipt", r);
    }
    Step::Reply {
        delay: Duration::from_millis(delay_ms),
        response: RawResponse::new(status, headers, body),
    }
}

fn receipt_values(request: &WireRequest) -> Vec<String> {
    request
        .headers
        .get_all("X-VAC-Receipt")
        .map(str::to_string)
        .collect()
}

fn session(transport: Arc<ScriptedTransport>) -> Session {
    Session::new(
        SessionConfig::new("root-biscuit").endpoint("http://sidecar:3000/"),
        transport,
    )
}

#[tokio::test]
async fn test_receipts_follow_call_order_regardless_of_latency() {
    let transport = ScriptedTransport::new(vec![
        reply(200, Some("r-search"), "{}", 40),
        reply(200, Some("r-select"), "{}", 0),
        reply(200, Some("r-charge"), "{}", 15),
    ]);
    let mut s = session(transport.clone());

    s.get("/search").await.unwrap();
    s.post("/select", json!({"flight_id": "AA123"})).await.unwrap();
    s.post("/charge", json!({"amount": 35000})).await.unwrap();

    let receipts: Vec<&str> = s.receipts().iter().map(Receipt::as_str).collect();
    assert_eq!(receipts, vec!["r-search", "r-select", "r-charge"]);

    let seen = transport.seen();
    assert!(receipt_values(&seen[0]).is_empty());
    assert_eq!(receipt_values(&seen[1]), vec!["r-search"]);
    assert_eq!(receipt_values(&seen[2]), vec!["r-search", "r-select"]);
}

#[tokio::test]
async fn test_request_shape() {
    let transport = ScriptedTransport::new(vec![
        reply(200, Some("r1"), "{}", 0),
        reply(200, None, "{}", 0),
    ]);
    let mut s = session(transport.clone());
    let cid = s.correlation_id().as_str().to_string();

    s.call(CallRequest::get("search").query("q", "flights to NYC"))
        .await
        .unwrap();
    s.post("/charge", json!({"amount": 100})).await.unwrap();

    let seen = transport.seen();

    let get = &seen[0];
    assert_eq!(get.url, "http://sidecar:3000/search");
    assert_eq!(
        get.query.get("q").map(String::as_str),
        Some("flights to NYC")
    );
    assert!(get.body.is_none());
    let names: Vec<&str> = get.headers.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["Authorization", "X-Correlation-ID"]);
    assert_eq!(get.headers.get("Authorization"), Some("Bearer root-biscuit"));
    assert_eq!(get.headers.get("X-Correlation-ID"), Some(cid.as_str()));

    let post = &seen[1];
    let pairs: Vec<(&str, &str)> = post.headers.iter().collect();
    assert_eq!(
        pairs,
        vec![
            ("Authorization", "Bearer root-biscuit"),
            ("X-Correlation-ID", cid.as_str()),
            ("Content-Type", "application/json"),
            ("X-VAC-Receipt", "r1"),
        ]
    );
    let body: serde_json::Value = serde_json::from_slice(post.body.as_ref().unwrap()).unwrap();
    assert_eq!(body, json!({"amount": 100}));
}

#[tokio::test]
async fn test_transport_failure_leaves_receipts_untouched() {
    let transport = ScriptedTransport::new(vec![reply(200, Some("r1"), "", 0), Step::Fail]);
    let mut s = session(transport);

    s.get("/search").await.unwrap();
    let err = s.post("/charge", json!({})).await.unwrap_err();

    assert!(matches!(err, TransportError::Connect { .. }));
    assert_eq!(s.receipt_count(), 1);
}

#[tokio::test]
async fn test_policy_denial_is_returned_not_raised() {
    let transport = ScriptedTransport::new(vec![reply(
        403,
        None,
        "policy denied: missing prior_event search",
        0,
    )]);
    let mut s = session(transport);

    let resp = s.post("/charge", json!({"amount": 1})).await.unwrap();

    assert!(!resp.ok());
    assert!(resp.receipt().is_none());
    assert_eq!(s.receipt_count(), 0);

    let err = resp.raise_for_status().unwrap_err();
    assert!(err.is_policy_violation());
    assert!(err.is_missing_receipt());
    assert_eq!(err.reason(), FailureReason::MissingReceipt);
}

#[tokio::test]
async fn test_decode_error_only_from_json() {
    let transport = ScriptedTransport::new(vec![reply(200, None, "<html>", 0)]);
    let mut s = session(transport);

    let resp = s.get("/health").await.unwrap();

    assert!(resp.ok());
    assert!(resp.json().is_err());
}

#[tokio::test]
async fn test_clear_receipts_starts_new_chain() {
    let transport = ScriptedTransport::new(vec![
        reply(200, Some("r1"), "", 0),
        reply(200, None, "", 0),
    ]);
    let mut s = session(transport.clone());

    s.get("/search").await.unwrap();
    let old_cid = s.correlation_id().clone();
    s.clear_receipts();
    s.get("/search").await.unwrap();

    let seen = transport.seen();
    assert!(receipt_values(&seen[1]).is_empty());
    assert_ne!(
        seen[1].headers.get("X-Correlation-ID"),
        Some(old_cid.as_str())
    );
}

#[tokio::test]
async fn test_fork_does_not_carry_receipts() {
    let transport = ScriptedTransport::new(vec![
        reply(200, Some("r1"), "", 0),
        reply(200, None, "", 0),
    ]);
    let mut original = session(transport.clone());
    original.get("/search").await.unwrap();

    let mut forked = original.fork();
    forked.get("/search").await.unwrap();

    let seen = transport.seen();
    assert!(receipt_values(&seen[1]).is_empty());
    assert_eq!(original.receipt_count(), 1);
    assert_eq!(forked.receipt_count(), 0);
    assert_eq!(
        seen[1].headers.get("Authorization"),
        Some("Bearer root-biscuit")
    );
}
