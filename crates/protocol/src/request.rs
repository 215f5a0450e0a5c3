//! Request construction.
//!
//! Turns a caller's [`CallRequest`] plus the session state into a
//! [`WireRequest`]: absolute URL, encoded body, and the ordered header list.
//!
//! Headers are an ordered list of `(name, value)` pairs rather than a map
//! because `X-VAC-Receipt` repeats once per accumulated receipt.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{InvalidMethod, TransportError};
use crate::identifiers::{CorrelationId, Credential, Receipt};

/// Header names and fixed values used by the protocol.
pub mod headers {
    /// Bearer credential header.
    pub const AUTHORIZATION: &str = "Authorization";
    /// Workflow correlation header.
    pub const CORRELATION_ID: &str = "X-Correlation-ID";
    /// Content type header.
    pub const CONTENT_TYPE: &str = "Content-Type";
    /// Receipt header; repeated once per receipt on requests.
    pub const RECEIPT: &str = "X-VAC-Receipt";
    /// The only content type this client declares.
    pub const CONTENT_TYPE_JSON: &str = "application/json";
    /// Separator used when receipts are collapsed into one header.
    pub const RECEIPT_SEPARATOR: &str = ", ";
}

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// HTTP methods the client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read; the only method sent without `Content-Type` when bodyless.
    Get,
    /// Create or act.
    Post,
    /// Replace.
    Put,
    /// Partial update.
    Patch,
    /// Remove.
    Delete,
    /// Headers only.
    Head,
    /// Capability discovery.
    Options,
}

impl Method {
    /// Upper-case wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// `GET` is the only method treated as read-only for content-type gating.
    pub fn is_read_only(self) -> bool {
        matches!(self, Method::Get)
    }
}

impl FromStr for Method {
    type Err = InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(InvalidMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Request body: absent, a JSON document, or raw bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    None,
    /// A JSON document, serialised on send.
    Json(Value),
    /// Bytes sent as given.
    Raw(Vec<u8>),
}

impl RequestBody {
    /// Builds a body from the two optional forms a caller may offer.
    ///
    /// When both are given the JSON document wins and the raw bytes are
    /// dropped. A JSON `null` counts as no document.
    pub fn from_parts(json: Option<Value>, raw: Option<Vec<u8>>) -> Self {
        match (json.filter(|v| !v.is_null()), raw) {
            (Some(value), _) => RequestBody::Json(value),
            (None, Some(bytes)) => RequestBody::Raw(bytes),
            (None, None) => RequestBody::None,
        }
    }

    /// Returns `true` unless the body is [`RequestBody::None`].
    pub fn is_present(&self) -> bool {
        !matches!(self, RequestBody::None)
    }

    /// Serialises the body to wire bytes.
    pub fn encode(&self) -> Result<Option<Vec<u8>>, TransportError> {
        match self {
            RequestBody::None => Ok(None),
            RequestBody::Json(value) => Ok(Some(serde_json::to_vec(value)?)),
            RequestBody::Raw(bytes) => Ok(Some(bytes.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// Caller-facing request
// ---------------------------------------------------------------------------

/// One call as described by the caller, before session state is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub method: Method,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub body: RequestBody,
}

impl CallRequest {
    /// Creates a bodyless request without query parameters.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            body: RequestBody::None,
        }
    }

    /// `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// `PUT` request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// `PATCH` request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    /// `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Adds one query parameter. A repeated key keeps the last value.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Replaces the query parameters.
    pub fn with_query(mut self, query: BTreeMap<String, String>) -> Self {
        self.query = query;
        self
    }

    /// Sets a JSON body. `null` clears the body instead of sending `null`.
    pub fn json(mut self, value: Value) -> Self {
        self.body = if value.is_null() {
            RequestBody::None
        } else {
            RequestBody::Json(value)
        };
        self
    }

    /// Sets a raw body, unless a JSON body is already set.
    pub fn raw(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        if !matches!(self.body, RequestBody::Json(_)) {
            self.body = RequestBody::Raw(bytes.into());
        }
        self
    }

    /// Sets the body directly.
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Whether `Content-Type: application/json` is declared for this call.
    ///
    /// True for every non-`GET` method, and for a `GET` that carries a body.
    pub fn includes_content_type(&self) -> bool {
        !self.method.is_read_only() || self.body.is_present()
    }
}

/// Prefixes `/` when the path does not already start with one.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Strips trailing slashes from a base URL.
pub fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim_end_matches('/').to_string()
}

// ---------------------------------------------------------------------------
// Wire request
// ---------------------------------------------------------------------------

/// Ordered `(name, value)` header pairs; names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList(Vec<(String, String)>);

impl HeaderList {
    /// Empty list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a pair, keeping any earlier pair with the same name.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Iterates pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// All values for `name` (case-insensitive), in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First value for `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Number of pairs, counting repeats.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list has no pairs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for HeaderList {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for HeaderList {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Builds the ordered header list for one request.
///
/// Order: `Authorization`, `X-Correlation-ID`, optional `Content-Type`, then
/// one `X-VAC-Receipt` per receipt in accumulation order.
pub fn build_headers(
    credential: &Credential,
    correlation_id: &CorrelationId,
    receipts: &[Receipt],
    include_content_type: bool,
) -> HeaderList {
    let mut list = HeaderList::new();
    list.push(
        headers::AUTHORIZATION,
        format!("Bearer {}", credential.expose()),
    );
    list.push(headers::CORRELATION_ID, correlation_id.as_str());
    if include_content_type {
        list.push(headers::CONTENT_TYPE, headers::CONTENT_TYPE_JSON);
    }
    for receipt in receipts {
        list.push(headers::RECEIPT, receipt.as_str());
    }
    list
}

/// A fully built request, ready for a [`crate::Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    pub method: Method,
    /// Endpoint plus normalised path; the query string is kept separate.
    pub url: String,
    pub query: BTreeMap<String, String>,
    pub headers: HeaderList,
    pub body: Option<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn receipts(values: &[&str]) -> Vec<Receipt> {
        values.iter().filter_map(|v| Receipt::new(*v)).collect()
    }

    #[test]
    fn test_header_order_with_receipts() {
        let cid = CorrelationId::new("cid-1").unwrap();
        let list = build_headers(
            &Credential::new("tok"),
            &cid,
            &receipts(&["r1", "r2", "r3"]),
            true,
        );
        let pairs: Vec<(&str, &str)> = list.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("Authorization", "Bearer tok"),
                ("X-Correlation-ID", "cid-1"),
                ("Content-Type", "application/json"),
                ("X-VAC-Receipt", "r1"),
                ("X-VAC-Receipt", "r2"),
                ("X-VAC-Receipt", "r3"),
            ]
        );
    }

    #[test]
    fn test_headers_without_content_type() {
        let cid = CorrelationId::new("cid").unwrap();
        let list = build_headers(&Credential::new("tok"), &cid, &[], false);
        assert_eq!(list.len(), 2);
        assert!(list.get("content-type").is_none());
    }

    #[test]
    fn test_empty_credential_gives_empty_bearer() {
        let cid = CorrelationId::new("cid").unwrap();
        let list = build_headers(&Credential::default(), &cid, &[], false);
        assert_eq!(list.get("Authorization"), Some("Bearer "));
    }

    #[test]
    fn test_content_type_gating() {
        assert!(!CallRequest::get("/search").includes_content_type());
        assert!(!CallRequest::get("/search").query("q", "x").includes_content_type());
        assert!(CallRequest::get("/search").json(json!({"q": 1})).includes_content_type());
        assert!(CallRequest::get("/search").raw("q=1").includes_content_type());
        assert!(CallRequest::post("/charge").includes_content_type());
        assert!(CallRequest::put("/x").includes_content_type());
        assert!(CallRequest::patch("/x").includes_content_type());
        assert!(CallRequest::delete("/x").includes_content_type());
        assert!(CallRequest::new(Method::Head, "/x").includes_content_type());
        assert!(CallRequest::new(Method::Options, "/x").includes_content_type());
    }

    #[test]
    fn test_header_lookup_outlives_name() {
        let mut list = HeaderList::new();
        list.push("X-VAC-Receipt", "r1");
        list.push("X-VAC-Receipt", "r2");

        let first = {
            let name = String::from("x-vac-receipt");
            list.get(&name)
        };

        assert_eq!(first, Some("r1"));
        assert_eq!(list.get("missing"), None);
    }

    #[test]
    fn test_null_json_means_no_body() {
        let call = CallRequest::post("/charge").json(Value::Null);
        assert_eq!(call.body, RequestBody::None);
        assert_eq!(call.body.encode().unwrap(), None);
        assert_eq!(
            RequestBody::from_parts(Some(Value::Null), Some(b"raw".to_vec())),
            RequestBody::Raw(b"raw".to_vec())
        );
        assert_eq!(RequestBody::from_parts(Some(Value::Null), None), RequestBody::None);
    }

    #[test]
    fn test_json_body_wins_over_raw() {
        let body = RequestBody::from_parts(Some(json!({"a": 1})), Some(b"raw".to_vec()));
        assert_eq!(body, RequestBody::Json(json!({"a": 1})));

        let call = CallRequest::post("/x").json(json!({"a": 1})).raw("raw");
        assert_eq!(call.body, RequestBody::Json(json!({"a": 1})));
    }

    #[test]
    fn test_raw_body_and_absent_body() {
        assert_eq!(
            RequestBody::from_parts(None, Some(b"raw".to_vec())),
            RequestBody::Raw(b"raw".to_vec())
        );
        assert_eq!(RequestBody::from_parts(None, None), RequestBody::None);
        assert_eq!(RequestBody::None.encode().unwrap(), None);
    }

    #[test]
    fn test_json_body_encoding() {
        let bytes = RequestBody::Json(json!({"amount": 100}))
            .encode()
            .unwrap()
            .unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["amount"], 100);
    }

    #[test]
    fn test_path_and_endpoint_normalisation() {
        assert_eq!(normalize_path("search"), "/search");
        assert_eq!(normalize_path("/search"), "/search");
        assert_eq!(normalize_endpoint("http://test:1234/"), "http://test:1234");
        assert_eq!(normalize_endpoint("http://test:1234"), "http://test:1234");
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Patch".parse::<Method>().unwrap(), Method::Patch);
        assert_eq!("HEAD".parse::<Method>().unwrap(), Method::Head);
        assert_eq!("options".parse::<Method>().unwrap(), Method::Options);
        assert!(!Method::Head.is_read_only());
        assert!(!Method::Options.is_read_only());
        assert_eq!(Method::Options.to_string(), "OPTIONS");
        assert_eq!(
            "TRACE".parse::<Method>().unwrap_err(),
            InvalidMethod("TRACE".to_string())
        );
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
