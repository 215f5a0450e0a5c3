//! Response wrapper.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::VacError;
use crate::identifiers::Receipt;
use crate::request::{headers, HeaderList};
use crate::transport::RawResponse;

/// A gateway response.
///
/// Headers are collapsed to one value per lower-cased name (last wins). The
/// receipt, if the gateway issued one, is extracted separately into
/// [`Response::receipt`] and has already been appended to the session by the
/// time the caller sees this value.
///
/// A non-2xx status is not an error at this level; see
/// [`Response::raise_for_status`].
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    headers: BTreeMap<String, String>,
    text: String,
    receipt: Option<Receipt>,
}

impl Response {
    /// Wraps already-collapsed parts. The receipt is looked up in `headers`.
    pub fn new(status: u16, header_map: BTreeMap<String, String>, text: impl Into<String>) -> Self {
        let list: HeaderList = header_map.into_iter().collect();
        let receipt = extract_receipt(&list);
        Self {
            status,
            headers: lower_case_names(list),
            text: text.into(),
            receipt,
        }
    }

    /// Normalises a transport result.
    pub fn from_raw(raw: RawResponse) -> Self {
        let receipt = extract_receipt(&raw.headers);
        Self {
            status: raw.status,
            headers: lower_case_names(raw.headers),
            text: raw.body,
            receipt,
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// `true` iff the status is in `[200, 300)`.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Raw body text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Single-valued header map keyed by lower-case name.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Receipt issued with this response, if any.
    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    /// Parses the body as JSON.
    ///
    /// An empty body yields `Ok(None)`; a non-empty body that is not valid
    /// JSON is a decode error.
    pub fn json(&self) -> Result<Option<Value>, serde_json::Error> {
        self.json_as()
    }

    /// Parses the body into `T`, with the same empty-body rule as [`json`](Self::json).
    pub fn json_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        if self.text.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&self.text).map(Some)
    }

    /// Converts a non-2xx response into a [`VacError`].
    pub fn raise_for_status(&self) -> Result<(), VacError> {
        if self.ok() {
            Ok(())
        } else {
            Err(VacError::new(self.status, self.text.clone()))
        }
    }

    /// Consuming variant of [`raise_for_status`](Self::raise_for_status).
    pub fn error_for_status(self) -> Result<Self, VacError> {
        self.raise_for_status()?;
        Ok(self)
    }
}

/// Finds the `X-VAC-Receipt` header (case-insensitive).
///
/// The gateway sends at most one receipt per response; if several arrive the
/// last one is used, matching the single-value header map. Empty values are
/// ignored.
pub fn extract_receipt(list: &HeaderList) -> Option<Receipt> {
    list.get_all(headers::RECEIPT)
        .last()
        .and_then(|v| Receipt::new(v.trim()))
}

fn lower_case_names(list: HeaderList) -> BTreeMap<String, String> {
    list.into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn raw(status: u16, pairs: &[(&str, &str)], body: &str) -> RawResponse {
        RawResponse::new(
            status,
            pairs
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body,
        )
    }

    #[test]
    fn test_json_empty_body_is_none() {
        let resp = Response::new(200, BTreeMap::new(), "");
        assert_eq!(resp.json().unwrap(), None);
    }

    #[test]
    fn test_json_empty_object() {
        let resp = Response::new(200, BTreeMap::new(), "{}");
        assert_eq!(resp.json().unwrap(), Some(json!({})));
    }

    #[test]
    fn test_json_invalid_body_is_error() {
        let resp = Response::new(200, BTreeMap::new(), "not json");
        assert!(resp.json().is_err());
    }

    #[test]
    fn test_json_as_typed() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Charge {
            status: String,
        }
        let resp = Response::new(200, BTreeMap::new(), r#"{"status":"charged"}"#);
        assert_eq!(
            resp.json_as::<Charge>().unwrap(),
            Some(Charge {
                status: "charged".to_string()
            })
        );
    }

    #[test]
    fn test_ok_range() {
        assert!(Response::new(200, BTreeMap::new(), "").ok());
        assert!(Response::new(299, BTreeMap::new(), "").ok());
        assert!(!Response::new(300, BTreeMap::new(), "").ok());
        assert!(!Response::new(199, BTreeMap::new(), "").ok());
        assert!(!Response::new(403, BTreeMap::new(), "").ok());
    }

    #[test]
    fn test_raise_for_status() {
        assert!(Response::new(204, BTreeMap::new(), "").raise_for_status().is_ok());

        let err = Response::new(403, BTreeMap::new(), "missing prior_event")
            .raise_for_status()
            .unwrap_err();
        assert_eq!(err.status(), 403);
        assert_eq!(err.message(), "missing prior_event");
        assert!(err.is_missing_receipt());
    }

    #[test]
    fn test_receipt_extracted_case_insensitively() {
        let resp = Response::from_raw(raw(200, &[("x-vac-receipt", "rcpt-1")], ""));
        assert_eq!(resp.receipt().map(Receipt::as_str), Some("rcpt-1"));
        assert_eq!(resp.header("X-VAC-Receipt"), Some("rcpt-1"));
    }

    #[test]
    fn test_empty_receipt_is_ignored() {
        let resp = Response::from_raw(raw(200, &[("X-VAC-Receipt", "")], ""));
        assert!(resp.receipt().is_none());
    }

    #[test]
    fn test_headers_collapse_last_wins() {
        let resp = Response::from_raw(raw(
            200,
            &[("Set-Cookie", "a=1"), ("set-cookie", "b=2")],
            "",
        ));
        assert_eq!(resp.header("set-cookie"), Some("b=2"));
        assert_eq!(resp.headers().len(), 1);
    }

    #[test]
    fn test_new_extracts_receipt_from_map() {
        let mut headers = BTreeMap::new();
        headers.insert("X-VAC-Receipt".to_string(), "r".to_string());
        let resp = Response::new(200, headers, "");
        assert_eq!(resp.receipt().map(Receipt::as_str), Some("r"));
    }
}
