//! The reqwest round trip shared by both strategies.
//!
//! Strategies differ only in the [`HeaderMap`] they hand to [`execute`].

use std::time::Duration;

use protocol::{HeaderList, Method, RawResponse, TransportError, WireRequest};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

pub(crate) fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

/// Parses one header pair into wire types.
pub(crate) fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), TransportError> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| TransportError::InvalidHeader {
            name: name.to_string(),
            message: e.to_string(),
        })?;
    let header_value = HeaderValue::from_str(value).map_err(|e| TransportError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    Ok((header_name, header_value))
}

fn map_error(err: reqwest::Error, url: &str, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else if err.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        TransportError::Other(err.to_string())
    }
}

/// Sends `request` with `headers` and captures status, headers, and body text.
pub(crate) async fn execute(
    client: &Client,
    request: &WireRequest,
    headers: HeaderMap,
    timeout: Duration,
) -> Result<RawResponse, TransportError> {
    let mut builder = client
        .request(to_reqwest_method(request.method), &request.url)
        .headers(headers);

    if !request.query.is_empty() {
        builder = builder.query(&request.query);
    }
    if let Some(body) = &request.body {
        builder = builder.body(body.clone());
    }

    let response = builder
        .send()
        .await
        .map_err(|e| map_error(e, &request.url, timeout))?;

    let status = response.status().as_u16();
    let response_headers: HeaderList = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    // The body is always captured as text; decoding is the caller's choice.
    let body = response
        .text()
        .await
        .map_err(|e| map_error(e, &request.url, timeout))?;

    Ok(RawResponse::new(status, response_headers, body))
}
