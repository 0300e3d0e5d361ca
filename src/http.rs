use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;

use crate::error::{ExtractionError, Result};

const DEFAULT_USER_AGENT: &str = concat!("mp3mate/", env!("CARGO_PKG_VERSION"));

/// Upper bound for a buffered API answer
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Build an HTTP client whose every request is bounded by `timeout`
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()?;
    Ok(client)
}

/// Get default headers for JSON APIs
fn get_default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

fn map_send_error(e: reqwest::Error, timeout: Duration) -> ExtractionError {
    if e.is_timeout() {
        ExtractionError::RequestTimeout(timeout)
    } else {
        ExtractionError::NetworkError(e)
    }
}

/// POST a JSON body and return the status with the raw body, whatever the status.
///
/// Callers that understand error payloads use this to inspect non-2xx bodies.
pub async fn post_json<B: Serialize>(
    client: &reqwest::Client,
    url: &str,
    body: &B,
    headers: HeaderMap,
    timeout: Duration,
) -> Result<(StatusCode, Vec<u8>)> {
    let mut request_headers = get_default_headers();
    request_headers.extend(headers);

    let response = client
        .post(url)
        .headers(request_headers)
        .json(body)
        .send()
        .await
        .map_err(|e| map_send_error(e, timeout))?;

    let status = response.status();
    let bytes = read_capped(response, MAX_BODY_BYTES, timeout).await?;
    Ok((status, bytes))
}

/// Buffer a response body, failing once it grows past `limit` bytes
async fn read_capped(
    mut response: reqwest::Response,
    limit: usize,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let too_large = || ExtractionError::InvalidResponse(format!("body exceeds {limit} bytes"));
    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(too_large());
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| map_send_error(e, timeout))?
    {
        if body.len() + chunk.len() > limit {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
