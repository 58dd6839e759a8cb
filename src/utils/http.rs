// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a URL as text, classifying failures for the retry policy.
pub async fn fetch_text(client: &reqwest::Client, source: &str, url: &str) -> Result<String> {
    log::debug!("[{source}] GET {url}");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_transport(source, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(classify_status(source, status, response.headers()));
    }

    response
        .text()
        .await
        .map_err(|e| classify_transport(source, e))
}

/// Map a non-success HTTP status to an error.
pub fn classify_status(source: &str, status: StatusCode, headers: &HeaderMap) -> AppError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return AppError::RateLimited {
            source_name: source.to_string(),
            retry_after: parse_retry_after(headers),
        };
    }
    if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        return AppError::unavailable(source, format!("HTTP {status}"));
    }
    AppError::refused(source, format!("HTTP {status}"))
}

/// Map a transport error to an error.
pub fn classify_transport(source: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        AppError::unavailable(source, err)
    } else if err.is_decode() || err.is_body() {
        AppError::parse(source, err)
    } else {
        AppError::Http(err)
    }
}

/// Read a `Retry-After` header given in seconds.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
