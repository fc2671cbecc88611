//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests bounded by the request timeout
//! - Error classification for transport failures
//!
//! Redirects are never followed. A 3xx response is returned as-is so the
//! status lands in the fetch table.

use crate::config::UserAgentConfig;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Transport-level failure; the fetch table records these as "Error"
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    fn classify(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

/// A response that made it back from the server
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw Content-Type header value (empty when absent)
    pub content_type: String,
    /// Response body; only read for 200 responses
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// The media type: header value before the first `;`, trimmed and lowercased
    pub fn media_type(&self) -> String {
        media_type(&self.content_type)
    }
}

/// Strips parameters from a Content-Type value
///
/// # Example
///
/// ```
/// use shoal::crawler::media_type;
///
/// assert_eq!(media_type("Text/HTML; charset=utf-8"), "text/html");
/// assert_eq!(media_type("application/pdf"), "application/pdf");
/// ```
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Upper bound for a whole request, body included
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use shoal::config::UserAgentConfig;
/// use shoal::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "Shoal".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL once, without retries
///
/// Any HTTP status is a successful fetch from the transport's point of view.
/// Only 200 responses have their body read.
pub async fn fetch_url(client: &Client, url: &str) -> Result<FetchResponse, FetchError> {
    let response = client.get(url).send().await.map_err(FetchError::classify)?;

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if status != StatusCode::OK {
        return Ok(FetchResponse {
            status: status.as_u16(),
            content_type,
            body: Vec::new(),
        });
    }

    let body = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Body(e.to_string())
        }
    })?;

    Ok(FetchResponse {
        status: status.as_u16(),
        content_type,
        body: body.to_vec(),
    })
}
