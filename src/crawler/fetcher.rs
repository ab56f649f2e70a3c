//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Classifying failures so workers know which ones are worth retrying

use crate::config::{HttpConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Per-page fetch failure
///
/// These never abort a crawl; the page is recorded as failed and has no children.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}")]
    Connect { url: String },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Returns true if another attempt at the same URL might succeed
    ///
    /// | Condition | Retryable |
    /// |-----------|-----------|
    /// | HTTP 5xx | yes |
    /// | HTTP 429 | yes |
    /// | Timeout | yes |
    /// | Connection failure | yes |
    /// | Other HTTP status | no |
    /// | Content-Type mismatch | no |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Timeout { .. } | Self::Connect { .. } => true,
            Self::ContentMismatch { .. } | Self::Request { .. } => false,
        }
    }
}

/// Retrieves the raw body of a page
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`, returning the response body or why it could not be had
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use site_mapper::config::{HttpConfig, UserAgentConfig};
/// use site_mapper::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    http: &HttpConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(http.request_timeout_secs))
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    html_only: bool,
}

impl HttpFetcher {
    /// Creates a fetcher from HTTP and user agent configuration
    pub fn new(http: &HttpConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(http, user_agent)?,
            html_only: http.html_only,
        })
    }

    /// Wraps an existing client
    pub fn with_client(client: Client, html_only: bool) -> Self {
        Self { client, html_only }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if self.html_only {
            if let Some(content_type) = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
            {
                if !content_type.to_ascii_lowercase().contains("html") {
                    return Err(FetchError::ContentMismatch {
                        url: url.to_string(),
                        content_type: content_type.to_string(),
                    });
                }
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, e))?;

        Ok(body.to_vec())
    }
}

/// Maps a transport error onto the [`FetchError`] taxonomy
fn classify_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
        }
    } else if let Some(status) = e.status().filter(StatusCode::is_server_error) {
        FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&HttpConfig::default(), &UserAgentConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_http_fetcher_new() {
        let fetcher = HttpFetcher::new(&HttpConfig::default(), &UserAgentConfig::default());
        assert!(fetcher.is_ok());
    }

    #[test]
    fn test_retryable_statuses() {
        let status = |status| FetchError::Status {
            url: "https://example.com/".to_string(),
            status,
        };
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(403).is_retryable());
    }

    #[test]
    fn test_retryable_transport_errors() {
        let url = "https://example.com/".to_string();
        assert!(FetchError::Timeout { url: url.clone() }.is_retryable());
        assert!(FetchError::Connect { url: url.clone() }.is_retryable());
        assert!(!FetchError::ContentMismatch {
            url,
            content_type: "image/png".to_string()
        }
        .is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let fetcher = HttpFetcher::new(
            &HttpConfig {
                request_timeout_secs: 2,
                connect_timeout_secs: 1,
                html_only: true,
            },
            &UserAgentConfig::default(),
        )
        .unwrap();

        // Port 9 (discard) on localhost is essentially never listening
        let result = fetcher.fetch("http://127.0.0.1:9/").await;
        assert!(result.is_err());
    }
}
