//! Resilient HTTP client.
//!
//! Wraps [`reqwest`] with a per-request timeout and the retry loop from
//! [`backoff`], classifying every failure into the pipeline's closed error
//! taxonomy:
//!
//! - timeouts and transport errors are `Network` and retried
//! - HTTP 429 is `RateLimit`; a delta-seconds `Retry-After` header is
//!   honored verbatim as the delay
//! - HTTP 5xx is `Network` and retried
//! - other HTTP 4xx is `Validation` and never retried
//! - a 2xx body that fails to deserialize is `Network`, returned without
//!   further retries

mod backoff;

pub use backoff::{retry_with_backoff, RetryPolicy};

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::errors::FetchError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client with failure classification and retry.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    policy: RetryPolicy,
}

impl ApiClient {
    /// Build a client with the given request timeout and retry policy.
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, policy }
    }

    /// Fetch `url` and deserialize the JSON body.
    ///
    /// The retry loop wraps the HTTP exchange only: a successful response
    /// whose body does not deserialize is not worth re-requesting and fails
    /// immediately.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let body = self.get_text(url).await?;

        serde_json::from_str(&body).map_err(|e| FetchError::Network {
            message: format!("Failed to parse response body: {}", e),
        })
    }

    /// Fetch `url` and return the raw response body, retrying transient
    /// failures per the configured policy.
    pub async fn get_text(&self, url: Url) -> Result<String, FetchError> {
        retry_with_backoff(&self.policy, || self.fetch_once(url.clone())).await
    }

    /// One HTTP exchange, classified.
    async fn fetch_once(&self, url: Url) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Network {
                    message: "Request timed out".to_string(),
                }
            } else {
                FetchError::Network {
                    message: e.to_string(),
                }
            }
        })?;

        if let Some(err) = classify_status(response.status(), retry_after(&response)) {
            return Err(err);
        }

        response.text().await.map_err(|e| FetchError::Network {
            message: e.to_string(),
        })
    }
}

/// Map a response status to the error it represents, or `None` for success.
fn classify_status(status: StatusCode, retry_after: Option<Duration>) -> Option<FetchError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Some(FetchError::RateLimit { retry_after });
    }

    if status.is_server_error() {
        return Some(FetchError::Network {
            message: format!("HTTP {}", status),
        });
    }

    if status.is_client_error() {
        return Some(FetchError::Validation {
            status: Some(status.as_u16()),
            message: format!("HTTP {}", status),
        });
    }

    None
}

fn retry_after(response: &Response) -> Option<Duration> {
    let raw = response.headers().get(RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after(raw)
}

/// Parse a delta-seconds `Retry-After` value.
///
/// The HTTP-date form is not supported; unparseable values fall back to
/// computed backoff.
fn parse_retry_after(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_429_classifies_as_rate_limit_with_server_delay() {
        let err = classify_status(
            StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(2)),
        );
        assert!(matches!(
            err,
            Some(FetchError::RateLimit {
                retry_after: Some(delay)
            }) if delay == Duration::from_secs(2)
        ));
    }

    #[test]
    fn test_429_without_header_classifies_as_rate_limit() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, None);
        assert!(matches!(
            err,
            Some(FetchError::RateLimit { retry_after: None })
        ));
    }

    #[test]
    fn test_5xx_classifies_as_network() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let err = classify_status(status, None);
            assert!(matches!(err, Some(FetchError::Network { .. })), "{}", status);
        }
    }

    #[test]
    fn test_4xx_classifies_as_validation_with_status() {
        let err = classify_status(StatusCode::NOT_FOUND, None);
        match err {
            Some(FetchError::Validation { status, message }) => {
                assert_eq!(status, Some(404));
                assert!(message.contains("404"));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_2xx_classifies_as_success() {
        assert!(classify_status(StatusCode::OK, None).is_none());
        assert!(classify_status(StatusCode::CREATED, None).is_none());
    }

    #[test]
    fn test_parse_retry_after_delta_seconds() {
        assert_eq!(parse_retry_after("2"), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after(" 30 "), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_parse_retry_after_rejects_other_forms() {
        assert_eq!(parse_retry_after("Wed, 21 Oct 2026 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after("abc"), None);
    }
}
