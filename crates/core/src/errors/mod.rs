//! Error types and retry classification for the fetch pipeline.
//!
//! This module provides:
//! - [`FetchError`]: The closed error taxonomy for all pipeline operations
//! - [`RetryClass`]: Classification for determining retry behavior
//! - [`ErrorBody`]: The structured payload handed to the route layer

mod retry;

pub use retry::RetryClass;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during fetch pipeline operations.
///
/// The taxonomy is deliberately closed: every failure in the pipeline maps
/// to exactly one of these four variants, and callers match exhaustively.
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method, which drives the HTTP client's
/// retry loop.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The external API throttled the request (HTTP 429 or an explicit
    /// throttle note in the payload).
    ///
    /// `retry_after` carries the server-provided delay verbatim when one
    /// was present; otherwise the retry loop computes its own backoff.
    #[error("Rate limited by data source")]
    RateLimit {
        /// Server-requested delay before the next attempt, if provided.
        retry_after: Option<Duration>,
    },

    /// Connectivity failure, timeout, 5xx response, or an unparseable body.
    /// Retried internally with backoff; surfaced only after the retry
    /// budget is exhausted.
    #[error("Network error: {message}")]
    Network {
        /// Description of the underlying failure.
        message: String,
    },

    /// Bad input, bad symbol, or a non-429 4xx response.
    /// This is a terminal error - retrying won't help.
    #[error("Validation error: {message}")]
    Validation {
        /// The HTTP status code, when the error came from a response.
        status: Option<u16>,
        /// Description of what was rejected.
        message: String,
    },

    /// The shared cache store is unreachable.
    /// Always propagated, never swallowed - callers decide fallback.
    #[error("Cache unavailable: {message}")]
    Unavailable {
        /// Description of the store failure.
        message: String,
    },
}

impl FetchError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::Never`]: Don't retry, the error is terminal
    /// - [`RetryClass::WithBackoff`]: Retry with exponential backoff
    /// - [`RetryClass::AfterDelay`]: Retry after the server-provided delay
    ///
    /// # Examples
    ///
    /// ```
    /// use yieldmap_core::errors::{FetchError, RetryClass};
    ///
    /// let error = FetchError::Network { message: "HTTP 503".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = FetchError::Validation { status: Some(404), message: "HTTP 404".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Transient - retry with the server delay when one was given
            Self::RateLimit {
                retry_after: Some(delay),
            } => RetryClass::AfterDelay(*delay),
            Self::RateLimit { retry_after: None } => RetryClass::WithBackoff,

            // Transient - retry with backoff
            Self::Network { .. } => RetryClass::WithBackoff,

            // Terminal - never retry
            Self::Validation { .. } | Self::Unavailable { .. } => RetryClass::Never,
        }
    }

    /// Returns the wire-level tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::Network { .. } => ErrorKind::Network,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
        }
    }
}

/// Wire-level tag for the four error variants.
///
/// Serialized in SCREAMING_SNAKE_CASE, e.g. `"RATE_LIMIT"`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    RateLimit,
    Network,
    Validation,
    Unavailable,
}

/// Structured error payload for the route layer.
///
/// The boundary never exposes raw internal error objects; it serializes
/// this `{error, message}` pair instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The error tag.
    pub error: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl From<&FetchError> for ErrorBody {
    fn from(err: &FetchError) -> Self {
        Self {
            error: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_never_retries() {
        let error = FetchError::Validation {
            status: Some(400),
            message: "HTTP 400 Bad Request".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_unavailable_never_retries() {
        let error = FetchError::Unavailable {
            message: "connection refused".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_network_retries_with_backoff() {
        let error = FetchError::Network {
            message: "HTTP 503".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_rate_limit_without_delay_retries_with_backoff() {
        let error = FetchError::RateLimit { retry_after: None };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_rate_limit_with_delay_retries_after_delay() {
        let error = FetchError::RateLimit {
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(
            error.retry_class(),
            RetryClass::AfterDelay(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_kind_mapping_is_exhaustive() {
        let cases = [
            (
                FetchError::RateLimit { retry_after: None },
                ErrorKind::RateLimit,
            ),
            (
                FetchError::Network {
                    message: String::new(),
                },
                ErrorKind::Network,
            ),
            (
                FetchError::Validation {
                    status: None,
                    message: String::new(),
                },
                ErrorKind::Validation,
            ),
            (
                FetchError::Unavailable {
                    message: String::new(),
                },
                ErrorKind::Unavailable,
            ),
        ];
        for (error, kind) in cases {
            assert_eq!(error.kind(), kind);
        }
    }

    #[test]
    fn test_error_body_serialization() {
        let error = FetchError::RateLimit { retry_after: None };
        let body = ErrorBody::from(&error);
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            json,
            r#"{"error":"RATE_LIMIT","message":"Rate limited by data source"}"#
        );
    }

    #[test]
    fn test_error_display() {
        let error = FetchError::Network {
            message: "request timed out".to_string(),
        };
        assert_eq!(format!("{}", error), "Network error: request timed out");

        let error = FetchError::Validation {
            status: Some(404),
            message: "HTTP 404 Not Found".to_string(),
        };
        assert_eq!(format!("{}", error), "Validation error: HTTP 404 Not Found");

        let error = FetchError::Unavailable {
            message: "connection refused".to_string(),
        };
        assert_eq!(format!("{}", error), "Cache unavailable: connection refused");
    }
}
