use std::time::Duration;

/// Classification for retry policy.
///
/// Used by the HTTP client's retry loop to decide how to respond to a
/// failed attempt.
///
/// # Behavior Summary
///
/// | Class | Retried? | Delay source |
/// |-------|----------|--------------|
/// | `Never` | No | - |
/// | `WithBackoff` | Yes | computed exponential backoff + jitter |
/// | `AfterDelay` | Yes | delay supplied by the server, honored verbatim |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad input, bad symbol, or a store outage.
    /// The request is fundamentally invalid and retrying won't help.
    Never,

    /// Retry with exponential backoff.
    ///
    /// Used for transient failures: connectivity errors, timeouts, 5xx
    /// responses, and rate limiting without an explicit server delay.
    WithBackoff,

    /// Retry after the exact delay the server asked for.
    ///
    /// Used for HTTP 429 responses carrying a parseable `Retry-After`
    /// header. The delay replaces the computed backoff for that attempt.
    AfterDelay(Duration),
}
