//! Environment-driven configuration.

use std::time::Duration;

const API_KEY: &str = "ALPHAVANTAGE_API_KEY";
const REQUESTS_PER_MINUTE: &str = "SNAPSHOT_REQUESTS_PER_MINUTE";
const REDIS_URL: &str = "REDIS_URL";
const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
const HTTP_MAX_RETRIES: &str = "HTTP_MAX_RETRIES";

/// Configuration faults, separate from the pipeline error taxonomy: these
/// surface at bootstrap, before any fetch runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingKey(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Credential for the fundamentals data source.
    pub api_key: String,
    /// Request budget for the snapshot job, per minute.
    pub requests_per_minute: u32,
    /// Cache endpoint.
    pub redis_url: String,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Retry budget for transient HTTP failures.
    pub http_max_retries: u32,
}

impl Config {
    /// Read configuration from process environment variables.
    ///
    /// The API credential is required; everything else has a default. A
    /// variable that is set but unparseable is rejected rather than
    /// silently replaced by its default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingKey(API_KEY))?;

        let requests_per_minute: u32 = parse_or(&lookup, REQUESTS_PER_MINUTE, 60)?;
        if requests_per_minute == 0 {
            return Err(ConfigError::Invalid {
                key: REQUESTS_PER_MINUTE,
                value: "0".to_string(),
            });
        }

        let redis_url =
            lookup(REDIS_URL).unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());
        let timeout_secs: u64 = parse_or(&lookup, HTTP_TIMEOUT_SECS, 10)?;
        let http_max_retries: u32 = parse_or(&lookup, HTTP_MAX_RETRIES, 3)?;

        Ok(Self {
            api_key,
            requests_per_minute,
            redis_url,
            http_timeout: Duration::from_secs(timeout_secs),
            http_max_retries,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_environment_uses_defaults() {
        let config = Config::from_lookup(env(&[(API_KEY, "demo")])).unwrap();

        assert_eq!(config.api_key, "demo");
        assert_eq!(config.requests_per_minute, 60);
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.http_max_retries, 3);
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = Config::from_lookup(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(API_KEY)));

        // A blank credential counts as missing.
        let err = Config::from_lookup(env(&[(API_KEY, "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(API_KEY)));
    }

    #[test]
    fn test_invalid_rate_is_rejected() {
        let err = Config::from_lookup(env(&[
            (API_KEY, "demo"),
            (REQUESTS_PER_MINUTE, "abc"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: REQUESTS_PER_MINUTE,
                ..
            }
        ));

        let err = Config::from_lookup(env(&[
            (API_KEY, "demo"),
            (REQUESTS_PER_MINUTE, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: REQUESTS_PER_MINUTE,
                ..
            }
        ));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = Config::from_lookup(env(&[
            (API_KEY, "demo"),
            (REQUESTS_PER_MINUTE, "75"),
            (REDIS_URL, "redis://cache:6379"),
            (HTTP_TIMEOUT_SECS, "30"),
            (HTTP_MAX_RETRIES, "5"),
        ]))
        .unwrap();

        assert_eq!(config.requests_per_minute, 75);
        assert_eq!(config.redis_url, "redis://cache:6379");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.http_max_retries, 5);
    }

    #[test]
    fn test_error_messages_name_the_variable() {
        let missing = ConfigError::MissingKey(API_KEY);
        assert!(missing.to_string().contains("ALPHAVANTAGE_API_KEY"));

        let invalid = ConfigError::Invalid {
            key: HTTP_TIMEOUT_SECS,
            value: "soon".to_string(),
        };
        assert!(invalid.to_string().contains("HTTP_TIMEOUT_SECS"));
        assert!(invalid.to_string().contains("soon"));
    }
}
