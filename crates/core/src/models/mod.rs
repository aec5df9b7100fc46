//! Data model for the fetch pipeline.
//!
//! The shapes here are the ones the route layer serializes directly:
//! [`FundamentalsRecord`] for single-symbol and snapshot payloads,
//! [`JobStatus`] and [`JobProgress`] for the snapshot job side-channel.

mod sectors;

pub use sectors::Sector;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Normalized fundamentals for a single symbol.
///
/// Invariants:
/// - `dividend_yield_percent` is always on the 0-100 percentage scale,
///   never the source API's raw fractional form, and never negative.
/// - `sector_label` is always one of the closed [`Sector`] categories.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundamentalsRecord {
    /// Upper-case ticker symbol.
    pub symbol: String,
    /// Company name as reported by the provider, falling back to the symbol.
    pub display_name: String,
    /// Display sector category.
    pub sector_label: Sector,
    /// Dividend yield as a percentage, `>= 0`.
    pub dividend_yield_percent: f64,
}

/// Lifecycle state of the snapshot job.
///
/// Exactly one logical instance exists process-wide, persisted as a bare
/// string under the job-status cache key. At most one job may be `Running`
/// at a time; the transition into `Running` is guarded by reading the
/// current status first.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Idle,
    Running,
    Failed,
}

impl JobStatus {
    /// The persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Failed => "Failed",
        }
    }

    /// Decode a stored status value.
    ///
    /// An absent entry means the job has never run; an unrecognized value
    /// means a foreign writer touched the key. Both read as `Idle` so a
    /// bad entry can never wedge the trigger guard shut.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            None => Self::Idle,
            Some("Idle") => Self::Idle,
            Some("Running") => Self::Running,
            Some("Failed") => Self::Failed,
            Some(other) => {
                warn!("unrecognized job status {:?} in cache, treating as Idle", other);
                Self::Idle
            }
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checkpointed progress of a snapshot run.
///
/// `completed` counts processed symbols (successes and failures alike) and
/// never exceeds `total`. `estimated_minutes_remaining` is recomputed at
/// every checkpoint from the remaining work and the configured request
/// rate; `started_at` is preserved verbatim across checkpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    pub completed: usize,
    pub total: usize,
    pub started_at: DateTime<Utc>,
    pub estimated_minutes_remaining: u64,
}

/// Normalize a raw dividend-yield field to a percentage.
///
/// The provider reports yield as a fraction (`"0.0455"` meaning 4.55%) but
/// uses the sentinel strings `"None"` and `"-"` for missing data. Sentinels,
/// unparseable input, and non-positive values all normalize to `0.0`;
/// anything else is multiplied by 100.
pub fn parse_yield(raw: Option<&str>) -> f64 {
    let Some(value) = raw else {
        return 0.0;
    };

    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "None" || trimmed == "-" {
        return 0.0;
    }

    match trimmed.parse::<f64>() {
        Ok(fraction) if fraction > 0.0 => fraction * 100.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yield_fraction_becomes_percentage() {
        assert_eq!(parse_yield(Some("0.05")), 5.0);
        assert!((parse_yield(Some("0.0455")) - 4.55).abs() < 1e-9);
    }

    #[test]
    fn test_parse_yield_sentinels_are_zero() {
        assert_eq!(parse_yield(Some("None")), 0.0);
        assert_eq!(parse_yield(Some("-")), 0.0);
        assert_eq!(parse_yield(Some("")), 0.0);
        assert_eq!(parse_yield(None), 0.0);
    }

    #[test]
    fn test_parse_yield_unparseable_is_zero() {
        assert_eq!(parse_yield(Some("abc")), 0.0);
        assert_eq!(parse_yield(Some("1.2.3")), 0.0);
    }

    #[test]
    fn test_parse_yield_never_negative() {
        assert_eq!(parse_yield(Some("-0.03")), 0.0);
        assert_eq!(parse_yield(Some("0")), 0.0);
    }

    #[test]
    fn test_job_status_round_trip() {
        for status in [JobStatus::Idle, JobStatus::Running, JobStatus::Failed] {
            assert_eq!(JobStatus::from_stored(Some(status.as_str())), status);
        }
    }

    #[test]
    fn test_job_status_absent_reads_as_idle() {
        assert_eq!(JobStatus::from_stored(None), JobStatus::Idle);
    }

    #[test]
    fn test_job_status_unknown_reads_as_idle() {
        assert_eq!(JobStatus::from_stored(Some("running")), JobStatus::Idle);
        assert_eq!(JobStatus::from_stored(Some("garbage")), JobStatus::Idle);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = FundamentalsRecord {
            symbol: "IBM".to_string(),
            display_name: "International Business Machines".to_string(),
            sector_label: Sector::Technology,
            dividend_yield_percent: 4.55,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"symbol":"IBM","displayName":"International Business Machines","sectorLabel":"Technology","dividendYieldPercent":4.55}"#
        );

        let back: FundamentalsRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_progress_serializes_camel_case() {
        let progress = JobProgress {
            completed: 50,
            total: 3000,
            started_at: Utc::now(),
            estimated_minutes_remaining: 49,
        };
        let json = serde_json::to_string(&progress).unwrap();
        assert!(json.contains(r#""completed":50"#));
        assert!(json.contains(r#""startedAt""#));
        assert!(json.contains(r#""estimatedMinutesRemaining":49"#));

        let back: JobProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, progress);
    }
}
