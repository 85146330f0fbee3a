//! Engine configuration
//!
//! Every threshold the detectors use lives here so hosts can tune them
//! without code changes. `Default` carries the production values; a TOML
//! file can override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tunable thresholds for the bill intelligence engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Recurrence detection
    /// Monthly cadence bucket for the mean due-date gap (days, inclusive)
    pub monthly_gap_min: i64,
    pub monthly_gap_max: i64,
    /// Quarterly cadence bucket (days, inclusive)
    pub quarterly_gap_min: i64,
    pub quarterly_gap_max: i64,
    /// Yearly cadence bucket (days, inclusive)
    pub yearly_gap_min: i64,
    pub yearly_gap_max: i64,
    /// Minimum confidence for a bill to count as recurring
    pub recurrence_confidence_floor: f64,
    /// Sample count at which the history factor maxes out
    pub history_cap: usize,
    /// How many recent bills feed the "recent normal" average
    pub recent_window: usize,

    // Deviation / spike thresholds
    /// Relative deviation that trips the gated flag (fraction of recent avg)
    pub deviation_relative: f64,
    /// Absolute deviation floor (currency units), for small bills
    pub deviation_absolute: f64,
    /// Percent change that registers as a display spike
    pub spike_percent: f64,

    // Projection
    /// Percent delta between history halves that counts as a trend
    pub trend_threshold_percent: f64,

    // Duplicate detection
    /// Total score at or above which a candidate is a duplicate
    pub duplicate_threshold: f64,
    pub duplicate_provider_weight: f64,
    pub duplicate_amount_exact_weight: f64,
    pub duplicate_amount_close_weight: f64,
    pub duplicate_date_exact_weight: f64,
    pub duplicate_date_near_weight: f64,
    /// Absolute difference treated as an exact amount match
    pub duplicate_amount_tolerance: f64,
    /// Relative difference treated as a close amount match
    pub duplicate_amount_relative: f64,
    /// Day distance treated as a near due-date match
    pub duplicate_date_near_days: i64,

    // Provider matching
    /// Minimum combined score to accept a fuzzy registry match
    pub fuzzy_accept_score: f64,

    // Extraction validation
    /// Amounts above this warn (but are kept)
    pub amount_warn_ceiling: f64,
    /// Amounts below this warn (but are kept)
    pub amount_warn_floor: f64,
    /// Due dates further in the past than this warn (days)
    pub date_past_warn_days: i64,
    /// Due dates further in the future than this warn (days)
    pub date_future_warn_days: i64,

    // Abuse guards
    /// Max extraction actions per key per window
    pub rate_limit_max: u32,
    /// Fixed rate-limit window (milliseconds)
    pub rate_limit_window_ms: i64,
    /// How long a content hash blocks an identical resubmission (milliseconds)
    pub hash_window_ms: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monthly_gap_min: 25,
            monthly_gap_max: 35,
            quarterly_gap_min: 80,
            quarterly_gap_max: 100,
            yearly_gap_min: 350,
            yearly_gap_max: 380,
            recurrence_confidence_floor: 0.5,
            history_cap: 5,                    // 5+ samples = full history factor
            recent_window: 3,                  // trailing-3 average
            deviation_relative: 0.15,          // 15% of recent average
            deviation_absolute: 10.0,          // or $10, whichever is looser
            spike_percent: 20.0,
            trend_threshold_percent: 5.0,
            duplicate_threshold: 0.6,
            duplicate_provider_weight: 0.4,
            duplicate_amount_exact_weight: 0.35,
            duplicate_amount_close_weight: 0.2,
            duplicate_date_exact_weight: 0.25,
            duplicate_date_near_weight: 0.1,
            duplicate_amount_tolerance: 0.01,
            duplicate_amount_relative: 0.02,   // 2% relative difference
            duplicate_date_near_days: 3,
            fuzzy_accept_score: 0.4,
            amount_warn_ceiling: 100_000.0,
            amount_warn_floor: 0.01,
            date_past_warn_days: 365,          // > 1 year back is suspicious
            date_future_warn_days: 730,        // > 2 years out is suspicious
            rate_limit_max: 10,
            rate_limit_window_ms: 24 * 60 * 60 * 1000,
            hash_window_ms: 60 * 60 * 1000,
        }
    }
}

impl EngineConfig {
    /// Load config from a TOML file, with defaults for any omitted field
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that would make the detectors degenerate
    pub fn validate(&self) -> Result<()> {
        let buckets = [
            ("monthly", self.monthly_gap_min, self.monthly_gap_max),
            ("quarterly", self.quarterly_gap_min, self.quarterly_gap_max),
            ("yearly", self.yearly_gap_min, self.yearly_gap_max),
        ];
        for (name, min, max) in buckets {
            if min <= 0 || max < min {
                return Err(Error::Config(format!(
                    "invalid {} gap bucket: {}..{}",
                    name, min, max
                )));
            }
        }
        if self.recent_window == 0 || self.history_cap == 0 {
            return Err(Error::Config(
                "recent_window and history_cap must be at least 1".into(),
            ));
        }
        if self.rate_limit_max == 0 || self.rate_limit_window_ms <= 0 {
            return Err(Error::Config("rate limit window must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_load_partial_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rate_limit_max = 3\nspike_percent = 25.0").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.rate_limit_max, 3);
        assert_eq!(config.spike_percent, 25.0);
        // Untouched fields keep their defaults
        assert_eq!(config.monthly_gap_min, 25);
        assert_eq!(config.duplicate_threshold, 0.6);
    }

    #[test]
    fn test_load_rejects_inverted_bucket() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "monthly_gap_min = 40\nmonthly_gap_max = 30").unwrap();

        assert!(EngineConfig::load(file.path()).is_err());
    }
}
