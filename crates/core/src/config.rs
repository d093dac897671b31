//! Tunables shared by the calculator and the rollup.

use serde::{Deserialize, Serialize};

/// Core configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Work hours that make up one person-day
    pub hours_per_day: f64,

    /// Float slack allowed when checking that sibling weights stay within 100%
    pub weight_tolerance: f64,

    /// Offset (minutes east of UTC) of the civil time the schedule is written in
    pub utc_offset_minutes: i32,

    /// Prefix for root item codes
    pub code_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hours_per_day: 8.0,
            weight_tolerance: 1e-9,
            utc_offset_minutes: 0,
            code_prefix: "T-".to_string(),
        }
    }
}

impl Config {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Offset as a chrono value, falling back to UTC when out of range.
    pub fn utc_offset(&self) -> chrono::FixedOffset {
        use chrono::Offset;
        chrono::FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| chrono::Utc.fix())
    }

    /// Whether a sibling weight sum stays within 100%.
    pub fn within_full_share(&self, total: f64) -> bool {
        total <= 100.0 + self.weight_tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.hours_per_day, 8.0);
        assert_eq!(config.weight_tolerance, 1e-9);
        assert_eq!(config.code_prefix, "T-");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"utc_offset_minutes": 420}"#).unwrap();
        assert_eq!(config.utc_offset_minutes, 420);
        assert_eq!(config.hours_per_day, 8.0);
        assert_eq!(config.utc_offset().local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn test_full_share_is_not_rounded() {
        let config = Config::default();
        assert!(config.within_full_share(100.0));
        assert!(config.within_full_share(60.0 + 30.0 + 10.0));
        assert!(!config.within_full_share(100.04));
        assert!(!config.within_full_share(100.000_001));
    }
}
