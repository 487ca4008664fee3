//! Pipeline configuration. All range checks happen once, at load or
//! construction, so the numeric stages can assume valid parameters.

use crate::error::{Error, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Time windowing parameters
    pub window: WindowConfig,
    /// Subspace detector parameters
    pub detector: DetectorConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Fixed window duration, e.g. "30s", "5min", "1h"
    pub window_size: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Fraction of total variance the principal subspace must capture, in (0, 1]
    pub variance_threshold: f64,
    /// Significance level for the chi-squared threshold, in (0, 1)
    pub alpha: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            detector: DetectorConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_size: "5min".to_string(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            variance_threshold: 0.95,
            alpha: 0.001,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file if present, otherwise return defaults.
    /// A file that exists but fails to parse or validate is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.window.parse_window_size()?;
        self.detector.validate()?;
        Ok(())
    }
}

impl WindowConfig {
    /// Parse the configured window size. Accepted suffixes: `s`/`sec`,
    /// `m`/`min`, `h`/`hour` (e.g. "30s", "5min", "1h").
    pub fn parse_window_size(&self) -> Result<Duration> {
        let raw = self.window_size.trim();
        let split = raw
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| Error::Config(format!("window_size `{raw}` has no unit suffix")))?;
        let (digits, unit) = raw.split_at(split);
        let value: i64 = digits
            .parse()
            .map_err(|_| Error::Config(format!("window_size `{raw}` has no numeric value")))?;
        if value <= 0 {
            return Err(Error::Config(format!(
                "window_size `{raw}` must be positive"
            )));
        }
        match unit.trim() {
            "s" | "sec" | "secs" => Ok(Duration::seconds(value)),
            "m" | "min" | "mins" => Ok(Duration::minutes(value)),
            "h" | "hour" | "hours" => Ok(Duration::hours(value)),
            other => Err(Error::Config(format!(
                "window_size `{raw}` has unknown unit `{other}`"
            ))),
        }
    }
}

impl DetectorConfig {
    pub fn new(variance_threshold: f64, alpha: f64) -> Result<Self> {
        let config = Self {
            variance_threshold,
            alpha,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.variance_threshold.is_finite()
            || self.variance_threshold <= 0.0
            || self.variance_threshold > 1.0
        {
            return Err(Error::Config(format!(
                "variance_threshold {} is outside (0, 1]",
                self.variance_threshold
            )));
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 || self.alpha >= 1.0 {
            return Err(Error::Config(format!(
                "alpha {} is outside (0, 1)",
                self.alpha
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_size_units() {
        let parse = |s: &str| {
            WindowConfig {
                window_size: s.to_string(),
            }
            .parse_window_size()
        };
        assert_eq!(parse("30s").unwrap(), Duration::seconds(30));
        assert_eq!(parse("5min").unwrap(), Duration::minutes(5));
        assert_eq!(parse("1h").unwrap(), Duration::hours(1));
        assert!(parse("0min").is_err());
        assert!(parse("5fortnights").is_err());
        assert!(parse("min").is_err());
    }

    #[test]
    fn detector_config_ranges() {
        assert!(DetectorConfig::new(0.95, 0.001).is_ok());
        assert!(DetectorConfig::new(1.0, 0.5).is_ok());
        assert!(DetectorConfig::new(0.0, 0.001).is_err());
        assert!(DetectorConfig::new(1.1, 0.001).is_err());
        assert!(DetectorConfig::new(0.9, 0.0).is_err());
        assert!(DetectorConfig::new(0.9, 1.0).is_err());
        assert!(DetectorConfig::new(f64::NAN, 0.001).is_err());
    }

    #[test]
    fn load_missing_file_is_default() {
        let c = PipelineConfig::load(std::path::Path::new("nonexistent.json")).unwrap();
        assert_eq!(c.detector.variance_threshold, 0.95);
        assert_eq!(c.detector.alpha, 0.001);
        assert_eq!(c.window.window_size, "5min");
    }
}
