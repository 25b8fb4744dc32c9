use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RecognizerError, Result};

// ─── Thresholds ──────────────────────────────────────────────────────────────

/// Empirically tuned shape thresholds, in skeleton-space meters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampThresholds {
    pub min_knee_depth_change: f64,
    pub min_foot_height_change: f64,
    pub max_foot_depth_change: f64,
}

impl Default for StampThresholds {
    fn default() -> Self {
        Self {
            min_knee_depth_change: 0.1,
            min_foot_height_change: 0.15,
            max_foot_depth_change: 0.15,
        }
    }
}

// ─── Recognizer configuration ────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// How far back each joint track reaches
    pub retention_ms: i64,
    pub thresholds: StampThresholds,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            retention_ms: 1000,
            thresholds: StampThresholds::default(),
        }
    }
}

impl RecognizerConfig {
    /// Load overrides from a JSON file; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: RecognizerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Retention must be positive; a window that spans no time can never
    /// hold samples on both sides of a pivot. Thresholds are magnitudes.
    pub fn validate(&self) -> Result<()> {
        if self.retention_ms <= 0 {
            return Err(RecognizerError::InvalidConfig(format!(
                "retention_ms must be positive, got {}",
                self.retention_ms
            )));
        }
        let t = &self.thresholds;
        for (name, value) in [
            ("min_knee_depth_change", t.min_knee_depth_change),
            ("min_foot_height_change", t.min_foot_height_change),
            ("max_foot_depth_change", t.max_foot_depth_change),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RecognizerError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_defaults() {
        let config = RecognizerConfig::default();
        assert_eq!(config.retention_ms, 1000);
        assert_eq!(config.thresholds.min_knee_depth_change, 0.1);
        assert_eq!(config.thresholds.min_foot_height_change, 0.15);
        assert_eq!(config.thresholds.max_foot_depth_change, 0.15);
    }

    #[test]
    fn test_partial_override() {
        let config: RecognizerConfig =
            serde_json::from_str(r#"{"thresholds": {"min_knee_depth_change": 0.2}}"#).unwrap();
        assert_eq!(config.retention_ms, 1000);
        assert_eq!(config.thresholds.min_knee_depth_change, 0.2);
        assert_eq!(config.thresholds.max_foot_depth_change, 0.15);
    }

    #[test]
    fn test_rejects_non_positive_retention() {
        let config = RecognizerConfig {
            retention_ms: 0,
            ..RecognizerConfig::default()
        };
        assert!(matches!(config.validate(), Err(RecognizerError::InvalidConfig(_))));
        assert!(RecognizerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let mut config = RecognizerConfig::default();
        config.thresholds.min_foot_height_change = -0.15;
        assert!(matches!(config.validate(), Err(RecognizerError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_validates() {
        let path = std::env::temp_dir().join(format!("stamp_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"retention_ms": -5}"#).unwrap();
        let result = RecognizerConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(RecognizerError::InvalidConfig(_))));
    }
}
