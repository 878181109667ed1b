//! Engine configuration
//!
//! Thresholds and defaults used by the measurement store and the
//! interaction layer. Configuration can be loaded from a JSON file,
//! environment variables, or created programmatically.

use crate::units::Unit;
use std::fs;
use std::io;
use std::path::Path;

/// Default proximity radius (content px) that closes a shape
pub const CLOSE_THRESHOLD: f64 = 10.0;

/// Configuration for the measurement engine
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Proximity radius in content pixels that closes a shape
    pub close_threshold: f64,
    /// Hit radius in content pixels for grabbing a point handle
    pub handle_radius: f64,
    /// Hit tolerance in content pixels for hovering a shape outline
    pub hover_tolerance: f64,
    /// Pointer travel in screen pixels below which down/up counts as a click
    pub click_slop: f64,
    /// Pixels per unit for a fresh store
    pub default_pixels_per_unit: f64,
    /// Display unit for a fresh store
    pub default_unit: Unit,
    /// Maximum retained history snapshots (None = unbounded)
    pub max_history: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            close_threshold: CLOSE_THRESHOLD,
            handle_radius: 5.0,
            hover_tolerance: 4.0,
            click_slop: 2.0,
            default_pixels_per_unit: 100.0,
            default_unit: Unit::Cm,
            max_history: None,
        }
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("invalid configuration file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("invalid value for {0}")]
    InvalidValue(String),
}

impl EngineConfig {
    /// Sets the closing threshold in content pixels.
    pub fn with_close_threshold(mut self, threshold: f64) -> Self {
        self.close_threshold = threshold;
        self
    }

    /// Sets the point-handle hit radius in content pixels.
    pub fn with_handle_radius(mut self, radius: f64) -> Self {
        self.handle_radius = radius;
        self
    }

    /// Sets the click slop in screen pixels.
    pub fn with_click_slop(mut self, slop: f64) -> Self {
        self.click_slop = slop;
        self
    }

    /// Sets the initial scale for fresh stores.
    pub fn with_default_scale(mut self, pixels_per_unit: f64, unit: Unit) -> Self {
        self.default_pixels_per_unit = pixels_per_unit;
        self.default_unit = unit;
        self
    }

    /// Sets the history cap.
    pub fn with_max_history(mut self, max: Option<usize>) -> Self {
        self.max_history = max;
        self
    }

    /// Loads configuration from environment variables on top of defaults.
    ///
    /// Environment variables:
    /// - `TAKEOFF_CLOSE_THRESHOLD`: closing radius in content px (default: 10)
    /// - `TAKEOFF_HANDLE_RADIUS`: handle hit radius in content px (default: 5)
    /// - `TAKEOFF_HOVER_TOLERANCE`: outline hit tolerance in content px (default: 4)
    /// - `TAKEOFF_CLICK_SLOP`: click/drag threshold in screen px (default: 2)
    /// - `TAKEOFF_PIXELS_PER_UNIT`: initial pixels per unit (default: 100)
    /// - `TAKEOFF_UNIT`: initial display unit (default: cm)
    /// - `TAKEOFF_MAX_HISTORY`: history cap, 0 for unbounded
    ///
    /// # Errors
    /// Returns an error if any environment variable contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Applies environment overrides to an existing configuration.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Some(value) = env_f64("TAKEOFF_CLOSE_THRESHOLD")? {
            self.close_threshold = value;
        }
        if let Some(value) = env_f64("TAKEOFF_HANDLE_RADIUS")? {
            self.handle_radius = value;
        }
        if let Some(value) = env_f64("TAKEOFF_HOVER_TOLERANCE")? {
            self.hover_tolerance = value;
        }
        if let Some(value) = env_f64("TAKEOFF_CLICK_SLOP")? {
            self.click_slop = value;
        }
        if let Some(value) = env_f64("TAKEOFF_PIXELS_PER_UNIT")? {
            self.default_pixels_per_unit = value;
        }
        if let Ok(value) = std::env::var("TAKEOFF_UNIT") {
            self.default_unit = value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TAKEOFF_UNIT".to_string()))?;
        }
        if let Ok(value) = std::env::var("TAKEOFF_MAX_HISTORY") {
            let max = value
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidValue("TAKEOFF_MAX_HISTORY".to_string()))?;
            self.max_history = (max > 0).then_some(max);
        }

        self.validate()?;
        Ok(self)
    }

    /// Loads configuration from a JSON file.
    ///
    /// Missing keys fall back to their defaults:
    /// ```json
    /// { "closeThreshold": 12.0, "defaultUnit": "m" }
    /// ```
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// Parses configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("closeThreshold", self.close_threshold),
            ("handleRadius", self.handle_radius),
            ("defaultPixelsPerUnit", self.default_pixels_per_unit),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue(name.to_string()));
            }
        }

        let non_negative = [
            ("hoverTolerance", self.hover_tolerance),
            ("clickSlop", self.click_slop),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue(name.to_string()));
            }
        }
        Ok(())
    }
}

fn env_f64(name: &str) -> Result<Option<f64>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: [&str; 7] = [
        "TAKEOFF_CLOSE_THRESHOLD",
        "TAKEOFF_HANDLE_RADIUS",
        "TAKEOFF_HOVER_TOLERANCE",
        "TAKEOFF_CLICK_SLOP",
        "TAKEOFF_PIXELS_PER_UNIT",
        "TAKEOFF_UNIT",
        "TAKEOFF_MAX_HISTORY",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.close_threshold, 10.0);
        assert_eq!(config.default_pixels_per_unit, 100.0);
        assert_eq!(config.default_unit, Unit::Cm);
        assert_eq!(config.max_history, None);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::default()
            .with_close_threshold(15.0)
            .with_default_scale(10.0, Unit::M)
            .with_max_history(Some(50));
        assert_eq!(config.close_threshold, 15.0);
        assert_eq!(config.default_unit, Unit::M);
        assert_eq!(config.max_history, Some(50));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var("TAKEOFF_CLOSE_THRESHOLD", "12.5");
        std::env::set_var("TAKEOFF_UNIT", "ft");
        std::env::set_var("TAKEOFF_MAX_HISTORY", "0");

        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.close_threshold, 12.5);
        assert_eq!(config.default_unit, Unit::Ft);
        assert_eq!(config.max_history, None);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_value() {
        clear_env();
        std::env::set_var("TAKEOFF_PIXELS_PER_UNIT", "-3");
        let result = EngineConfig::from_env();
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));

        std::env::set_var("TAKEOFF_PIXELS_PER_UNIT", "lots");
        let result = EngineConfig::from_env();
        assert!(matches!(result, Err(ConfigError::InvalidValue(name)) if name == "TAKEOFF_PIXELS_PER_UNIT"));

        clear_env();
    }

    #[test]
    fn test_from_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("takeoff.json");
        fs::write(&path, r#"{ "closeThreshold": 8.0, "defaultUnit": "m" }"#).unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.close_threshold, 8.0);
        assert_eq!(config.default_unit, Unit::M);
        assert_eq!(config.handle_radius, 5.0);
    }

    #[test]
    fn test_from_file_missing() {
        let result = EngineConfig::from_file("/nonexistent/takeoff.json");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_from_json_rejects_zero_threshold() {
        let result = EngineConfig::from_json(r#"{ "closeThreshold": 0 }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }
}
