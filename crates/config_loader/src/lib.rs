//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce a `ScreenBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("screen.toml")).unwrap();
//! println!("countdown: {}s", blueprint.capture.countdown_secs);
//! ```

mod parser;
mod validator;

pub use contracts::ScreenBlueprint;
pub use parser::ConfigFormat;

use contracts::ScreenError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ScreenBlueprint, ScreenError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ScreenBlueprint, ScreenError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Serialize a blueprint to TOML
    pub fn to_toml(blueprint: &ScreenBlueprint) -> Result<String, ScreenError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ScreenError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize a blueprint to JSON
    pub fn to_json(blueprint: &ScreenBlueprint) -> Result<String, ScreenError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ScreenError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ScreenError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ScreenError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ScreenError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ScreenError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TOML: &str = r#"
[capture]
countdown_secs = 3
max_record_secs = 30
sampling_rate_hz = 10.0

[[patterns]]
pattern = "squat"
depth_threshold_deg = 90.0

[scoring]
mode = "features"
endpoint = "https://scoring.example.com"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.capture.countdown_secs, 3);
        assert_eq!(bp.patterns.len(), 1);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let bp = ConfigLoader::load_from_str("", ConfigFormat::Toml).unwrap();
        assert_eq!(bp.capture.max_record_secs, 30);
        assert_eq!(bp.capture.thumbnails.max_frames, 20);
        assert!(bp.scoring.endpoint.is_none());
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.capture.countdown_secs, bp2.capture.countdown_secs);
        assert_eq!(bp.patterns.len(), bp2.patterns.len());
        assert_eq!(bp.scoring.endpoint, bp2.scoring.endpoint);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.capture.sampling_rate_hz, bp2.capture.sampling_rate_hz);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        // Duplicate pattern override should fail validation
        let content = r#"
[[patterns]]
pattern = "squat"
depth_threshold_deg = 90.0

[[patterns]]
pattern = "squat"
depth_threshold_deg = 95.0
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }
}
