//! Configuration parsing.
//!
//! Supports TOML (primary) and JSON (optional) formats.

use contracts::{ScreenBlueprint, ScreenError};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<ScreenBlueprint, ScreenError> {
    toml::from_str(content).map_err(|e| ScreenError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<ScreenBlueprint, ScreenError> {
    serde_json::from_str(content).map_err(|e| ScreenError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration content in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<ScreenBlueprint, ScreenError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[capture]
countdown_secs = 2
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.capture.countdown_secs, 2);
        // Unspecified fields fall back to defaults
        assert_eq!(bp.capture.max_record_secs, 30);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{"scoring": {"mode": "media", "endpoint": "http://localhost:9100"}}"#;
        let bp = parse_json(content).unwrap();
        assert_eq!(bp.scoring.endpoint.as_deref(), Some("http://localhost:9100"));
    }

    #[test]
    fn test_parse_error_carries_message() {
        let err = parse_toml("capture = 5").unwrap_err();
        assert!(err.to_string().contains("TOML parse error"));
    }
}
