//! Layered error definitions
//!
//! Categorized by source: camera / estimator / scoring / persistence / config

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ScreenError {
    // ===== Camera Errors =====
    /// Permission denied or no device; fatal to the current capture attempt
    #[error("camera unavailable: {message}")]
    CameraUnavailable { message: String },

    /// Clip recorder failure
    #[error("recorder error: {message}")]
    RecorderFailed { message: String },

    // ===== Estimator Errors =====
    /// Pose model failed to initialize; capture may proceed in degraded mode
    #[error("pose model unavailable: {message}")]
    EstimatorUnavailable { message: String },

    /// Per-frame estimation failure
    #[error("pose estimation failed: {message}")]
    EstimationFailed { message: String },

    // ===== Scoring Errors =====
    /// Scoring collaborator returned an unexpected KPI count or structure
    #[error("malformed scoring response: expected 4 KPIs, got {kpi_count}")]
    MalformedResponse { kpi_count: usize },

    /// Network or collaborator error during analysis
    #[error("analysis request failed: {message}")]
    AnalysisRequestFailed { message: String },

    // ===== Persistence Errors =====
    /// Persistence collaborator rejected the record
    #[error("save failed: {message}")]
    SaveFailed { message: String },

    /// Record saved but the downstream aggregate refresh failed
    #[error("saved, but sync failed: {message}")]
    FusionFailed { message: String },

    /// Clip storage handoff failure
    #[error("clip store error: {message}")]
    ClipStoreFailed { message: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ScreenError {
    /// Create camera unavailable error
    pub fn camera_unavailable(message: impl Into<String>) -> Self {
        Self::CameraUnavailable {
            message: message.into(),
        }
    }

    /// Create estimator unavailable error
    pub fn estimator_unavailable(message: impl Into<String>) -> Self {
        Self::EstimatorUnavailable {
            message: message.into(),
        }
    }

    /// Create analysis request error
    pub fn analysis_failed(message: impl Into<String>) -> Self {
        Self::AnalysisRequestFailed {
            message: message.into(),
        }
    }

    /// Create save error
    pub fn save_failed(message: impl Into<String>) -> Self {
        Self::SaveFailed {
            message: message.into(),
        }
    }

    /// Create fusion error
    pub fn fusion_failed(message: impl Into<String>) -> Self {
        Self::FusionFailed {
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the current capture data survives this error and the same
    /// request can be retried without recapturing.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse { .. }
                | Self::AnalysisRequestFailed { .. }
                | Self::SaveFailed { .. }
                | Self::FusionFailed { .. }
                | Self::EstimatorUnavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors_keep_captured_data() {
        assert!(ScreenError::MalformedResponse { kpi_count: 5 }.is_recoverable());
        assert!(ScreenError::analysis_failed("timeout").is_recoverable());
        assert!(ScreenError::save_failed("rejected").is_recoverable());
        assert!(ScreenError::fusion_failed("offline").is_recoverable());
        assert!(!ScreenError::camera_unavailable("denied").is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = ScreenError::MalformedResponse { kpi_count: 3 };
        assert_eq!(
            err.to_string(),
            "malformed scoring response: expected 4 KPIs, got 3"
        );

        let err = ScreenError::fusion_failed("aggregate recomputation unavailable");
        assert!(err.to_string().starts_with("saved, but sync failed"));
    }
}
