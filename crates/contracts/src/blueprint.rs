//! ScreenBlueprint - Config Loader output
//!
//! Describes a complete screening setup: capture behavior, per-pattern
//! thresholds, scoring collaborator, downstream endpoints.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::MovementPattern;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete screening configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Capture behavior
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Per-pattern threshold overrides
    #[serde(default)]
    pub patterns: Vec<PatternConfig>,

    /// Scoring collaborator
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Downstream collaborator endpoints
    #[serde(default)]
    pub collaborators: CollaboratorConfig,
}

/// Capture behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Pre-roll countdown length (seconds)
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u32,

    /// Countdown tick duration (milliseconds); 1000 in production, small in tests
    #[serde(default = "default_countdown_tick_ms")]
    pub countdown_tick_ms: u64,

    /// Automatic stop ceiling for a recording (seconds)
    #[serde(default = "default_max_record_secs")]
    pub max_record_secs: u64,

    /// Pose sampling rate (Hz), must be > 0
    #[serde(default = "default_sampling_rate_hz")]
    pub sampling_rate_hz: f64,

    /// Thumbnail sampler settings
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            countdown_secs: default_countdown_secs(),
            countdown_tick_ms: default_countdown_tick_ms(),
            max_record_secs: default_max_record_secs(),
            sampling_rate_hz: default_sampling_rate_hz(),
            thumbnails: ThumbnailConfig::default(),
        }
    }
}

fn default_countdown_secs() -> u32 {
    3
}

fn default_countdown_tick_ms() -> u64 {
    1000
}

fn default_max_record_secs() -> u64 {
    30
}

fn default_sampling_rate_hz() -> f64 {
    10.0
}

/// Thumbnail ring-buffer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Ring buffer capacity
    #[serde(default = "default_max_thumbnails")]
    pub max_frames: usize,

    /// Fixed target width (pixels); height stays proportional
    #[serde(default = "default_thumbnail_width")]
    pub target_width: u32,

    /// Sample every Nth analysis tick during live capture
    #[serde(default = "default_decimation")]
    pub decimation: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_frames: default_max_thumbnails(),
            target_width: default_thumbnail_width(),
            decimation: default_decimation(),
        }
    }
}

fn default_max_thumbnails() -> usize {
    20
}

fn default_thumbnail_width() -> u32 {
    320
}

fn default_decimation() -> u32 {
    6
}

/// Per-pattern threshold override
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    pub pattern: MovementPattern,

    /// Depth (flexion degrees) above which a rep counts as full ROM
    pub depth_threshold_deg: f64,
}

/// Scoring collaborator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Preferred submission mode
    #[serde(default)]
    pub mode: ScoringMode,

    /// Remote endpoint base URL; None selects the in-process mock
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout (seconds)
    #[serde(default = "default_scoring_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_scoring_timeout_secs() -> u64 {
    10
}

/// Preferred submission mode; media mode is forced when no rep features
/// could be derived (degraded capture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    #[default]
    Features,
    Media,
}

/// Downstream collaborator endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    #[serde(default)]
    pub persistence_endpoint: Option<String>,

    #[serde(default)]
    pub fusion_endpoint: Option<String>,

    #[serde(default)]
    pub clip_bucket: Option<String>,
}

/// Runtime settings derived from the blueprint for the capture controller.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub countdown_ticks: u32,
    pub countdown_tick: Duration,
    pub record_ceiling: Duration,
    pub sampling_rate_hz: f64,
    pub thumbnail_capacity: usize,
    pub thumbnail_width: u32,
    pub thumbnail_decimation: u32,
    pub depth_thresholds: HashMap<MovementPattern, f64>,
}

impl ScreenBlueprint {
    /// Depth threshold for a pattern: configured override, else the
    /// pattern's built-in default.
    pub fn depth_threshold_deg(&self, pattern: MovementPattern) -> f64 {
        self.patterns
            .iter()
            .find(|p| p.pattern == pattern)
            .map(|p| p.depth_threshold_deg)
            .unwrap_or_else(|| pattern.default_depth_threshold_deg())
    }

    /// Build the runtime capture settings from blueprint data.
    pub fn capture_settings(&self) -> CaptureSettings {
        let mut depth_thresholds = HashMap::new();
        for pattern in [
            MovementPattern::Squat,
            MovementPattern::Lunge,
            MovementPattern::Hinge,
            MovementPattern::Push,
            MovementPattern::Pull,
        ] {
            depth_thresholds.insert(pattern, self.depth_threshold_deg(pattern));
        }

        CaptureSettings {
            countdown_ticks: self.capture.countdown_secs,
            countdown_tick: Duration::from_millis(self.capture.countdown_tick_ms),
            record_ceiling: Duration::from_secs(self.capture.max_record_secs),
            sampling_rate_hz: self.capture.sampling_rate_hz,
            thumbnail_capacity: self.capture.thumbnails.max_frames,
            thumbnail_width: self.capture.thumbnails.target_width,
            thumbnail_decimation: self.capture.thumbnails.decimation,
            depth_thresholds,
        }
    }
}

impl Default for ScreenBlueprint {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            capture: CaptureConfig::default(),
            patterns: Vec::new(),
            scoring: ScoringConfig::default(),
            collaborators: CollaboratorConfig::default(),
        }
    }
}
