//! Configuration validation.
//!
//! Rules:
//! - countdown/record/sampling parameters positive and sane
//! - thumbnail sampler bounds positive
//! - pattern overrides unique, thresholds inside (0, 180)
//! - scoring endpoint present and well-formed when remote scoring is used

use std::collections::HashSet;

use contracts::{ScreenBlueprint, ScreenError};

/// Longest recording ceiling the controller accepts (seconds).
const MAX_RECORD_CEILING_SECS: u64 = 120;

/// Validate a blueprint.
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &ScreenBlueprint) -> Result<(), ScreenError> {
    validate_capture(blueprint)?;
    validate_thumbnails(blueprint)?;
    validate_patterns(blueprint)?;
    validate_scoring(blueprint)?;
    Ok(())
}

fn validate_capture(blueprint: &ScreenBlueprint) -> Result<(), ScreenError> {
    let capture = &blueprint.capture;

    if capture.max_record_secs == 0 {
        return Err(ScreenError::config_validation(
            "capture.max_record_secs",
            "must be > 0",
        ));
    }
    if capture.max_record_secs > MAX_RECORD_CEILING_SECS {
        return Err(ScreenError::config_validation(
            "capture.max_record_secs",
            format!(
                "must be <= {MAX_RECORD_CEILING_SECS}, got {}",
                capture.max_record_secs
            ),
        ));
    }
    if capture.sampling_rate_hz <= 0.0 {
        return Err(ScreenError::config_validation(
            "capture.sampling_rate_hz",
            format!("must be > 0, got {}", capture.sampling_rate_hz),
        ));
    }
    if capture.countdown_tick_ms == 0 {
        return Err(ScreenError::config_validation(
            "capture.countdown_tick_ms",
            "must be > 0",
        ));
    }
    Ok(())
}

fn validate_thumbnails(blueprint: &ScreenBlueprint) -> Result<(), ScreenError> {
    let thumbnails = &blueprint.capture.thumbnails;

    if thumbnails.max_frames == 0 {
        return Err(ScreenError::config_validation(
            "capture.thumbnails.max_frames",
            "must be > 0",
        ));
    }
    if thumbnails.target_width == 0 {
        return Err(ScreenError::config_validation(
            "capture.thumbnails.target_width",
            "must be > 0",
        ));
    }
    if thumbnails.decimation == 0 {
        return Err(ScreenError::config_validation(
            "capture.thumbnails.decimation",
            "must be > 0",
        ));
    }
    Ok(())
}

fn validate_patterns(blueprint: &ScreenBlueprint) -> Result<(), ScreenError> {
    let mut seen = HashSet::new();
    for (idx, config) in blueprint.patterns.iter().enumerate() {
        if !seen.insert(config.pattern) {
            return Err(ScreenError::config_validation(
                format!("patterns[{idx}]"),
                format!("duplicate override for pattern '{}'", config.pattern),
            ));
        }
        if config.depth_threshold_deg <= 0.0 || config.depth_threshold_deg >= 180.0 {
            return Err(ScreenError::config_validation(
                format!("patterns[{idx}].depth_threshold_deg"),
                format!(
                    "must be inside (0, 180), got {}",
                    config.depth_threshold_deg
                ),
            ));
        }
    }
    Ok(())
}

fn validate_scoring(blueprint: &ScreenBlueprint) -> Result<(), ScreenError> {
    let scoring = &blueprint.scoring;

    if scoring.timeout_secs == 0 {
        return Err(ScreenError::config_validation(
            "scoring.timeout_secs",
            "must be > 0",
        ));
    }

    if let Some(endpoint) = &scoring.endpoint {
        if endpoint.is_empty() {
            return Err(ScreenError::config_validation(
                "scoring.endpoint",
                "endpoint cannot be empty",
            ));
        }
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ScreenError::config_validation(
                "scoring.endpoint",
                format!("expected an http(s) URL, got '{endpoint}'"),
            ));
        }
    }

    Ok(())
}
