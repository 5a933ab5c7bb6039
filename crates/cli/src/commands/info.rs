//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;

use config_loader::ConfigLoader;
use contracts::{MovementPattern, ScreenBlueprint};

use crate::cli::InfoArgs;

const ALL_PATTERNS: [MovementPattern; 5] = [
    MovementPattern::Squat,
    MovementPattern::Lunge,
    MovementPattern::Hinge,
    MovementPattern::Push,
    MovementPattern::Pull,
];

#[derive(Serialize)]
struct ConfigInfo {
    capture: CaptureInfo,
    scoring_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    patterns: Option<Vec<PatternInfo>>,
}

#[derive(Serialize)]
struct CaptureInfo {
    countdown_secs: u32,
    max_record_secs: u64,
    sampling_rate_hz: f64,
    thumbnail_capacity: usize,
    thumbnail_width: u32,
    thumbnail_decimation: u32,
}

#[derive(Serialize)]
struct PatternInfo {
    pattern: String,
    depth_threshold_deg: f64,
    overridden: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let blueprint = if args.config.exists() {
        ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?
    } else {
        ScreenBlueprint::default()
    };

    let info = build_info(&blueprint, args.patterns);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_info(&info);
    }
    Ok(())
}

fn build_info(blueprint: &ScreenBlueprint, with_patterns: bool) -> ConfigInfo {
    let patterns = with_patterns.then(|| {
        ALL_PATTERNS
            .iter()
            .map(|&pattern| PatternInfo {
                pattern: pattern.to_string(),
                depth_threshold_deg: blueprint.depth_threshold_deg(pattern),
                overridden: blueprint.patterns.iter().any(|p| p.pattern == pattern),
            })
            .collect()
    });

    ConfigInfo {
        capture: CaptureInfo {
            countdown_secs: blueprint.capture.countdown_secs,
            max_record_secs: blueprint.capture.max_record_secs,
            sampling_rate_hz: blueprint.capture.sampling_rate_hz,
            thumbnail_capacity: blueprint.capture.thumbnails.max_frames,
            thumbnail_width: blueprint.capture.thumbnails.target_width,
            thumbnail_decimation: blueprint.capture.thumbnails.decimation,
        },
        scoring_endpoint: blueprint.scoring.endpoint.clone(),
        patterns,
    }
}

fn print_info(info: &ConfigInfo) {
    println!("Capture:");
    println!("  countdown:        {}s", info.capture.countdown_secs);
    println!("  record ceiling:   {}s", info.capture.max_record_secs);
    println!("  sampling rate:    {} Hz", info.capture.sampling_rate_hz);
    println!(
        "  thumbnails:       {} frames @ {}px, every {} ticks",
        info.capture.thumbnail_capacity,
        info.capture.thumbnail_width,
        info.capture.thumbnail_decimation
    );
    println!(
        "Scoring: {}",
        info.scoring_endpoint.as_deref().unwrap_or("in-process mock")
    );

    if let Some(patterns) = &info.patterns {
        println!("Depth thresholds:");
        for p in patterns {
            let marker = if p.overridden { " (override)" } else { "" };
            println!(
                "  {:<8} {:>5.0} degrees{marker}",
                p.pattern, p.depth_threshold_deg
            );
        }
    }
}
