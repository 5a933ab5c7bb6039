//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::ConfigLoader;
use contracts::ScreenBlueprint;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    countdown_secs: u32,
    max_record_secs: u64,
    sampling_rate_hz: f64,
    pattern_overrides: usize,
    scoring_endpoint: Option<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some("configuration file not found".to_string()),
            summary: None,
        };
    }

    match ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            summary: Some(summarize(&blueprint)),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            summary: None,
        },
    }
}

fn summarize(blueprint: &ScreenBlueprint) -> ConfigSummary {
    ConfigSummary {
        countdown_secs: blueprint.capture.countdown_secs,
        max_record_secs: blueprint.capture.max_record_secs,
        sampling_rate_hz: blueprint.capture.sampling_rate_hz,
        pattern_overrides: blueprint.patterns.len(),
        scoring_endpoint: blueprint.scoring.endpoint.clone(),
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("OK: {}", result.config_path);
        if let Some(summary) = &result.summary {
            println!(
                "  countdown {}s, ceiling {}s, sampling {} Hz, {} pattern override(s)",
                summary.countdown_secs,
                summary.max_record_secs,
                summary.sampling_rate_hz,
                summary.pattern_overrides
            );
            println!(
                "  scoring: {}",
                summary.scoring_endpoint.as_deref().unwrap_or("in-process mock")
            );
        }
    } else {
        println!("INVALID: {}", result.config_path);
        if let Some(error) = &result.error {
            println!("  {error}");
        }
    }
}
