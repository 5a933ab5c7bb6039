//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use config_loader::ConfigLoader;
use contracts::{MovementPattern, ScreenBlueprint};

use crate::cli::RunArgs;
use crate::session::{run_session, SessionConfig, SessionReport};

/// Execute the `run` command
pub async fn run_screen(args: &RunArgs) -> Result<()> {
    let mut blueprint = load_blueprint(args)?;

    // Apply CLI overrides
    if let Some(url) = &args.scoring_url {
        info!(endpoint = %url, "Overriding scoring endpoint from CLI");
        blueprint.scoring.endpoint = Some(url.clone());
    }

    let pattern: MovementPattern = args
        .pattern
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    info!(
        pattern = %pattern,
        subject = %args.subject,
        countdown_secs = blueprint.capture.countdown_secs,
        sampling_rate_hz = blueprint.capture.sampling_rate_hz,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint, pattern);
        return Ok(());
    }

    if args.metrics_port > 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!(port = args.metrics_port, "Metrics endpoint available");
    }

    let report = run_session(SessionConfig {
        blueprint,
        subject_id: args.subject.clone(),
        pattern,
        duration: Duration::from_secs_f64(args.duration.max(0.5)),
        save: !args.no_save,
    })
    .await
    .context("screening session failed")?;

    print_report(&pattern, &report);
    Ok(())
}

fn load_blueprint(args: &RunArgs) -> Result<ScreenBlueprint> {
    if args.config.exists() {
        info!(config = %args.config.display(), "Loading configuration");
        ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))
    } else {
        warn!(
            config = %args.config.display(),
            "Configuration file not found, using built-in defaults"
        );
        Ok(ScreenBlueprint::default())
    }
}

fn print_config_summary(blueprint: &ScreenBlueprint, pattern: MovementPattern) {
    println!("Capture:");
    println!("  countdown:       {}s", blueprint.capture.countdown_secs);
    println!("  record ceiling:  {}s", blueprint.capture.max_record_secs);
    println!("  sampling rate:   {} Hz", blueprint.capture.sampling_rate_hz);
    println!(
        "  depth threshold: {:.0} degrees ({pattern})",
        blueprint.depth_threshold_deg(pattern)
    );
    println!(
        "Scoring: {}",
        blueprint
            .scoring
            .endpoint
            .as_deref()
            .unwrap_or("in-process mock")
    );
}

fn print_report(pattern: &MovementPattern, report: &SessionReport) {
    println!();
    println!("=== Screening report ({pattern}) ===");
    println!(
        "captured {} samples, {} thumbnails, {} reps in {:.1}s",
        report.samples,
        report.thumbnails,
        report.reps,
        report.wall_clock.as_secs_f64()
    );
    println!(
        "overall score: {}/3   variation: {}   load readiness: {}",
        report.overall_score, report.variation, report.load_readiness
    );
    for (key, pass, score) in &report.kpis {
        let verdict = if *pass { "pass" } else { "FAIL" };
        println!("  {key:<18} {verdict}  ({score}/3)");
    }
    match &report.record_id {
        Some(id) => println!("saved as record {id}"),
        None => println!("not saved"),
    }
    if let Some(warning) = &report.save_warning {
        println!("warning: {warning}");
    }
}
