//! Screening pipeline metric recording.
//!
//! Called at the capture/analysis/save boundaries; everything goes through
//! the `metrics` facade so the Prometheus exporter (when installed) picks
//! it up without further wiring.

use contracts::MovementAnalysisResponse;
use metrics::{counter, gauge, histogram};

/// Record one finalized capture window.
pub fn record_capture_metrics(
    sample_count: usize,
    thumbnail_count: usize,
    rep_count: usize,
    duration_secs: f64,
) {
    counter!("movescreen_captures_total").increment(1);
    histogram!("movescreen_capture_duration_secs").record(duration_secs);
    histogram!("movescreen_capture_samples").record(sample_count as f64);
    gauge!("movescreen_capture_thumbnails").set(thumbnail_count as f64);

    counter!("movescreen_reps_total").increment(rep_count as u64);
    if rep_count == 0 {
        counter!("movescreen_captures_without_reps_total").increment(1);
    }
}

/// Record one completed analysis round-trip.
pub fn record_analysis_metrics(response: &MovementAnalysisResponse, latency_secs: f64) {
    counter!(
        "movescreen_analyses_total",
        "pattern" => response.pattern.as_str()
    )
    .increment(1);
    histogram!("movescreen_analysis_latency_secs").record(latency_secs);
    gauge!("movescreen_overall_score").set(response.overall_score as f64);

    let passed = response
        .kpis
        .iter()
        .filter(|kpi| *kpi.pass.effective())
        .count();
    histogram!("movescreen_kpis_passed").record(passed as f64);
}

/// Record the outcome of a save attempt.
pub fn record_save_metrics(saved: bool, fusion_synced: bool) {
    let status = if !saved {
        "failed"
    } else if fusion_synced {
        "saved"
    } else {
        "saved_sync_failed"
    };
    counter!("movescreen_saves_total", "status" => status).increment(1);
}
