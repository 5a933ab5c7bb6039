//! Session driver - runs one screening session end to end.
//!
//! Wires the mock camera/estimator and the configured scoring collaborator
//! into a capture controller, drives the state machine through
//! capture -> analyze -> save, and collects a report.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use adapters::{
    MemoryClipStore, MemoryFusion, MemoryPersistence, MockCamera, MockCameraConfig,
    MockPoseEstimator, ScriptedMotion,
};
use capture::{CaptureHandle, CaptureSnapshot, CaptureState, Collaborators, SessionSpec};
use contracts::{CameraView, MovementPattern, ScoringApi, ScreenBlueprint};
use scoring::{MockScoringApi, ScoringClient};

/// Seconds per scripted demo repetition.
const DEMO_REP_SECS: f64 = 2.0;

/// Demo depth cycle (degrees); repeats to fill the recording window.
const DEMO_PEAKS: [f64; 4] = [94.0, 82.0, 88.0, 80.0];

/// One session's inputs.
pub struct SessionConfig {
    pub blueprint: ScreenBlueprint,
    pub subject_id: String,
    pub pattern: MovementPattern,
    pub duration: Duration,
    pub save: bool,
}

/// End-of-session report printed by the `run` command.
#[derive(Debug)]
pub struct SessionReport {
    pub samples: usize,
    pub thumbnails: usize,
    pub reps: usize,
    pub kpis: Vec<(String, bool, u8)>,
    pub overall_score: u8,
    pub variation: String,
    pub load_readiness: String,
    pub record_id: Option<String>,
    pub save_warning: Option<String>,
    pub wall_clock: Duration,
}

/// Run one full mock screening session.
pub async fn run_session(config: SessionConfig) -> Result<SessionReport> {
    let started = Instant::now();
    let settings = config.blueprint.capture_settings();

    // Scripted subject: enough demo reps to fill the recording window
    let rep_count = ((config.duration.as_secs_f64() / DEMO_REP_SECS).ceil() as usize).max(1);
    let peaks: Vec<f64> = DEMO_PEAKS.iter().cycle().take(rep_count).copied().collect();
    let motion = ScriptedMotion::new(DEMO_REP_SECS, peaks);

    let camera = Arc::new(MockCamera::new(MockCameraConfig {
        frequency_hz: settings.sampling_rate_hz,
        ..Default::default()
    }));
    let estimator = Arc::new(MockPoseEstimator::new(motion));

    let scoring: Arc<dyn ScoringApi> = match &config.blueprint.scoring.endpoint {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "using remote scoring collaborator");
            Arc::new(ScoringClient::new(&config.blueprint.scoring)?)
        }
        None => {
            info!("using in-process scoring collaborator");
            Arc::new(MockScoringApi::new())
        }
    };

    let persistence = Arc::new(MemoryPersistence::new());
    let collaborators = Collaborators {
        camera,
        estimator,
        scoring,
        persistence: persistence.clone(),
        fusion: Arc::new(MemoryFusion::new()),
        clip_store: Arc::new(MemoryClipStore::new()),
    };

    let spec = SessionSpec {
        subject_id: config.subject_id.clone(),
        pattern: config.pattern,
        camera_view: CameraView::Front,
    };

    let countdown_wait = settings.countdown_tick * (settings.countdown_ticks + 2)
        + Duration::from_secs(5);
    let handle = CaptureHandle::spawn(settings, spec, collaborators);

    // Capture
    handle.request_capture().await;
    wait(&handle, countdown_wait, CaptureState::Recording, "recording").await?;
    info!(duration_secs = config.duration.as_secs_f64(), "recording window open");
    tokio::time::sleep(config.duration).await;
    handle.stop_capture().await;
    let reviewing = wait(
        &handle,
        Duration::from_secs(10),
        CaptureState::Reviewing,
        "reviewing",
    )
    .await?;
    info!(
        samples = reviewing.sample_count,
        reps = reviewing.rep_count(),
        "capture finalized"
    );

    // Analyze
    handle.analyze().await;
    let reconciling = handle
        .wait_for(Duration::from_secs(30), |snap| {
            snap.state == CaptureState::Reconciling
                || (snap.state == CaptureState::Reviewing && snap.last_error.is_some())
        })
        .await
        .context("analysis timed out")?;

    if reconciling.state != CaptureState::Reconciling {
        let error = reconciling
            .last_error
            .unwrap_or_else(|| "unknown analysis error".to_string());
        handle.shutdown().await;
        bail!("analysis failed: {error}");
    }

    // Save (optional)
    let final_snapshot = if config.save {
        handle.save().await;
        let saved = handle
            .wait_for(Duration::from_secs(30), |snap| {
                snap.state == CaptureState::Saved || snap.last_error.is_some()
            })
            .await
            .context("save timed out")?;
        if saved.state != CaptureState::Saved {
            warn!(
                error = saved.last_error.as_deref().unwrap_or("unknown"),
                "save failed; captured data retained in controller"
            );
        }
        saved
    } else {
        reconciling
    };

    let report = build_report(&final_snapshot, started.elapsed());
    handle.shutdown().await;
    Ok(report)
}

async fn wait(
    handle: &CaptureHandle,
    timeout: Duration,
    state: CaptureState,
    label: &str,
) -> Result<CaptureSnapshot> {
    let snapshot = handle
        .wait_for(timeout, |snap| {
            snap.state == state || matches!(snap.state, CaptureState::Error(_))
        })
        .await
        .with_context(|| format!("timed out waiting for {label}"))?;

    if let CaptureState::Error(fault) = &snapshot.state {
        bail!(
            "capture failed ({fault:?}): {}",
            snapshot.last_error.as_deref().unwrap_or_default()
        );
    }
    Ok(snapshot)
}

fn build_report(snapshot: &CaptureSnapshot, wall_clock: Duration) -> SessionReport {
    let (kpis, overall_score, variation, load_readiness) = match &snapshot.reconciliation {
        Some(reconciliation) => {
            let response = reconciliation.response();
            (
                response
                    .kpis
                    .iter()
                    .map(|kpi| (kpi.key.clone(), *kpi.pass.effective(), kpi.score))
                    .collect(),
                response.overall_score,
                reconciliation.effective_variation().to_string(),
                format!("{:?}", response.load_readiness),
            )
        }
        None => (Vec::new(), 0, String::new(), String::new()),
    };

    SessionReport {
        samples: snapshot.sample_count,
        thumbnails: snapshot.thumbnail_count,
        reps: snapshot.rep_count(),
        kpis,
        overall_score,
        variation,
        load_readiness,
        record_id: snapshot.record_id.as_ref().map(|id| id.to_string()),
        save_warning: snapshot.save_warning.clone(),
        wall_clock,
    }
}
