//! Capture controller worker and its handle.
//!
//! The worker owns all session state and resources and consumes commands
//! sequentially from one channel; timers, the sampling loop and the
//! network round-trips run as background tasks that report back by sending
//! epoch-stamped commands into the same channel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{
    CameraClient, CameraStream, CameraView, CaptureSettings, ClipData, ClipRecorder, ClipStore,
    FeaturePayload, FusionApi, MediaMetadata, MovementPattern, PersistenceApi, PoseEstimator,
    ReconciledRecord, ScoringApi, ScreenError,
};
use kinematics::{extract_sample, FrameSampler, RepAggregator};
use observability::{record_analysis_metrics, record_capture_metrics, record_save_metrics};
use scoring::ReconciliationState;

use crate::command::{CaptureCommand, SaveOutcome};
use crate::reducer::{plan, Action};
use crate::state::{CaptureSnapshot, CaptureState, FaultKind};

const COMMAND_QUEUE_CAPACITY: usize = 256;

/// External collaborators injected into the controller.
#[derive(Clone)]
pub struct Collaborators {
    pub camera: Arc<dyn CameraClient>,
    pub estimator: Arc<dyn PoseEstimator>,
    pub scoring: Arc<dyn ScoringApi>,
    pub persistence: Arc<dyn PersistenceApi>,
    pub fusion: Arc<dyn FusionApi>,
    pub clip_store: Arc<dyn ClipStore>,
}

/// What is being screened in this session.
#[derive(Debug, Clone)]
pub struct SessionSpec {
    pub subject_id: String,
    pub pattern: MovementPattern,
    pub camera_view: CameraView,
}

/// Handle to a running capture controller.
pub struct CaptureHandle {
    tx: mpsc::Sender<CaptureCommand>,
    state_rx: watch::Receiver<CaptureSnapshot>,
    worker: JoinHandle<()>,
}

impl CaptureHandle {
    /// Spawn the controller worker.
    pub fn spawn(
        settings: CaptureSettings,
        spec: SessionSpec,
        collaborators: Collaborators,
    ) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (state_tx, state_rx) = watch::channel(CaptureSnapshot::default());

        let worker = CaptureWorker::new(settings, spec, collaborators, tx.clone(), state_tx, rx);
        let worker = tokio::spawn(worker.run());

        Self {
            tx,
            state_rx,
            worker,
        }
    }

    async fn send(&self, command: CaptureCommand) {
        if self.tx.send(command).await.is_err() {
            warn!("capture worker is gone, command dropped");
        }
    }

    pub async fn request_capture(&self) {
        self.send(CaptureCommand::RequestCapture).await;
    }

    pub async fn stop_capture(&self) {
        self.send(CaptureCommand::StopCapture).await;
    }

    pub async fn analyze(&self) {
        self.send(CaptureCommand::Analyze).await;
    }

    pub async fn save(&self) {
        self.send(CaptureCommand::Save).await;
    }

    pub async fn retake(&self) {
        self.send(CaptureCommand::Retake).await;
    }

    pub async fn set_kpi_editing(&self, key: impl Into<String>, active: bool) {
        self.send(CaptureCommand::SetKpiEditing {
            key: key.into(),
            active,
        })
        .await;
    }

    pub async fn set_kpi_pass(&self, key: impl Into<String>, pass: bool) {
        self.send(CaptureCommand::SetKpiPass {
            key: key.into(),
            pass,
        })
        .await;
    }

    pub async fn set_variation_override(&self, variation: Option<String>) {
        self.send(CaptureCommand::SetVariationOverride { variation })
            .await;
    }

    /// Current published snapshot.
    pub fn snapshot(&self) -> CaptureSnapshot {
        self.state_rx.borrow().clone()
    }

    pub fn state(&self) -> CaptureState {
        self.state_rx.borrow().state.clone()
    }

    /// Wait until the published snapshot satisfies the predicate.
    ///
    /// Returns None on timeout.
    pub async fn wait_for<F>(&self, timeout: Duration, pred: F) -> Option<CaptureSnapshot>
    where
        F: Fn(&CaptureSnapshot) -> bool,
    {
        let mut rx = self.state_rx.clone();
        tokio::time::timeout(timeout, async {
            loop {
                {
                    let snapshot = rx.borrow_and_update();
                    if pred(&snapshot) {
                        return snapshot.clone();
                    }
                }
                if rx.changed().await.is_err() {
                    return rx.borrow().clone();
                }
            }
        })
        .await
        .ok()
    }

    /// Wait until the controller reaches the given state.
    pub async fn wait_for_state(
        &self,
        timeout: Duration,
        state: CaptureState,
    ) -> Option<CaptureSnapshot> {
        self.wait_for(timeout, |snap| snap.state == state).await
    }

    /// Stop the worker and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.tx.send(CaptureCommand::Shutdown).await;
        if let Err(e) = self.worker.await {
            warn!(error = ?e, "capture worker panicked");
        }
    }
}

/// The controller worker: all session state lives here, mutated only by the
/// sequential command loop.
struct CaptureWorker {
    settings: CaptureSettings,
    spec: SessionSpec,
    collaborators: Collaborators,

    tx: mpsc::Sender<CaptureCommand>,
    rx: mpsc::Receiver<CaptureCommand>,
    state_tx: watch::Sender<CaptureSnapshot>,

    state: CaptureState,
    epoch: u64,
    degraded: bool,

    countdown_remaining: u32,
    countdown_task: Option<JoinHandle<()>>,
    ceiling_task: Option<JoinHandle<()>>,
    sampling_task: Option<JoinHandle<()>>,
    analysis_task: Option<JoinHandle<()>>,
    save_task: Option<JoinHandle<()>>,

    stream: Option<Box<dyn CameraStream>>,
    recorder: Option<Box<dyn ClipRecorder>>,
    recording_started: Option<Instant>,
    analysis_started: Option<Instant>,
    pending_save: bool,

    aggregator: RepAggregator,
    sampler: FrameSampler,
    payload: Option<FeaturePayload>,
    clip: Option<ClipData>,
    reconciliation: Option<ReconciliationState>,

    last_error: Option<String>,
    record_id: Option<contracts::RecordId>,
    save_warning: Option<String>,
}

impl CaptureWorker {
    fn new(
        settings: CaptureSettings,
        spec: SessionSpec,
        collaborators: Collaborators,
        tx: mpsc::Sender<CaptureCommand>,
        state_tx: watch::Sender<CaptureSnapshot>,
        rx: mpsc::Receiver<CaptureCommand>,
    ) -> Self {
        let depth_threshold = settings
            .depth_thresholds
            .get(&spec.pattern)
            .copied()
            .unwrap_or_else(|| spec.pattern.default_depth_threshold_deg());

        let aggregator = RepAggregator::new(spec.pattern, depth_threshold);
        let sampler = FrameSampler::new(
            settings.thumbnail_capacity,
            settings.thumbnail_width,
            settings.thumbnail_decimation,
        );

        Self {
            settings,
            spec,
            collaborators,
            tx,
            rx,
            state_tx,
            state: CaptureState::Idle,
            epoch: 0,
            degraded: false,
            countdown_remaining: 0,
            countdown_task: None,
            ceiling_task: None,
            sampling_task: None,
            analysis_task: None,
            save_task: None,
            stream: None,
            recorder: None,
            recording_started: None,
            analysis_started: None,
            pending_save: false,
            aggregator,
            sampler,
            payload: None,
            clip: None,
            reconciliation: None,
            last_error: None,
            record_id: None,
            save_warning: None,
        }
    }

    #[instrument(name = "capture_worker", skip(self), fields(subject = %self.spec.subject_id, pattern = %self.spec.pattern))]
    async fn run(mut self) {
        info!("capture controller started");

        while let Some(command) = self.rx.recv().await {
            // Results from a retaken session are discarded, never applied.
            if let Some(epoch) = command.epoch() {
                if epoch != self.epoch {
                    debug!(command = command.name(), epoch, current = self.epoch, "stale event dropped");
                    continue;
                }
            }

            let action = plan(&self.state, &command);
            if action == Action::Ignore {
                debug!(command = command.name(), state = self.state.name(), "command ignored");
                continue;
            }

            let stop = self.execute(action, command).await;
            self.publish();
            if stop {
                break;
            }
        }

        self.teardown();
        info!("capture controller stopped");
    }

    /// Execute a planned action. Returns true when the worker should stop.
    async fn execute(&mut self, action: Action, command: CaptureCommand) -> bool {
        match action {
            Action::Ignore => {}
            Action::AcquireCamera => self.acquire_camera().await,
            Action::CountdownTick => self.countdown_tick().await,
            Action::IngestSample => {
                if let CaptureCommand::FrameSampled { frame, sample, .. } = command {
                    if let Some(sample) = sample {
                        self.aggregator.push(sample);
                    }
                    self.sampler.observe_tick(&frame);
                }
            }
            Action::FinalizeRecording => self.finalize_recording().await,
            Action::BeginAnalysis => self.begin_analysis(),
            Action::ApplyAnalysis => {
                if let CaptureCommand::AnalysisDone { result, .. } = command {
                    self.apply_analysis(result);
                }
            }
            Action::Reconcile => self.apply_reconcile_edit(command),
            Action::BeginSave => self.begin_save(),
            Action::ApplySave => {
                if let CaptureCommand::SaveDone { result, .. } = command {
                    self.apply_save(result);
                }
            }
            Action::Reset => self.reset(),
            Action::Shutdown => return true,
        }
        false
    }

    /// idle -> countdown: acquire the camera, load the estimator, start the
    /// countdown timer.
    async fn acquire_camera(&mut self) {
        match self.collaborators.camera.acquire().await {
            Ok((stream, recorder)) => {
                self.stream = Some(stream);
                self.recorder = Some(recorder);
            }
            Err(e) => {
                warn!(error = %e, "camera acquisition failed");
                self.last_error = Some(e.to_string());
                self.state = CaptureState::Error(FaultKind::CameraUnavailable);
                return;
            }
        }

        // Estimator failure is non-fatal: capture proceeds clip-only and
        // the scoring collaborator analyzes the recording server-side.
        if let Err(e) = self.collaborators.estimator.load().await {
            warn!(error = %e, "pose estimator unavailable, capture degraded to clip-only");
            self.degraded = true;
            self.last_error = Some(e.to_string());
        }

        self.countdown_remaining = self.settings.countdown_ticks;
        if self.countdown_remaining == 0 {
            self.begin_recording().await;
            return;
        }

        self.state = CaptureState::Countdown(self.countdown_remaining);
        info!(seconds = self.countdown_remaining, "countdown started");

        let tx = self.tx.clone();
        let epoch = self.epoch;
        let tick = self.settings.countdown_tick;
        self.countdown_task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(tick).await;
                if tx.send(CaptureCommand::CountdownTick { epoch }).await.is_err() {
                    break;
                }
            }
        }));
    }

    async fn countdown_tick(&mut self) {
        self.countdown_remaining = self.countdown_remaining.saturating_sub(1);
        if self.countdown_remaining > 0 {
            self.state = CaptureState::Countdown(self.countdown_remaining);
            return;
        }

        abort_task(&mut self.countdown_task);
        self.begin_recording().await;
    }

    /// countdown -> recording: start the recorder, ceiling timer and the
    /// sampling loop.
    async fn begin_recording(&mut self) {
        let Some(stream) = self.stream.take() else {
            warn!("no camera stream at recording start");
            self.state = CaptureState::Error(FaultKind::RecordingFailed);
            self.release_camera();
            return;
        };

        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(e) = recorder.start().await {
                // Keep sampling; only the clip is lost
                warn!(error = %e, "clip recorder failed to start");
            }
        }

        self.state = CaptureState::Recording;
        self.recording_started = Some(Instant::now());
        info!("recording started");

        let tx = self.tx.clone();
        let epoch = self.epoch;
        let ceiling = self.settings.record_ceiling;
        self.ceiling_task = Some(tokio::spawn(async move {
            tokio::time::sleep(ceiling).await;
            let _ = tx.send(CaptureCommand::RecordCeiling { epoch }).await;
        }));

        // The sampling loop: one tick at a time, each tick awaits the
        // estimator before scheduling the next, so ticks never overlap.
        let tx = self.tx.clone();
        let estimator = self.collaborators.estimator.clone();
        let pattern = self.spec.pattern;
        let degraded = self.degraded;
        self.sampling_task = Some(tokio::spawn(async move {
            let mut stream = stream;
            loop {
                let Some(frame) = stream.next_frame().await else {
                    break;
                };

                let sample = if degraded {
                    None
                } else {
                    match estimator.estimate(&frame).await {
                        Ok(Some(set)) => Some(extract_sample(&set, pattern)),
                        Ok(None) => None,
                        Err(e) => {
                            warn!(error = %e, "per-frame estimation failed");
                            None
                        }
                    }
                };

                if tx
                    .send(CaptureCommand::FrameSampled {
                        epoch,
                        frame,
                        sample,
                    })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            let _ = tx.send(CaptureCommand::SamplingEnded { epoch }).await;
        }));
    }

    /// recording -> reviewing: explicit stop, ceiling timer and stream end
    /// all land here; the state guard makes it run exactly once.
    async fn finalize_recording(&mut self) {
        abort_task(&mut self.sampling_task);
        abort_task(&mut self.ceiling_task);

        if let Some(mut recorder) = self.recorder.take() {
            match recorder.finalize().await {
                Ok(clip) => self.clip = clip,
                Err(e) => warn!(error = %e, "clip finalization failed"),
            }
        }
        self.release_camera();

        let elapsed = self
            .recording_started
            .take()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);

        let reps = self.aggregator.finalize(elapsed);
        record_capture_metrics(
            self.aggregator.sample_count(),
            self.sampler.len(),
            reps.len(),
            elapsed,
        );

        info!(
            duration_secs = format!("{elapsed:.2}"),
            samples = self.aggregator.sample_count(),
            thumbnails = self.sampler.len(),
            reps = reps.len(),
            "recording finalized"
        );

        self.payload = if reps.is_empty() {
            None
        } else {
            Some(FeaturePayload::from_reps(
                self.spec.pattern,
                self.spec.subject_id.clone(),
                self.settings.sampling_rate_hz,
                self.spec.camera_view,
                reps,
            ))
        };

        self.state = CaptureState::Reviewing;
    }

    /// reviewing/reconciling -> analyzing: submit features when available,
    /// fall back to the recorded clip, and report back via AnalysisDone.
    fn begin_analysis(&mut self) {
        if self.payload.is_none() && self.clip.is_none() {
            self.last_error = Some("no captured data to analyze".to_string());
            warn!("analysis requested without captured data");
            return;
        }

        self.state = CaptureState::Analyzing;
        self.analysis_started = Some(Instant::now());
        self.last_error = None;

        let scoring = self.collaborators.scoring.clone();
        let payload = self.payload.clone();
        let clip = self.clip.clone();
        let meta = MediaMetadata {
            subject_id: self.spec.subject_id.clone(),
            pattern: self.spec.pattern,
            camera_view: self.spec.camera_view,
            duration_secs: clip.as_ref().map(|c| c.duration_secs).unwrap_or(0.0),
        };
        let variation = self
            .reconciliation
            .as_ref()
            .and_then(|r| r.variation_override().map(str::to_string));

        let tx = self.tx.clone();
        let epoch = self.epoch;
        self.analysis_task = Some(tokio::spawn(async move {
            let result = match payload {
                Some(payload) if payload.is_submittable() => {
                    scoring.score_features(&payload, variation.as_deref()).await
                }
                _ => match clip {
                    Some(clip) => scoring.score_media(&clip, &meta).await,
                    None => Err(ScreenError::analysis_failed("no captured data to submit")),
                },
            };
            // The four-KPI invariant holds regardless of which collaborator
            // or transport produced the response.
            let result = result.and_then(|r| r.ensure_kpi_count().map(|()| r));
            let _ = tx.send(CaptureCommand::AnalysisDone { epoch, result }).await;
        }));
    }

    fn apply_analysis(&mut self, result: Result<contracts::MovementAnalysisResponse, ScreenError>) {
        self.analysis_task = None;
        let latency = self
            .analysis_started
            .take()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);

        match result.and_then(ReconciliationState::new) {
            Ok(reconciliation) => {
                record_analysis_metrics(reconciliation.response(), latency);
                info!(
                    overall = reconciliation.response().overall_score,
                    variation = %reconciliation.effective_variation(),
                    "analysis complete"
                );
                // A re-run replaces all reconciliation state
                self.reconciliation = Some(reconciliation);
                self.last_error = None;
                self.state = CaptureState::Reconciling;
            }
            Err(e) => {
                warn!(error = %e, "analysis failed, captured data preserved");
                self.last_error = Some(e.to_string());
                // Back to where the coach can retry: reconciling when an
                // earlier response exists, reviewing otherwise.
                self.state = if self.reconciliation.is_some() {
                    CaptureState::Reconciling
                } else {
                    CaptureState::Reviewing
                };
            }
        }
    }

    fn apply_reconcile_edit(&mut self, command: CaptureCommand) {
        let Some(reconciliation) = self.reconciliation.as_mut() else {
            warn!("reconciliation edit without an analysis");
            return;
        };

        match command {
            CaptureCommand::SetKpiEditing { key, active } => {
                if !reconciliation.set_editing(&key, active) {
                    warn!(key = %key, "unknown KPI key");
                }
            }
            CaptureCommand::SetKpiPass { key, pass } => {
                if !reconciliation.set_pass(&key, pass) {
                    warn!(key = %key, "KPI verdict not applied (unknown key or override inactive)");
                }
            }
            CaptureCommand::SetVariationOverride { variation } => {
                reconciliation.set_variation_override(variation);
            }
            _ => {}
        }
    }

    /// reconciling -> saved: store the clip, persist the reconciled record,
    /// then trigger the downstream profile refresh.
    fn begin_save(&mut self) {
        if self.pending_save {
            debug!("save already in flight");
            return;
        }
        let Some(reconciliation) = self.reconciliation.as_ref() else {
            warn!("save requested without an analysis");
            return;
        };

        self.pending_save = true;
        self.last_error = None;

        let response = reconciliation.effective_response();
        let payload = self.payload.clone().unwrap_or_else(|| {
            FeaturePayload::from_reps(
                self.spec.pattern,
                self.spec.subject_id.clone(),
                self.settings.sampling_rate_hz,
                self.spec.camera_view,
                Vec::new(),
            )
        });
        let clip = self.clip.clone();
        let spec = self.spec.clone();
        let persistence = self.collaborators.persistence.clone();
        let fusion = self.collaborators.fusion.clone();
        let clip_store = self.collaborators.clip_store.clone();

        let tx = self.tx.clone();
        let epoch = self.epoch;
        self.save_task = Some(tokio::spawn(async move {
            let clip_duration_secs = clip.as_ref().map(|c| c.duration_secs);
            let clip_ref = match clip {
                Some(clip) => match clip_store.store_clip(&clip).await {
                    Ok(reference) => Some(reference),
                    Err(e) => {
                        // The assessment is still worth saving without it
                        warn!(error = %e, "clip upload failed");
                        None
                    }
                },
                None => None,
            };

            let record = ReconciledRecord {
                subject_id: spec.subject_id.clone(),
                pattern: spec.pattern,
                payload,
                response,
                clip: clip_ref,
                clip_duration_secs,
                recorded_at: Utc::now(),
            };

            let result = match persistence.save_assessment(&record).await {
                Ok(record_id) => {
                    let fusion_error = fusion
                        .refresh_profile(&spec.subject_id, &record_id)
                        .await
                        .err()
                        .map(|e| e.to_string());
                    Ok(SaveOutcome {
                        record_id,
                        fusion_error,
                    })
                }
                Err(e) => Err(e),
            };

            let _ = tx.send(CaptureCommand::SaveDone { epoch, result }).await;
        }));
    }

    fn apply_save(&mut self, result: Result<SaveOutcome, ScreenError>) {
        self.pending_save = false;
        self.save_task = None;

        match result {
            Ok(outcome) => {
                record_save_metrics(true, outcome.fusion_error.is_none());
                if let Some(fusion_error) = outcome.fusion_error {
                    // Partial success: the record exists, the aggregate view
                    // lags behind.
                    warn!(error = %fusion_error, "record saved but profile sync failed");
                    self.save_warning = Some(format!("saved, but sync failed: {fusion_error}"));
                }
                info!(record_id = %outcome.record_id, "assessment saved");
                self.record_id = Some(outcome.record_id);
                self.state = CaptureState::Saved;
            }
            Err(e) => {
                record_save_metrics(false, false);
                warn!(error = %e, "save failed, coach may retry without recapturing");
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Any state -> idle: cancel everything, release resources, clear
    /// buffers and invalidate in-flight results.
    fn reset(&mut self) {
        self.epoch += 1;

        abort_task(&mut self.countdown_task);
        abort_task(&mut self.ceiling_task);
        abort_task(&mut self.sampling_task);
        abort_task(&mut self.analysis_task);
        abort_task(&mut self.save_task);

        self.stream = None;
        self.recorder = None;
        self.release_camera();

        self.aggregator.clear();
        self.sampler.clear();
        self.payload = None;
        self.clip = None;
        self.reconciliation = None;
        self.recording_started = None;
        self.analysis_started = None;
        self.pending_save = false;
        self.degraded = false;
        self.countdown_remaining = 0;
        self.last_error = None;
        self.record_id = None;
        self.save_warning = None;

        self.state = CaptureState::Idle;
        info!(epoch = self.epoch, "session reset");
    }

    fn release_camera(&mut self) {
        self.collaborators.camera.release();
    }

    fn teardown(&mut self) {
        abort_task(&mut self.countdown_task);
        abort_task(&mut self.ceiling_task);
        abort_task(&mut self.sampling_task);
        abort_task(&mut self.analysis_task);
        abort_task(&mut self.save_task);
        self.stream = None;
        self.recorder = None;
        self.release_camera();
    }

    fn publish(&self) {
        let snapshot = CaptureSnapshot {
            state: self.state.clone(),
            epoch: self.epoch,
            degraded: self.degraded,
            sample_count: self.aggregator.sample_count(),
            thumbnail_count: self.sampler.len(),
            payload: self.payload.clone(),
            reconciliation: self.reconciliation.clone(),
            last_error: self.last_error.clone(),
            record_id: self.record_id.clone(),
            save_warning: self.save_warning.clone(),
        };
        let _ = self.state_tx.send(snapshot);
    }
}

fn abort_task(slot: &mut Option<JoinHandle<()>>) {
    if let Some(task) = slot.take() {
        task.abort();
    }
}
