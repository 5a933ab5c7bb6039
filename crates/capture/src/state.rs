//! Capture controller states and the published snapshot.

use contracts::{FeaturePayload, RecordId};
use scoring::ReconciliationState;

/// Controller state.
///
/// `retake` returns to `Idle` from any post-idle state; `Error` is reachable
/// from countdown, recording and analyzing.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    /// Pre-roll countdown, seconds remaining
    Countdown(u32),
    Recording,
    Reviewing,
    Analyzing,
    Reconciling,
    Saved,
    Error(FaultKind),
}

impl CaptureState {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Countdown(_) => "countdown",
            CaptureState::Recording => "recording",
            CaptureState::Reviewing => "reviewing",
            CaptureState::Analyzing => "analyzing",
            CaptureState::Reconciling => "reconciling",
            CaptureState::Saved => "saved",
            CaptureState::Error(_) => "error",
        }
    }
}

/// Fatal fault that ended the current capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Camera permission denied or device missing; recoverable by retake
    CameraUnavailable,
    /// Camera stream died before any usable data arrived
    RecordingFailed,
}

/// Externally observable controller state, published on every transition.
#[derive(Debug, Clone)]
pub struct CaptureSnapshot {
    pub state: CaptureState,

    /// Session epoch; bumps on every retake
    pub epoch: u64,

    /// Estimator unavailable, capture degraded to clip-only
    pub degraded: bool,

    pub sample_count: usize,
    pub thumbnail_count: usize,

    /// Finalized payload, present from reviewing onwards (when reps exist)
    pub payload: Option<FeaturePayload>,

    /// Editable analysis state, present from reconciling onwards
    pub reconciliation: Option<ReconciliationState>,

    /// Last recoverable error, surfaced without discarding captured data
    pub last_error: Option<String>,

    pub record_id: Option<RecordId>,

    /// Set when the record saved but the downstream sync failed
    pub save_warning: Option<String>,
}

impl Default for CaptureSnapshot {
    fn default() -> Self {
        Self {
            state: CaptureState::Idle,
            epoch: 0,
            degraded: false,
            sample_count: 0,
            thumbnail_count: 0,
            payload: None,
            reconciliation: None,
            last_error: None,
            record_id: None,
            save_warning: None,
        }
    }
}

impl CaptureSnapshot {
    /// Number of reps in the finalized payload.
    pub fn rep_count(&self) -> usize {
        self.payload.as_ref().map(|p| p.reps.len()).unwrap_or(0)
    }
}
