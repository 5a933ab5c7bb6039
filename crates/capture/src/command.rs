//! Capture controller commands.
//!
//! User-facing operations and internal task events share one command type;
//! the worker consumes them sequentially from a single channel. Internal
//! events carry the session epoch they were issued under so results from a
//! cancelled session are discarded instead of applied.

use contracts::{FrameSample, MovementAnalysisResponse, RecordId, ScreenError, VideoFrame};

/// Record identifier plus the (non-fatal) fusion outcome of a save.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub record_id: RecordId,

    /// Present when the record saved but the aggregate refresh failed
    pub fusion_error: Option<String>,
}

/// Everything the capture worker reacts to.
#[derive(Debug)]
pub enum CaptureCommand {
    // ===== Coach/user operations =====
    RequestCapture,
    StopCapture,
    Analyze,
    Save,
    Retake,
    SetKpiEditing { key: String, active: bool },
    SetKpiPass { key: String, pass: bool },
    SetVariationOverride { variation: Option<String> },
    Shutdown,

    // ===== Internal task events (epoch-stamped) =====
    /// Countdown timer fired
    CountdownTick { epoch: u64 },

    /// Sampling loop produced one tick
    FrameSampled {
        epoch: u64,
        frame: VideoFrame,
        sample: Option<FrameSample>,
    },

    /// Camera stream ended on its own
    SamplingEnded { epoch: u64 },

    /// 30-second recording ceiling fired
    RecordCeiling { epoch: u64 },

    /// Scoring round-trip finished
    AnalysisDone {
        epoch: u64,
        result: Result<MovementAnalysisResponse, ScreenError>,
    },

    /// Persistence/fusion round-trip finished
    SaveDone {
        epoch: u64,
        result: Result<SaveOutcome, ScreenError>,
    },
}

impl CaptureCommand {
    /// Epoch stamped on internal events; user operations always apply to
    /// the current session.
    pub fn epoch(&self) -> Option<u64> {
        match self {
            CaptureCommand::CountdownTick { epoch }
            | CaptureCommand::FrameSampled { epoch, .. }
            | CaptureCommand::SamplingEnded { epoch }
            | CaptureCommand::RecordCeiling { epoch }
            | CaptureCommand::AnalysisDone { epoch, .. }
            | CaptureCommand::SaveDone { epoch, .. } => Some(*epoch),
            _ => None,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            CaptureCommand::RequestCapture => "request_capture",
            CaptureCommand::StopCapture => "stop_capture",
            CaptureCommand::Analyze => "analyze",
            CaptureCommand::Save => "save",
            CaptureCommand::Retake => "retake",
            CaptureCommand::SetKpiEditing { .. } => "set_kpi_editing",
            CaptureCommand::SetKpiPass { .. } => "set_kpi_pass",
            CaptureCommand::SetVariationOverride { .. } => "set_variation_override",
            CaptureCommand::Shutdown => "shutdown",
            CaptureCommand::CountdownTick { .. } => "countdown_tick",
            CaptureCommand::FrameSampled { .. } => "frame_sampled",
            CaptureCommand::SamplingEnded { .. } => "sampling_ended",
            CaptureCommand::RecordCeiling { .. } => "record_ceiling",
            CaptureCommand::AnalysisDone { .. } => "analysis_done",
            CaptureCommand::SaveDone { .. } => "save_done",
        }
    }
}
