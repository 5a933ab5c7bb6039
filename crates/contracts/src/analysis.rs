//! MovementAnalysisResponse - Scoring Client output
//!
//! Canonical analysis result: exactly four scored criteria per pattern,
//! plus rep-level findings and the detected movement variation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ClipRef, FeaturePayload, MovementPattern, Override, ScreenError};

/// Every pattern is scored on exactly this many criteria.
pub const KPI_COUNT: usize = 4;

/// One scored criterion with its coach-reconciled verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiResult {
    /// Stable criterion key, e.g. "depth"
    pub key: String,

    /// Automated verdict plus optional coach override
    pub pass: Override<bool>,

    /// 0-3 criterion score
    pub score: u8,

    /// Why the collaborator reached this verdict
    pub rationale: String,

    /// Coaching cues for the subject
    pub cues: Vec<String>,

    /// Easier variation to regress to
    pub regression: Option<String>,

    /// Harder variation to progress to
    pub progression: Option<String>,

    /// Collaborator confidence in [0, 1]
    pub confidence: f64,
}

/// Coarse classification of how much external load the subject can bear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadReadiness {
    NotReady,
    #[default]
    Bodyweight,
    Light,
    Moderate,
    Full,
}

/// Qualitative status of one repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepStatus {
    Ok,
    Warn,
    Fail,
}

impl RepStatus {
    /// Severity rank for tie-breaking (fail > warn > ok).
    pub fn severity(&self) -> u8 {
        match self {
            RepStatus::Ok => 0,
            RepStatus::Warn => 1,
            RepStatus::Fail => 2,
        }
    }
}

/// Rep-level qualitative finding from the scoring collaborator.
///
/// Produced once per analysis run; never mutated, only re-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepInsight {
    /// 1-based rep index as reported by the collaborator
    pub rep_index: u32,

    pub status: RepStatus,

    /// Free-text key finding for this rep
    pub finding: String,

    /// Optional focus cue for the next rep
    pub focus_cue: Option<String>,
}

/// One third of the set (early/middle/late).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepSummarySegment {
    pub label: String,
    pub dominant: RepStatus,
    pub narrative: String,
}

/// Whole-set narrative plus the three segment summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepSummary {
    pub overall: String,
    pub segments: Vec<RepSummarySegment>,
}

/// Canonical scoring result, normalized from either collaborator shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementAnalysisResponse {
    pub pattern: MovementPattern,

    /// Exactly [`KPI_COUNT`] entries; enforced at normalization
    pub kpis: Vec<KpiResult>,

    /// 0-3 overall score
    pub overall_score: u8,

    /// KPI keys ordered by coaching priority
    pub priority: Vec<String>,

    pub notes: Option<String>,

    /// Detected movement variation plus optional coach override
    pub variation: Override<String>,

    pub load_readiness: LoadReadiness,

    pub rep_insights: Option<Vec<RepInsight>>,
    pub rep_summary: Option<RepSummary>,
    pub coach_briefing: Option<String>,
}

impl MovementAnalysisResponse {
    /// Reject any response that does not carry exactly four KPIs.
    pub fn ensure_kpi_count(&self) -> Result<(), ScreenError> {
        if self.kpis.len() != KPI_COUNT {
            return Err(ScreenError::MalformedResponse {
                kpi_count: self.kpis.len(),
            });
        }
        Ok(())
    }

    pub fn kpi(&self, key: &str) -> Option<&KpiResult> {
        self.kpis.iter().find(|k| k.key == key)
    }
}

/// Opaque persistence record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifying metadata submitted alongside a raw clip (media mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub subject_id: String,
    pub pattern: MovementPattern,
    pub camera_view: crate::CameraView,
    pub duration_secs: f64,
}

/// Final assessment handed to the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledRecord {
    pub subject_id: String,
    pub pattern: MovementPattern,
    pub payload: FeaturePayload,

    /// Response with coach overrides applied
    pub response: MovementAnalysisResponse,

    pub clip: Option<ClipRef>,
    pub clip_duration_secs: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}
