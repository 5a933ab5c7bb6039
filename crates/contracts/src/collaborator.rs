//! External collaborator traits
//!
//! Scoring, persistence, fusion and clip storage are consumed as
//! capabilities; their transports live behind these interfaces.

use async_trait::async_trait;

use crate::{
    ClipData, ClipRef, FeaturePayload, MediaMetadata, MovementAnalysisResponse, ReconciledRecord,
    RecordId, ScreenError,
};

/// Scoring collaborator.
///
/// Two submission modes, one canonical response shape. Implementations must
/// guarantee the returned response carries exactly four KPIs.
#[async_trait]
pub trait ScoringApi: Send + Sync {
    /// Submit the canonical feature payload, optionally carrying a coach's
    /// variation override for re-scoring.
    async fn score_features(
        &self,
        payload: &FeaturePayload,
        variation_override: Option<&str>,
    ) -> Result<MovementAnalysisResponse, ScreenError>;

    /// Submit the recorded clip plus identifying metadata.
    async fn score_media(
        &self,
        clip: &ClipData,
        meta: &MediaMetadata,
    ) -> Result<MovementAnalysisResponse, ScreenError>;
}

/// Persistence collaborator for the reconciled assessment.
///
/// Failure is reported without discarding in-memory capture state; the
/// caller may retry without recapturing.
#[async_trait]
pub trait PersistenceApi: Send + Sync {
    async fn save_assessment(&self, record: &ReconciledRecord) -> Result<RecordId, ScreenError>;
}

/// Downstream aggregate-view recomputation.
///
/// Failure here is non-fatal to the capture flow (the record is already
/// saved) but must be surfaced distinctly from a save failure.
#[async_trait]
pub trait FusionApi: Send + Sync {
    async fn refresh_profile(
        &self,
        subject_id: &str,
        record_id: &RecordId,
    ) -> Result<(), ScreenError>;
}

/// Opaque clip blob storage.
#[async_trait]
pub trait ClipStore: Send + Sync {
    async fn store_clip(&self, clip: &ClipData) -> Result<ClipRef, ScreenError>;
}
