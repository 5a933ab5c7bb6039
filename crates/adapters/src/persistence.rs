//! In-memory persistence and fusion collaborators.
//!
//! Store records in process memory and hand back opaque identifiers.
//! Failure injection flags keep the retry paths testable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use contracts::{FusionApi, PersistenceApi, ReconciledRecord, RecordId, ScreenError};
use tracing::{debug, info};
use uuid::Uuid;

/// Persistence collaborator backed by process memory.
#[derive(Default)]
pub struct MemoryPersistence {
    records: Mutex<Vec<(RecordId, ReconciledRecord)>>,
    fail_next: AtomicBool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next save attempt fail (one-shot).
    pub fn fail_next_save(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Saved records, oldest first.
    pub fn records(&self) -> Vec<(RecordId, ReconciledRecord)> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl PersistenceApi for MemoryPersistence {
    async fn save_assessment(&self, record: &ReconciledRecord) -> Result<RecordId, ScreenError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ScreenError::save_failed("storage rejected the record"));
        }

        let id = RecordId(Uuid::new_v4().to_string());
        self.records
            .lock()
            .unwrap()
            .push((id.clone(), record.clone()));

        info!(
            record_id = %id,
            subject_id = %record.subject_id,
            pattern = %record.pattern,
            "assessment saved"
        );
        Ok(id)
    }
}

/// Fusion collaborator backed by process memory.
#[derive(Default)]
pub struct MemoryFusion {
    refreshed: Mutex<Vec<(String, RecordId)>>,
    fail_next: AtomicBool,
}

impl MemoryFusion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next refresh attempt fail (one-shot).
    pub fn fail_next_refresh(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshed.lock().unwrap().len()
    }
}

#[async_trait]
impl FusionApi for MemoryFusion {
    async fn refresh_profile(
        &self,
        subject_id: &str,
        record_id: &RecordId,
    ) -> Result<(), ScreenError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ScreenError::fusion_failed(
                "aggregate recomputation unavailable",
            ));
        }

        self.refreshed
            .lock()
            .unwrap()
            .push((subject_id.to_string(), record_id.clone()));
        debug!(subject_id, record_id = %record_id, "subject profile refreshed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        CameraView, FeaturePayload, LoadReadiness, MovementAnalysisResponse, MovementPattern,
        Override,
    };

    fn make_record() -> ReconciledRecord {
        ReconciledRecord {
            subject_id: "client-1".into(),
            pattern: MovementPattern::Squat,
            payload: FeaturePayload::from_reps(
                MovementPattern::Squat,
                "client-1",
                10.0,
                CameraView::Front,
                vec![],
            ),
            response: MovementAnalysisResponse {
                pattern: MovementPattern::Squat,
                kpis: vec![],
                overall_score: 2,
                priority: vec![],
                notes: None,
                variation: Override::new("bodyweight".into()),
                load_readiness: LoadReadiness::Light,
                rep_insights: None,
                rep_summary: None,
                coach_briefing: None,
            },
            clip: None,
            clip_duration_secs: None,
            recorded_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_returns_unique_ids() {
        let store = MemoryPersistence::new();
        let a = store.save_assessment(&make_record()).await.unwrap();
        let b = store.save_assessment(&make_record()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.record_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_nothing() {
        let store = MemoryPersistence::new();
        store.fail_next_save();

        let err = store.save_assessment(&make_record()).await.unwrap_err();
        assert!(matches!(err, ScreenError::SaveFailed { .. }));
        assert_eq!(store.record_count(), 0);

        // Failure flag is one-shot; retry succeeds
        assert!(store.save_assessment(&make_record()).await.is_ok());
    }

    #[tokio::test]
    async fn test_fusion_refresh_and_failure() {
        let fusion = MemoryFusion::new();
        let id = RecordId("r-1".into());

        fusion.refresh_profile("client-1", &id).await.unwrap();
        assert_eq!(fusion.refresh_count(), 1);

        fusion.fail_next_refresh();
        let err = fusion.refresh_profile("client-1", &id).await.unwrap_err();
        assert!(matches!(err, ScreenError::FusionFailed { .. }));
    }
}
