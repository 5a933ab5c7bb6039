//! # Integration Tests
//!
//! End-to-end scenarios across the whole workspace, driven entirely by the
//! mock camera/estimator/collaborators - no devices or network required.

#[cfg(test)]
mod pipeline_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use adapters::{
        MemoryClipStore, MemoryFusion, MemoryPersistence, MockCamera, MockCameraConfig,
        MockPoseEstimator, ScriptedMotion,
    };
    use bytes::Bytes;
    use capture::{CaptureHandle, CaptureState, Collaborators, SessionSpec};
    use contracts::{
        CameraClient, CameraView, CaptureSettings, ClipData, FeaturePayload, MediaMetadata,
        MovementAnalysisResponse, MovementPattern, PixelFormat, PoseEstimator, ScoringApi,
        ScreenError, VideoFrame, KPI_COUNT,
    };
    use kinematics::{extract_sample, RepAggregator};
    use scoring::MockScoringApi;

    const WAIT: Duration = Duration::from_secs(3);

    /// Settings derived from a real config document, sped up for tests.
    fn fast_settings() -> CaptureSettings {
        let blueprint = config_loader::ConfigLoader::load_from_str(
            r#"
[capture]
countdown_secs = 1
countdown_tick_ms = 10
sampling_rate_hz = 100.0
"#,
            config_loader::ConfigFormat::Toml,
        )
        .expect("test blueprint");
        blueprint.capture_settings()
    }

    fn make_frame(timestamp: f64) -> VideoFrame {
        VideoFrame {
            width: 64,
            height: 48,
            format: PixelFormat::Rgb8,
            data: Bytes::from(vec![128u8; 64 * 48 * 3]),
            timestamp,
        }
    }

    struct Harness {
        camera: Arc<MockCamera>,
        persistence: Arc<MemoryPersistence>,
        handle: CaptureHandle,
    }

    fn spawn_harness(motion: ScriptedMotion, scoring: Arc<dyn ScoringApi>) -> Harness {
        let camera = Arc::new(MockCamera::new(MockCameraConfig {
            frequency_hz: 100.0,
            ..Default::default()
        }));
        let persistence = Arc::new(MemoryPersistence::new());

        let handle = CaptureHandle::spawn(
            fast_settings(),
            SessionSpec {
                subject_id: "client-1".to_string(),
                pattern: MovementPattern::Squat,
                camera_view: CameraView::Front,
            },
            Collaborators {
                camera: camera.clone(),
                estimator: Arc::new(MockPoseEstimator::new(motion)),
                scoring,
                persistence: persistence.clone(),
                fusion: Arc::new(MemoryFusion::new()),
                clip_store: Arc::new(MemoryClipStore::new()),
            },
        );

        Harness {
            camera,
            persistence,
            handle,
        }
    }

    /// Scenario A: a four-rep squat set with depths [94, 82, 88, 80] against
    /// the 90-degree threshold. Driven through the real estimator and
    /// aggregator, no wall clock needed.
    #[tokio::test]
    async fn test_four_rep_set_rom_flags() {
        let estimator = MockPoseEstimator::new(ScriptedMotion::new(2.0, vec![
            94.0, 82.0, 88.0, 80.0,
        ]));
        estimator.load().await.unwrap();

        let mut aggregator = RepAggregator::new(
            MovementPattern::Squat,
            MovementPattern::Squat.default_depth_threshold_deg(),
        );

        let mut t = 0.0;
        while t < 8.0 {
            if let Some(set) = estimator.estimate(&make_frame(t)).await.unwrap() {
                aggregator.push(extract_sample(&set, MovementPattern::Squat));
            }
            t += 0.1;
        }

        let reps = aggregator.finalize(8.0);
        assert_eq!(reps.len(), 4);

        let rom: Vec<bool> = reps.iter().map(|r| r.rom_ok).collect();
        assert_eq!(rom, vec![true, false, false, false]);

        // The payload aggregates recompute deterministically from the reps
        let payload = FeaturePayload::from_reps(
            MovementPattern::Squat,
            "client-1",
            10.0,
            CameraView::Front,
            reps,
        );
        assert!(payload.is_submittable());
        assert_eq!(payload.aggregates.rom_rate, 0.25);
        assert!(!payload.flags.full_rom);
    }

    /// Scenario B: retake during a pending analyze leaves the controller
    /// idle with no stale KPI data, even after the scoring delay elapses.
    #[tokio::test]
    async fn test_retake_cancels_pending_analysis() {
        struct SlowScoring(MockScoringApi);

        #[async_trait::async_trait]
        impl ScoringApi for SlowScoring {
            async fn score_features(
                &self,
                payload: &FeaturePayload,
                variation_override: Option<&str>,
            ) -> Result<MovementAnalysisResponse, ScreenError> {
                tokio::time::sleep(Duration::from_millis(400)).await;
                self.0.score_features(payload, variation_override).await
            }

            async fn score_media(
                &self,
                clip: &ClipData,
                meta: &MediaMetadata,
            ) -> Result<MovementAnalysisResponse, ScreenError> {
                tokio::time::sleep(Duration::from_millis(400)).await;
                self.0.score_media(clip, meta).await
            }
        }

        let harness = spawn_harness(
            ScriptedMotion::new(0.4, vec![95.0]),
            Arc::new(SlowScoring(MockScoringApi::new())),
        );

        harness.handle.request_capture().await;
        harness
            .handle
            .wait_for_state(WAIT, CaptureState::Recording)
            .await
            .expect("recording");
        tokio::time::sleep(Duration::from_millis(500)).await;
        harness.handle.stop_capture().await;
        harness
            .handle
            .wait_for_state(WAIT, CaptureState::Reviewing)
            .await
            .expect("reviewing");

        harness.handle.analyze().await;
        harness
            .handle
            .wait_for_state(WAIT, CaptureState::Analyzing)
            .await
            .expect("analyzing");

        harness.handle.retake().await;
        harness
            .handle
            .wait_for(WAIT, |s| s.state == CaptureState::Idle && s.epoch == 1)
            .await
            .expect("idle after retake");

        // Let the would-be scoring response land; nothing may change
        tokio::time::sleep(Duration::from_millis(600)).await;
        let snapshot = harness.handle.snapshot();
        assert_eq!(snapshot.state, CaptureState::Idle);
        assert!(snapshot.reconciliation.is_none());
        assert!(snapshot.payload.is_none());
        assert!(!harness.camera.is_held());

        harness.handle.shutdown().await;
    }

    /// Scenario C: a coach override of a passing KPI persists with the
    /// effective verdict false, the original true, and the override false.
    #[tokio::test]
    async fn test_override_survives_into_persisted_record() {
        let harness = spawn_harness(
            ScriptedMotion::new(0.4, vec![95.0]),
            Arc::new(MockScoringApi::new()),
        );

        harness.handle.request_capture().await;
        harness
            .handle
            .wait_for_state(WAIT, CaptureState::Recording)
            .await
            .expect("recording");
        tokio::time::sleep(Duration::from_millis(500)).await;
        harness.handle.stop_capture().await;
        harness
            .handle
            .wait_for_state(WAIT, CaptureState::Reviewing)
            .await
            .expect("reviewing");

        harness.handle.analyze().await;
        let reconciling = harness
            .handle
            .wait_for_state(WAIT, CaptureState::Reconciling)
            .await
            .expect("reconciling");

        // The single deep rep passes the depth criterion
        let depth = reconciling
            .reconciliation
            .as_ref()
            .unwrap()
            .kpi("depth")
            .unwrap();
        assert!(*depth.pass.effective());

        harness.handle.set_kpi_editing("depth", true).await;
        harness.handle.set_kpi_pass("depth", false).await;
        harness.handle.save().await;
        harness
            .handle
            .wait_for_state(WAIT, CaptureState::Saved)
            .await
            .expect("saved");

        let records = harness.persistence.records();
        assert_eq!(records.len(), 1);

        let saved_kpi = records[0].1.response.kpi("depth").unwrap();
        assert_eq!(*saved_kpi.pass.effective(), false);
        assert_eq!(saved_kpi.pass.original, true);
        assert_eq!(saved_kpi.pass.value, Some(false));

        harness.handle.shutdown().await;
    }

    /// Full pipeline: camera -> estimator -> aggregation -> scoring ->
    /// reconciliation -> persistence, with insights and clip reference.
    #[tokio::test]
    async fn test_full_mock_pipeline_persists_complete_record() {
        let harness = spawn_harness(
            ScriptedMotion::new(0.4, vec![95.0]),
            Arc::new(MockScoringApi::new()),
        );

        harness.handle.request_capture().await;
        harness
            .handle
            .wait_for_state(WAIT, CaptureState::Recording)
            .await
            .expect("recording");
        tokio::time::sleep(Duration::from_millis(600)).await;
        harness.handle.stop_capture().await;

        let reviewing = harness
            .handle
            .wait_for_state(WAIT, CaptureState::Reviewing)
            .await
            .expect("reviewing");
        assert!(reviewing.sample_count > 10);
        assert!(reviewing.thumbnail_count >= 1);

        harness.handle.analyze().await;
        harness
            .handle
            .wait_for_state(WAIT, CaptureState::Reconciling)
            .await
            .expect("reconciling");

        harness.handle.save().await;
        harness
            .handle
            .wait_for_state(WAIT, CaptureState::Saved)
            .await
            .expect("saved");

        let records = harness.persistence.records();
        assert_eq!(records.len(), 1);
        let record = &records[0].1;

        assert_eq!(record.subject_id, "client-1");
        assert_eq!(record.pattern, MovementPattern::Squat);
        assert!(record.payload.is_submittable());
        assert_eq!(record.response.kpis.len(), KPI_COUNT);
        assert!(record.response.rep_insights.is_some());
        assert!(record.response.rep_summary.is_some());
        assert!(record.clip.is_some(), "clip reference stored");
        assert!(record.clip_duration_secs.unwrap() > 0.0);

        harness.handle.shutdown().await;
    }

    /// Re-analysis with a coach variation override resets reconciliation
    /// state and carries the override to the scorer.
    #[tokio::test]
    async fn test_variation_override_rescore() {
        let harness = spawn_harness(
            ScriptedMotion::new(0.4, vec![95.0]),
            Arc::new(MockScoringApi::new()),
        );

        harness.handle.request_capture().await;
        harness
            .handle
            .wait_for_state(WAIT, CaptureState::Recording)
            .await
            .expect("recording");
        tokio::time::sleep(Duration::from_millis(500)).await;
        harness.handle.stop_capture().await;
        harness
            .handle
            .wait_for_state(WAIT, CaptureState::Reviewing)
            .await
            .expect("reviewing");

        harness.handle.analyze().await;
        harness
            .handle
            .wait_for_state(WAIT, CaptureState::Reconciling)
            .await
            .expect("first analysis");

        // Coach disputes the detected variation and asks for a re-score
        harness
            .handle
            .set_variation_override(Some("goblet".to_string()))
            .await;
        harness.handle.analyze().await;

        let rescored = harness
            .handle
            .wait_for(WAIT, |s| {
                s.state == CaptureState::Reconciling
                    && s.reconciliation
                        .as_ref()
                        .map(|r| r.response().variation.original == "goblet")
                        .unwrap_or(false)
            })
            .await
            .expect("re-scored with override");

        // Fresh reconciliation state: the override was consumed by the
        // scorer, not carried as an edit
        let reconciliation = rescored.reconciliation.unwrap();
        assert_eq!(reconciliation.variation_override(), None);
        assert_eq!(reconciliation.effective_variation(), "goblet");

        harness.handle.shutdown().await;
    }
}
