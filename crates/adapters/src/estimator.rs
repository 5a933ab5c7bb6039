//! Mock pose estimator
//!
//! Implements `PoseEstimator`, replaying a scripted motion as a full
//! keypoint skeleton. Initialization is idempotent and can be configured to
//! fail so degraded (clip-only) capture paths stay testable.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use contracts::{Joint, Keypoint, KeypointSet, PoseEstimator, ScreenError, VideoFrame};
use tracing::debug;

use crate::motion::ScriptedMotion;

/// Mock per-frame keypoint detector.
pub struct MockPoseEstimator {
    motion: ScriptedMotion,
    loaded: AtomicBool,
    fail_load: bool,
    detect_subject: bool,
}

impl MockPoseEstimator {
    pub fn new(motion: ScriptedMotion) -> Self {
        Self {
            motion,
            loaded: AtomicBool::new(false),
            fail_load: false,
            detect_subject: true,
        }
    }

    /// Estimator whose model initialization fails.
    pub fn failing_load(motion: ScriptedMotion) -> Self {
        Self {
            fail_load: true,
            ..Self::new(motion)
        }
    }

    /// Estimator that never finds a subject in frame.
    pub fn empty_frames() -> Self {
        Self {
            detect_subject: false,
            ..Self::new(ScriptedMotion::standing())
        }
    }
}

#[async_trait]
impl PoseEstimator for MockPoseEstimator {
    async fn load(&self) -> Result<(), ScreenError> {
        if self.fail_load {
            return Err(ScreenError::estimator_unavailable(
                "model weights could not be initialized",
            ));
        }
        if !self.loaded.swap(true, Ordering::SeqCst) {
            debug!("mock pose estimator loaded");
        }
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Relaxed)
    }

    async fn estimate(&self, frame: &VideoFrame) -> Result<Option<KeypointSet>, ScreenError> {
        if !self.is_loaded() {
            return Err(ScreenError::EstimationFailed {
                message: "estimator not loaded".to_string(),
            });
        }
        if !self.detect_subject {
            return Ok(None);
        }

        let flex = self.motion.flexion_at(frame.timestamp);
        Ok(Some(scripted_pose(flex, frame.timestamp)))
    }
}

/// Build a symmetric skeleton with the given knee flexion (degrees).
///
/// The geometry is consistent with the extractor's conventions: the hip
/// rides along an arc around the knee so the internal knee angle equals
/// 180 minus the requested flexion.
fn scripted_pose(flex_deg: f64, timestamp: f64) -> KeypointSet {
    const CONFIDENCE: f64 = 0.95;
    let flex = flex_deg.to_radians();

    let ankle = Keypoint::new(0.5, 0.9, CONFIDENCE);
    let knee = Keypoint::new(0.5, 0.75, CONFIDENCE);
    let hip = Keypoint::new(
        knee.x - 0.15 * flex.sin(),
        knee.y - 0.15 * flex.cos(),
        CONFIDENCE,
    );
    let shoulder = Keypoint::new(hip.x + 0.02 * flex.sin(), hip.y - 0.25, CONFIDENCE);
    let elbow = Keypoint::new(shoulder.x + 0.05, shoulder.y + 0.08, CONFIDENCE);
    let wrist = Keypoint::new(elbow.x + 0.02, elbow.y + 0.12, CONFIDENCE);
    let nose = Keypoint::new(shoulder.x, shoulder.y - 0.12, CONFIDENCE);

    let mut set = KeypointSet::new(timestamp);
    set.insert(Joint::Nose, nose);
    for (left, right, point) in [
        (Joint::LeftEye, Joint::RightEye, offset(nose, 0.01, -0.01)),
        (Joint::LeftEar, Joint::RightEar, offset(nose, 0.02, 0.0)),
        (Joint::LeftShoulder, Joint::RightShoulder, shoulder),
        (Joint::LeftElbow, Joint::RightElbow, elbow),
        (Joint::LeftWrist, Joint::RightWrist, wrist),
        (Joint::LeftHip, Joint::RightHip, hip),
        (Joint::LeftKnee, Joint::RightKnee, knee),
        (Joint::LeftAnkle, Joint::RightAnkle, ankle),
    ] {
        set.insert(left, offset(point, -0.02, 0.0));
        set.insert(right, offset(point, 0.02, 0.0));
    }
    set
}

fn offset(kp: Keypoint, dx: f64, dy: f64) -> Keypoint {
    Keypoint::new(kp.x + dx, kp.y + dy, kp.confidence)
}
