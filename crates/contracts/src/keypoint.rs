//! Keypoint - Pose Estimator output
//!
//! One subject's named landmarks for a single video frame.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Keypoints below this confidence are never used for angle computation.
pub const MIN_KEYPOINT_CONFIDENCE: f64 = 0.3;

/// Anatomical landmark identifiers (17-landmark layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const COUNT: usize = 17;

    /// All landmarks in estimator output order.
    pub fn all() -> [Joint; Self::COUNT] {
        use Joint::*;
        [
            Nose,
            LeftEye,
            RightEye,
            LeftEar,
            RightEar,
            LeftShoulder,
            RightShoulder,
            LeftElbow,
            RightElbow,
            LeftWrist,
            RightWrist,
            LeftHip,
            RightHip,
            LeftKnee,
            RightKnee,
            LeftAnkle,
            RightAnkle,
        ]
    }
}

/// Single landmark: normalized position + detection confidence.
///
/// Produced fresh per frame by the pose estimator; never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Normalized x in [0, 1]
    pub x: f64,

    /// Normalized y in [0, 1], growing downward
    pub y: f64,

    /// Detection confidence in [0, 1]
    pub confidence: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    /// Whether this keypoint clears the given confidence threshold.
    pub fn is_confident(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}

/// One subject's keypoints for one frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeypointSet {
    /// Frame timestamp (seconds since session start)
    pub timestamp: f64,

    /// Detected landmarks (joint -> keypoint)
    pub points: HashMap<Joint, Keypoint>,
}

impl KeypointSet {
    pub fn new(timestamp: f64) -> Self {
        Self {
            timestamp,
            points: HashMap::new(),
        }
    }

    pub fn insert(&mut self, joint: Joint, keypoint: Keypoint) {
        self.points.insert(joint, keypoint);
    }

    pub fn get(&self, joint: Joint) -> Option<Keypoint> {
        self.points.get(&joint).copied()
    }

    /// Landmark lookup that filters out low-confidence detections.
    pub fn confident(&self, joint: Joint) -> Option<Keypoint> {
        self.get(joint)
            .filter(|kp| kp.is_confident(MIN_KEYPOINT_CONFIDENCE))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confident_filters_low_confidence() {
        let mut set = KeypointSet::new(0.0);
        set.insert(Joint::LeftKnee, Keypoint::new(0.5, 0.7, 0.9));
        set.insert(Joint::RightKnee, Keypoint::new(0.6, 0.7, 0.1));

        assert!(set.confident(Joint::LeftKnee).is_some());
        assert!(set.confident(Joint::RightKnee).is_none());
        assert!(set.get(Joint::RightKnee).is_some());
    }

    #[test]
    fn test_joint_serde_snake_case() {
        let json = serde_json::to_string(&Joint::LeftShoulder).unwrap();
        assert_eq!(json, "\"left_shoulder\"");
    }
}
