//! Per-frame feature extraction.
//!
//! Collapses one keypoint set into the scalar signals the rep aggregator
//! consumes. Flexion is expressed as 180 minus the internal joint angle, so
//! larger values mean deeper.

use contracts::{FrameSample, Joint, KeypointSet, MovementPattern};

use crate::geometry::{
    joint_angle, knee_valgus, pair_midpoint, segment_from_vertical, trunk_flexion,
};

fn flexion(angle: Option<f64>) -> Option<f64> {
    angle.map(|a| 180.0 - a)
}

fn hip_flexion(set: &KeypointSet) -> Option<f64> {
    let shoulder = pair_midpoint(set, Joint::LeftShoulder, Joint::RightShoulder)?;
    let hip = pair_midpoint(set, Joint::LeftHip, Joint::RightHip)?;
    let knee = pair_midpoint(set, Joint::LeftKnee, Joint::RightKnee)?;
    flexion(joint_angle(shoulder, hip, knee))
}

fn knee_flexion(set: &KeypointSet) -> Option<f64> {
    let hip = pair_midpoint(set, Joint::LeftHip, Joint::RightHip)?;
    let knee = pair_midpoint(set, Joint::LeftKnee, Joint::RightKnee)?;
    let ankle = pair_midpoint(set, Joint::LeftAnkle, Joint::RightAnkle)?;
    flexion(joint_angle(hip, knee, ankle))
}

fn elbow_flexion(set: &KeypointSet) -> Option<f64> {
    let shoulder = pair_midpoint(set, Joint::LeftShoulder, Joint::RightShoulder)?;
    let elbow = pair_midpoint(set, Joint::LeftElbow, Joint::RightElbow)?;
    let wrist = pair_midpoint(set, Joint::LeftWrist, Joint::RightWrist)?;
    flexion(joint_angle(shoulder, elbow, wrist))
}

fn wrist_deviation(set: &KeypointSet) -> Option<f64> {
    let elbow = pair_midpoint(set, Joint::LeftElbow, Joint::RightElbow)?;
    let wrist = pair_midpoint(set, Joint::LeftWrist, Joint::RightWrist)?;
    segment_from_vertical(elbow, wrist)
}

/// Extract the per-frame signal bundle for the given pattern.
///
/// The depth signal is pattern-specific: knee flexion for squat/lunge, hip
/// flexion for hinge, elbow flexion for push/pull.
pub fn extract_sample(set: &KeypointSet, pattern: MovementPattern) -> FrameSample {
    let hip_flex = hip_flexion(set);
    let knee_flex = knee_flexion(set);
    let elbow_flex = elbow_flexion(set);

    let depth_deg = match pattern {
        MovementPattern::Squat | MovementPattern::Lunge => knee_flex,
        MovementPattern::Hinge => hip_flex,
        MovementPattern::Push | MovementPattern::Pull => elbow_flex,
    };

    let shoulder = pair_midpoint(set, Joint::LeftShoulder, Joint::RightShoulder);
    let hip = pair_midpoint(set, Joint::LeftHip, Joint::RightHip);
    let ankle = pair_midpoint(set, Joint::LeftAnkle, Joint::RightAnkle);

    let torso_x = match (shoulder, hip) {
        (Some(s), Some(h)) => Some((s.x + h.x) / 2.0),
        _ => None,
    };

    FrameSample {
        timestamp: set.timestamp,
        depth_deg,
        knee_valgus: knee_valgus(set),
        trunk_flexion_deg: trunk_flexion(set),
        hip_flexion_deg: hip_flex,
        knee_flexion_deg: knee_flex,
        elbow_flexion_deg: elbow_flex,
        wrist_deviation_deg: wrist_deviation(set),
        torso_x,
        shoulder_y: shoulder.map(|kp| kp.y),
        ankle_y: ankle.map(|kp| kp.y),
        hip_y: hip.map(|kp| kp.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Keypoint;

    fn kp(x: f64, y: f64) -> Keypoint {
        Keypoint::new(x, y, 0.95)
    }

    /// Symmetric skeleton with a given knee flexion (degrees).
    fn squat_pose(flex_deg: f64) -> KeypointSet {
        let mut set = KeypointSet::new(0.0);
        let flex = flex_deg.to_radians();

        let ankle = kp(0.5, 0.9);
        let knee = kp(0.5, 0.75);
        // Thigh rotated away from vertical by the flexion angle
        let hip = Keypoint::new(
            knee.x - 0.15 * flex.sin(),
            knee.y - 0.15 * flex.cos(),
            0.95,
        );
        let shoulder = Keypoint::new(hip.x, hip.y - 0.25, 0.95);

        for (l, r, p) in [
            (Joint::LeftAnkle, Joint::RightAnkle, ankle),
            (Joint::LeftKnee, Joint::RightKnee, knee),
            (Joint::LeftHip, Joint::RightHip, hip),
            (Joint::LeftShoulder, Joint::RightShoulder, shoulder),
        ] {
            set.insert(l, p);
            set.insert(r, p);
        }
        set
    }

    #[test]
    fn test_standing_pose_has_near_zero_depth() {
        let sample = extract_sample(&squat_pose(0.0), MovementPattern::Squat);
        assert!(sample.depth_deg.unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_squat_depth_tracks_knee_flexion() {
        let sample = extract_sample(&squat_pose(95.0), MovementPattern::Squat);
        let depth = sample.depth_deg.unwrap();
        assert!((depth - 95.0).abs() < 1.0, "got {depth}");
    }

    #[test]
    fn test_missing_landmarks_leave_fields_unset() {
        let set = KeypointSet::new(1.0);
        let sample = extract_sample(&set, MovementPattern::Squat);
        assert!(!sample.has_signal());
        assert_eq!(sample.timestamp, 1.0);
    }

    #[test]
    fn test_hinge_uses_hip_flexion() {
        let pose = squat_pose(40.0);
        let sample = extract_sample(&pose, MovementPattern::Hinge);
        assert_eq!(sample.depth_deg, sample.hip_flexion_deg);
    }
}
