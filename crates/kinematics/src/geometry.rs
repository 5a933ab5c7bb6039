//! Joint-angle geometry and aggregation helpers.
//!
//! Angles are degrees in [0, 180]. Any keypoint below the confidence
//! threshold invalidates the computation (None) rather than producing a
//! misleading value.

use contracts::{Joint, Keypoint, KeypointSet, MIN_KEYPOINT_CONFIDENCE};

/// Angle at vertex `b` between segments b->a and b->c, in degrees.
///
/// Returns None when any keypoint is below the confidence threshold or a
/// segment is degenerate.
pub fn joint_angle(a: Keypoint, b: Keypoint, c: Keypoint) -> Option<f64> {
    for kp in [a, b, c] {
        if !kp.is_confident(MIN_KEYPOINT_CONFIDENCE) {
            return None;
        }
    }

    let (bax, bay) = (a.x - b.x, a.y - b.y);
    let (bcx, bcy) = (c.x - b.x, c.y - b.y);

    let norm_ba = (bax * bax + bay * bay).sqrt();
    let norm_bc = (bcx * bcx + bcy * bcy).sqrt();
    if norm_ba < f64::EPSILON || norm_bc < f64::EPSILON {
        return None;
    }

    let cos = ((bax * bcx + bay * bcy) / (norm_ba * norm_bc)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Midpoint of a left/right landmark pair.
///
/// Falls back to whichever side is confidently detected (side views occlude
/// one side); None when neither clears the threshold.
pub fn pair_midpoint(set: &KeypointSet, left: Joint, right: Joint) -> Option<Keypoint> {
    match (set.confident(left), set.confident(right)) {
        (Some(l), Some(r)) => Some(Keypoint::new(
            (l.x + r.x) / 2.0,
            (l.y + r.y) / 2.0,
            l.confidence.min(r.confidence),
        )),
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}

/// Angle of the segment top->bottom from the vertical axis, in degrees.
///
/// 0 = perfectly vertical. Image coordinates grow downward.
pub fn segment_from_vertical(top: Keypoint, bottom: Keypoint) -> Option<f64> {
    if !top.is_confident(MIN_KEYPOINT_CONFIDENCE) || !bottom.is_confident(MIN_KEYPOINT_CONFIDENCE)
    {
        return None;
    }

    let dx = (top.x - bottom.x).abs();
    let dy = (bottom.y - top.y).abs();
    if dx < f64::EPSILON && dy < f64::EPSILON {
        return None;
    }
    Some(dx.atan2(dy).to_degrees())
}

/// Shoulder-to-hip segment angle from vertical (trunk lean).
pub fn trunk_flexion(set: &KeypointSet) -> Option<f64> {
    let shoulder = pair_midpoint(set, Joint::LeftShoulder, Joint::RightShoulder)?;
    let hip = pair_midpoint(set, Joint::LeftHip, Joint::RightHip)?;
    segment_from_vertical(shoulder, hip)
}

/// Knee valgus approximation: mismatch between the knee horizontal spread
/// and the ankle horizontal spread, in normalized units.
pub fn knee_valgus(set: &KeypointSet) -> Option<f64> {
    let lk = set.confident(Joint::LeftKnee)?;
    let rk = set.confident(Joint::RightKnee)?;
    let la = set.confident(Joint::LeftAnkle)?;
    let ra = set.confident(Joint::RightAnkle)?;

    Some(((lk.x - rk.x) - (la.x - ra.x)).abs())
}

/// Arithmetic mean; 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for empty or singleton input.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Mean over the Some entries; None when none are present.
pub fn mean_opt(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let collected: Vec<f64> = values.flatten().collect();
    if collected.is_empty() {
        None
    } else {
        Some(mean(&collected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(x: f64, y: f64) -> Keypoint {
        Keypoint::new(x, y, 0.9)
    }

    #[test]
    fn test_collinear_points_are_180() {
        let angle = joint_angle(kp(0.2, 0.2), kp(0.5, 0.5), kp(0.8, 0.8)).unwrap();
        assert!((angle - 180.0).abs() < 1e-9, "got {angle}");
    }

    #[test]
    fn test_right_angle_is_90() {
        let angle = joint_angle(kp(0.5, 0.2), kp(0.5, 0.5), kp(0.8, 0.5)).unwrap();
        assert!((angle - 90.0).abs() < 1e-9, "got {angle}");
    }

    #[test]
    fn test_low_confidence_invalidates_angle() {
        let weak = Keypoint::new(0.2, 0.2, 0.29);
        assert!(joint_angle(weak, kp(0.5, 0.5), kp(0.8, 0.5)).is_none());
    }

    #[test]
    fn test_degenerate_segment_invalidates_angle() {
        assert!(joint_angle(kp(0.5, 0.5), kp(0.5, 0.5), kp(0.8, 0.5)).is_none());
    }

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_std_dev_empty_and_singleton_are_zero() {
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[42.0]), 0.0);
    }

    #[test]
    fn test_std_dev_population() {
        // Population std-dev of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_vertical_segment_is_zero_degrees() {
        let angle = segment_from_vertical(kp(0.5, 0.2), kp(0.5, 0.8)).unwrap();
        assert!(angle.abs() < 1e-9);
    }

    #[test]
    fn test_trunk_flexion_forty_five() {
        let mut set = KeypointSet::new(0.0);
        set.insert(Joint::LeftShoulder, kp(0.6, 0.3));
        set.insert(Joint::RightShoulder, kp(0.6, 0.3));
        set.insert(Joint::LeftHip, kp(0.4, 0.5));
        set.insert(Joint::RightHip, kp(0.4, 0.5));

        let angle = trunk_flexion(&set).unwrap();
        assert!((angle - 45.0).abs() < 1e-9, "got {angle}");
    }

    #[test]
    fn test_knee_valgus_needs_all_four_landmarks() {
        let mut set = KeypointSet::new(0.0);
        set.insert(Joint::LeftKnee, kp(0.45, 0.7));
        set.insert(Joint::RightKnee, kp(0.55, 0.7));
        set.insert(Joint::LeftAnkle, kp(0.40, 0.9));
        assert!(knee_valgus(&set).is_none());

        set.insert(Joint::RightAnkle, kp(0.60, 0.9));
        let valgus = knee_valgus(&set).unwrap();
        // knees spread -0.10, ankles spread -0.20
        assert!((valgus - 0.10).abs() < 1e-9, "got {valgus}");
    }
}
