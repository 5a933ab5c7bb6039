//! RepMetric / FeaturePayload - Rep Aggregator output
//!
//! Per-repetition derived signals and the canonical feature record sent to
//! the scoring collaborator.

use serde::{Deserialize, Serialize};

use crate::{CameraView, MovementPattern};

/// Per-frame derived signals, computed from one keypoint set.
///
/// All angle fields are degrees in [0, 180]; a field is None when the
/// underlying keypoints were missing or below the confidence threshold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameSample {
    /// Seconds since session start
    pub timestamp: f64,

    /// Pattern-specific depth signal (flexion degrees, larger = deeper)
    pub depth_deg: Option<f64>,

    /// Knee-over-ankle horizontal mismatch (normalized units)
    pub knee_valgus: Option<f64>,

    /// Shoulder-to-hip segment angle from vertical
    pub trunk_flexion_deg: Option<f64>,

    pub hip_flexion_deg: Option<f64>,
    pub knee_flexion_deg: Option<f64>,
    pub elbow_flexion_deg: Option<f64>,

    /// Forearm angle from vertical
    pub wrist_deviation_deg: Option<f64>,

    /// Torso midpoint horizontal position (normalized)
    pub torso_x: Option<f64>,

    /// Shoulder midpoint vertical position (normalized)
    pub shoulder_y: Option<f64>,

    /// Ankle midpoint vertical position (normalized)
    pub ankle_y: Option<f64>,

    /// Hip midpoint vertical position (normalized)
    pub hip_y: Option<f64>,
}

impl FrameSample {
    /// A sample carries information when at least one signal was computable.
    pub fn has_signal(&self) -> bool {
        self.depth_deg.is_some()
            || self.knee_valgus.is_some()
            || self.trunk_flexion_deg.is_some()
            || self.hip_flexion_deg.is_some()
            || self.knee_flexion_deg.is_some()
            || self.elbow_flexion_deg.is_some()
    }
}

/// Eccentric/concentric split of one repetition.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RepTempo {
    pub eccentric_secs: f64,
    pub concentric_secs: f64,
}

/// One repetition's derived signals.
///
/// Created by the rep aggregator at segmentation boundaries; immutable once
/// emitted. A new analysis run replaces the whole set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepMetric {
    /// 1-based position within the set
    pub index: u32,

    pub tempo: RepTempo,

    /// Whether the depth signal cleared the pattern threshold
    pub rom_ok: bool,

    /// Peak-of-rep depth for segmented reps, mean for the whole-window rep
    pub depth_deg: Option<f64>,

    pub knee_valgus: Option<f64>,
    pub trunk_flexion_deg: Option<f64>,
    pub hip_flexion_deg: Option<f64>,
    pub knee_flexion_deg: Option<f64>,

    /// Mean hip flexion over mean knee flexion (hinge dominance)
    pub hinge_ratio: Option<f64>,

    /// Variance of trunk flexion across the rep
    pub lumbar_variance: Option<f64>,

    /// Torso-line stability in [0, 1] (1 = rigid torso)
    pub torso_line_fit: Option<f64>,

    /// Shoulder girdle held set through the rep
    pub scapular_set: Option<bool>,

    /// Lateral torso drift (std-dev of torso x, normalized units)
    pub torso_sway: Option<f64>,

    pub elbow_path_deg: Option<f64>,
    pub wrist_deviation_deg: Option<f64>,

    /// Heels stayed down for the dominant share of the rep
    pub heel_contact: Option<bool>,
}

/// Scalar aggregates recomputed deterministically from the rep list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureAggregates {
    pub mean_depth_deg: Option<f64>,
    pub mean_knee_valgus: Option<f64>,
    pub mean_trunk_flexion_deg: Option<f64>,
    pub mean_eccentric_secs: f64,
    pub mean_concentric_secs: f64,

    /// Eccentric over concentric tempo
    pub tempo_ratio: Option<f64>,

    /// Share of reps with rom_ok
    pub rom_rate: f64,
}

impl FeatureAggregates {
    /// Recompute from the rep list. Never hand-edited.
    pub fn from_reps(reps: &[RepMetric]) -> Self {
        if reps.is_empty() {
            return Self::default();
        }

        let n = reps.len() as f64;
        let mean_opt = |values: Vec<f64>| -> Option<f64> {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        };

        let mean_ecc = reps.iter().map(|r| r.tempo.eccentric_secs).sum::<f64>() / n;
        let mean_con = reps.iter().map(|r| r.tempo.concentric_secs).sum::<f64>() / n;

        Self {
            mean_depth_deg: mean_opt(reps.iter().filter_map(|r| r.depth_deg).collect()),
            mean_knee_valgus: mean_opt(reps.iter().filter_map(|r| r.knee_valgus).collect()),
            mean_trunk_flexion_deg: mean_opt(
                reps.iter().filter_map(|r| r.trunk_flexion_deg).collect(),
            ),
            mean_eccentric_secs: mean_ecc,
            mean_concentric_secs: mean_con,
            tempo_ratio: if mean_con > 0.0 {
                Some(mean_ecc / mean_con)
            } else {
                None
            },
            rom_rate: reps.iter().filter(|r| r.rom_ok).count() as f64 / n,
        }
    }
}

/// Set-level boolean flags derived from the rep list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Any rep lost heel contact
    pub heel_rise: bool,

    /// Every rep reached full range of motion
    pub full_rom: bool,

    /// Any rep lost scapular set
    pub scapular_loss: bool,
}

impl FeatureFlags {
    pub fn from_reps(reps: &[RepMetric]) -> Self {
        Self {
            heel_rise: reps.iter().any(|r| r.heel_contact == Some(false)),
            full_rom: !reps.is_empty() && reps.iter().all(|r| r.rom_ok),
            scapular_loss: reps.iter().any(|r| r.scapular_set == Some(false)),
        }
    }
}

/// Canonical unit sent to the scoring collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePayload {
    pub pattern: MovementPattern,
    pub subject_id: String,
    pub sampling_rate_hz: f64,
    pub camera_view: CameraView,

    /// Ordered repetition records, non-empty before submission
    pub reps: Vec<RepMetric>,

    pub aggregates: FeatureAggregates,
    pub flags: FeatureFlags,
}

impl FeaturePayload {
    /// Build a payload with aggregates/flags recomputed from the reps.
    pub fn from_reps(
        pattern: MovementPattern,
        subject_id: impl Into<String>,
        sampling_rate_hz: f64,
        camera_view: CameraView,
        reps: Vec<RepMetric>,
    ) -> Self {
        let aggregates = FeatureAggregates::from_reps(&reps);
        let flags = FeatureFlags::from_reps(&reps);
        Self {
            pattern,
            subject_id: subject_id.into(),
            sampling_rate_hz,
            camera_view,
            reps,
            aggregates,
            flags,
        }
    }

    pub fn is_submittable(&self) -> bool {
        !self.reps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_rep(index: u32, depth: f64, rom_ok: bool) -> RepMetric {
        RepMetric {
            index,
            tempo: RepTempo {
                eccentric_secs: 1.5,
                concentric_secs: 1.0,
            },
            rom_ok,
            depth_deg: Some(depth),
            knee_valgus: Some(0.02),
            trunk_flexion_deg: Some(20.0),
            hip_flexion_deg: Some(95.0),
            knee_flexion_deg: Some(depth),
            hinge_ratio: None,
            lumbar_variance: None,
            torso_line_fit: None,
            scapular_set: None,
            torso_sway: None,
            elbow_path_deg: None,
            wrist_deviation_deg: None,
            heel_contact: Some(true),
        }
    }

    #[test]
    fn test_aggregates_recomputed_from_reps() {
        let reps = vec![make_rep(1, 94.0, true), make_rep(2, 82.0, false)];
        let agg = FeatureAggregates::from_reps(&reps);
        assert_eq!(agg.mean_depth_deg, Some(88.0));
        assert_eq!(agg.rom_rate, 0.5);
        assert_eq!(agg.tempo_ratio, Some(1.5));
    }

    #[test]
    fn test_empty_reps_not_submittable() {
        let payload = FeaturePayload::from_reps(
            MovementPattern::Squat,
            "client-1",
            10.0,
            CameraView::Front,
            vec![],
        );
        assert!(!payload.is_submittable());
        assert_eq!(payload.aggregates, FeatureAggregates::default());
    }

    #[test]
    fn test_flags_from_reps() {
        let mut reps = vec![make_rep(1, 94.0, true), make_rep(2, 92.0, true)];
        reps[1].heel_contact = Some(false);
        let flags = FeatureFlags::from_reps(&reps);
        assert!(flags.heel_rise);
        assert!(flags.full_rom);
    }
}
