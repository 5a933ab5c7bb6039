//! Rep aggregator: per-frame sample stream -> per-repetition metrics.
//!
//! Primary policy segments the stream at local maxima of the depth signal;
//! when segmentation finds nothing (short or monotonic captures) the whole
//! recording window is treated as one repetition. At least one RepMetric is
//! emitted whenever at least one valid sample exists, and metrics are never
//! edited after emission.

use contracts::{FrameSample, MovementPattern, RepMetric, RepTempo};
use tracing::debug;

use crate::geometry::{mean, mean_opt, std_dev};

/// Smoothing window (samples) applied before peak detection.
const SMOOTHING_WINDOW: usize = 5;

/// A depth peak must rise this far above the series minimum to count as a rep.
const PEAK_PROMINENCE_DEG: f64 = 15.0;

/// Minimum time between accepted peaks.
const MIN_PEAK_SPACING_SECS: f64 = 1.0;

/// Ankle-to-hip vertical band (normalized units) that counts as heel contact.
const HEEL_CONTACT_BAND: f64 = 0.55;

/// Share of in-band frames required to flag heel contact.
const HEEL_CONTACT_MIN_FRACTION: f64 = 0.7;

/// Shoulder vertical drift (std-dev) below which the scapular set held.
const SCAPULAR_DRIFT_MAX: f64 = 0.02;

/// Trunk-angle spread that maps torso-line fit down to zero.
const TORSO_FIT_SCALE_DEG: f64 = 30.0;

/// Converts the geometric sample stream collected during recording into one
/// or more per-repetition metric records.
pub struct RepAggregator {
    pattern: MovementPattern,
    depth_threshold_deg: f64,
    samples: Vec<FrameSample>,
}

impl RepAggregator {
    pub fn new(pattern: MovementPattern, depth_threshold_deg: f64) -> Self {
        Self {
            pattern,
            depth_threshold_deg,
            samples: Vec::new(),
        }
    }

    pub fn pattern(&self) -> MovementPattern {
        self.pattern
    }

    /// Append one per-frame sample. Order of arrival is preserved.
    pub fn push(&mut self, sample: FrameSample) {
        self.samples.push(sample);
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Whether at least one sample carries a computable signal.
    pub fn has_valid_samples(&self) -> bool {
        self.samples.iter().any(|s| s.has_signal())
    }

    /// Drop all buffered samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Produce the final rep records for this recording window.
    ///
    /// `elapsed_secs` is the wall-clock recording duration, used for tempo
    /// when the depth signal gives no usable split.
    pub fn finalize(&self, elapsed_secs: f64) -> Vec<RepMetric> {
        if !self.has_valid_samples() {
            return Vec::new();
        }

        let segments = self.segment_by_depth();
        let reps = if segments.len() >= 2 {
            segments
                .iter()
                .enumerate()
                .map(|(i, seg)| self.build_metric(i as u32 + 1, &self.samples[seg.0..seg.1]))
                .collect()
        } else {
            vec![self.whole_window_metric(elapsed_secs)]
        };

        debug!(
            pattern = %self.pattern,
            samples = self.samples.len(),
            reps = reps.len(),
            "rep aggregation finalized"
        );
        metrics::counter!("screen_reps_emitted_total").increment(reps.len() as u64);

        reps
    }

    /// Segment boundaries (half-open sample index ranges) around depth peaks.
    fn segment_by_depth(&self) -> Vec<(usize, usize)> {
        let depth: Vec<Option<f64>> = self.samples.iter().map(|s| s.depth_deg).collect();
        let indexed: Vec<(usize, f64)> = depth
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.map(|v| (i, v)))
            .collect();
        if indexed.len() < 3 {
            return Vec::new();
        }

        let values: Vec<f64> = indexed.iter().map(|(_, v)| *v).collect();
        let smoothed = smooth(&values, SMOOTHING_WINDOW);
        let floor = smoothed.iter().cloned().fold(f64::INFINITY, f64::min);

        // Local maxima with prominence and spacing gates. When two peaks
        // land closer than the spacing floor, the taller one wins.
        let mut peaks: Vec<usize> = Vec::new();
        for i in 1..smoothed.len() - 1 {
            if smoothed[i] < smoothed[i - 1] || smoothed[i] < smoothed[i + 1] {
                continue;
            }
            if smoothed[i] - floor < PEAK_PROMINENCE_DEG {
                continue;
            }

            if let Some(&last) = peaks.last() {
                let spacing =
                    self.samples[indexed[i].0].timestamp - self.samples[indexed[last].0].timestamp;
                if spacing < MIN_PEAK_SPACING_SECS {
                    if smoothed[i] > smoothed[last] {
                        *peaks.last_mut().unwrap() = i;
                    }
                    continue;
                }
            }
            peaks.push(i);
        }

        if peaks.len() < 2 {
            return peaks
                .into_iter()
                .map(|_| (0, self.samples.len()))
                .collect();
        }

        // Boundary between two peaks sits at the shallowest sample between them.
        let mut boundaries = vec![0usize];
        for pair in peaks.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            let valley = (lo..=hi)
                .min_by(|a, b| values[*a].partial_cmp(&values[*b]).unwrap())
                .unwrap_or(lo);
            boundaries.push(indexed[valley].0);
        }
        boundaries.push(self.samples.len());

        boundaries
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .filter(|(a, b)| a < b)
            .collect()
    }

    /// Build one rep record from a contiguous sample slice.
    fn build_metric(&self, index: u32, segment: &[FrameSample]) -> RepMetric {
        let start_t = segment.first().map(|s| s.timestamp).unwrap_or(0.0);
        let end_t = segment.last().map(|s| s.timestamp).unwrap_or(start_t);

        // Raw (unsmoothed) peak inside the segment: the smoothed series is
        // only trusted for peak location, never for depth values.
        let peak = segment
            .iter()
            .filter_map(|s| s.depth_deg.map(|d| (s.timestamp, d)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

        let tempo = match peak {
            Some((peak_t, _)) => RepTempo {
                eccentric_secs: (peak_t - start_t).max(0.0),
                concentric_secs: (end_t - peak_t).max(0.0),
            },
            None => {
                let half = (end_t - start_t).max(0.0) / 2.0;
                RepTempo {
                    eccentric_secs: half,
                    concentric_secs: half,
                }
            }
        };

        self.metric_from_stats(index, segment, peak.map(|(_, d)| d), tempo)
    }

    /// Single-rep fallback: the entire recording window as one repetition.
    /// Depth comes from the mean of valid per-frame samples; rom_ok from the
    /// signal peak.
    fn whole_window_metric(&self, elapsed_secs: f64) -> RepMetric {
        let peak = self
            .samples
            .iter()
            .filter_map(|s| s.depth_deg.map(|d| (s.timestamp, d)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

        let start_t = self.samples.first().map(|s| s.timestamp).unwrap_or(0.0);
        let tempo = match peak {
            Some((peak_t, _)) => {
                let ecc = (peak_t - start_t).max(0.0);
                RepTempo {
                    eccentric_secs: ecc,
                    concentric_secs: (elapsed_secs - ecc).max(0.0),
                }
            }
            None => RepTempo {
                eccentric_secs: elapsed_secs / 2.0,
                concentric_secs: elapsed_secs / 2.0,
            },
        };

        let mut metric = self.metric_from_stats(1, &self.samples, peak.map(|(_, d)| d), tempo);
        metric.depth_deg = mean_opt(self.samples.iter().map(|s| s.depth_deg));
        metric
    }

    fn metric_from_stats(
        &self,
        index: u32,
        segment: &[FrameSample],
        peak_depth: Option<f64>,
        tempo: RepTempo,
    ) -> RepMetric {
        let trunk: Vec<f64> = segment.iter().filter_map(|s| s.trunk_flexion_deg).collect();
        let shoulder_y: Vec<f64> = segment.iter().filter_map(|s| s.shoulder_y).collect();
        let torso_x: Vec<f64> = segment.iter().filter_map(|s| s.torso_x).collect();

        let mean_hip = mean_opt(segment.iter().map(|s| s.hip_flexion_deg));
        let mean_knee = mean_opt(segment.iter().map(|s| s.knee_flexion_deg));

        let hinge_ratio = match (mean_hip, mean_knee) {
            (Some(h), Some(k)) if k > 5.0 => Some(h / k),
            _ => None,
        };

        let trunk_spread = std_dev(&trunk);

        RepMetric {
            index,
            tempo,
            rom_ok: peak_depth.map(|d| d >= self.depth_threshold_deg).unwrap_or(false),
            depth_deg: peak_depth,
            knee_valgus: mean_opt(segment.iter().map(|s| s.knee_valgus)),
            trunk_flexion_deg: if trunk.is_empty() {
                None
            } else {
                Some(mean(&trunk))
            },
            hip_flexion_deg: mean_hip,
            knee_flexion_deg: mean_knee,
            hinge_ratio,
            lumbar_variance: if trunk.len() < 2 {
                None
            } else {
                Some(trunk_spread * trunk_spread)
            },
            torso_line_fit: if trunk.is_empty() {
                None
            } else {
                Some((1.0 - trunk_spread / TORSO_FIT_SCALE_DEG).clamp(0.0, 1.0))
            },
            scapular_set: if shoulder_y.len() < 2 {
                None
            } else {
                Some(std_dev(&shoulder_y) < SCAPULAR_DRIFT_MAX)
            },
            torso_sway: if torso_x.is_empty() {
                None
            } else {
                Some(std_dev(&torso_x))
            },
            elbow_path_deg: mean_opt(segment.iter().map(|s| s.elbow_flexion_deg)),
            wrist_deviation_deg: mean_opt(segment.iter().map(|s| s.wrist_deviation_deg)),
            heel_contact: heel_contact(segment),
        }
    }
}

/// Heel contact: share of frames keeping the ankle within a fixed vertical
/// band of the hip must exceed the contact fraction.
fn heel_contact(segment: &[FrameSample]) -> Option<bool> {
    let pairs: Vec<(f64, f64)> = segment
        .iter()
        .filter_map(|s| match (s.ankle_y, s.hip_y) {
            (Some(a), Some(h)) => Some((a, h)),
            _ => None,
        })
        .collect();

    if pairs.is_empty() {
        return None;
    }

    let in_band = pairs
        .iter()
        .filter(|(ankle, hip)| (ankle - hip).abs() <= HEEL_CONTACT_BAND)
        .count();
    Some(in_band as f64 / pairs.len() as f64 > HEEL_CONTACT_MIN_FRACTION)
}

/// Centered moving average.
fn smooth(values: &[f64], window: usize) -> Vec<f64> {
    if values.len() < 3 || window < 2 {
        return values.to_vec();
    }
    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(values.len());
            mean(&values[lo..hi])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_sample(timestamp: f64, depth: Option<f64>) -> FrameSample {
        FrameSample {
            timestamp,
            depth_deg: depth,
            knee_valgus: Some(0.03),
            trunk_flexion_deg: Some(18.0),
            hip_flexion_deg: depth.map(|d| d * 1.1),
            knee_flexion_deg: depth,
            elbow_flexion_deg: None,
            wrist_deviation_deg: None,
            torso_x: Some(0.5),
            shoulder_y: Some(0.3),
            ankle_y: Some(0.9),
            hip_y: Some(0.55),
        }
    }

    /// Triangle-wave depth stream: one rep per peak, 2 s per rep at 10 Hz.
    fn push_reps(agg: &mut RepAggregator, peaks: &[f64]) {
        let mut t = 0.0;
        for &peak in peaks {
            for step in 0..20 {
                let frac = if step < 10 {
                    step as f64 / 10.0
                } else {
                    (20 - step) as f64 / 10.0
                };
                agg.push(make_sample(t, Some(peak * frac)));
                t += 0.1;
            }
        }
    }

    #[test]
    fn test_four_rep_set_segments_into_four_reps() {
        let mut agg = RepAggregator::new(MovementPattern::Squat, 90.0);
        push_reps(&mut agg, &[94.0, 82.0, 88.0, 80.0]);

        let reps = agg.finalize(8.0);
        assert_eq!(reps.len(), 4);

        let rom: Vec<bool> = reps.iter().map(|r| r.rom_ok).collect();
        assert_eq!(rom, vec![true, false, false, false]);

        // Depth comes from the raw peak, not the smoothed series
        assert!((reps[0].depth_deg.unwrap() - 94.0).abs() < 1e-9);
        for rep in &reps {
            assert_eq!(rep.heel_contact, Some(true));
        }
    }

    #[test]
    fn test_rep_indices_are_one_based_and_ordered() {
        let mut agg = RepAggregator::new(MovementPattern::Squat, 90.0);
        push_reps(&mut agg, &[95.0, 93.0, 91.0]);

        let reps = agg.finalize(6.0);
        let indices: Vec<u32> = reps.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_single_valid_sample_emits_one_rep() {
        let mut agg = RepAggregator::new(MovementPattern::Squat, 90.0);
        agg.push(make_sample(0.0, Some(50.0)));

        let reps = agg.finalize(3.0);
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].index, 1);
        assert!(!reps[0].rom_ok);
    }

    #[test]
    fn test_no_valid_samples_emit_nothing() {
        let mut agg = RepAggregator::new(MovementPattern::Squat, 90.0);
        agg.push(FrameSample {
            timestamp: 0.0,
            ..Default::default()
        });
        assert!(agg.finalize(3.0).is_empty());
    }

    #[test]
    fn test_monotonic_ramp_falls_back_to_single_rep() {
        let mut agg = RepAggregator::new(MovementPattern::Squat, 90.0);
        for i in 0..30 {
            agg.push(make_sample(i as f64 * 0.1, Some(i as f64 * 3.2)));
        }

        let reps = agg.finalize(3.0);
        assert_eq!(reps.len(), 1);
        // Peak (92.8) clears the threshold even though the mean does not
        assert!(reps[0].rom_ok);
        assert!(reps[0].depth_deg.unwrap() < 92.8);
    }

    #[test]
    fn test_whole_window_tempo_from_elapsed_time() {
        let mut agg = RepAggregator::new(MovementPattern::Hinge, 60.0);
        for i in 0..10 {
            agg.push(make_sample(i as f64 * 0.1, Some(i as f64 * 5.0)));
        }

        let reps = agg.finalize(4.0);
        assert_eq!(reps.len(), 1);
        let tempo = reps[0].tempo;
        assert!((tempo.eccentric_secs + tempo.concentric_secs - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_heel_rise_detected() {
        let mut agg = RepAggregator::new(MovementPattern::Squat, 90.0);
        for i in 0..10 {
            let mut s = make_sample(i as f64 * 0.1, Some(40.0));
            // Ankle drifts far outside the hip band
            s.ankle_y = Some(2.0);
            agg.push(s);
        }

        let reps = agg.finalize(1.0);
        assert_eq!(reps[0].heel_contact, Some(false));
    }
}
