//! Scripted subject motion shared by the mock camera and estimator.

/// Deterministic flexion script: one triangle-wave repetition per peak.
///
/// Keeps the mock camera, estimator and tests in agreement about what the
/// subject was "doing" at any timestamp without any shared mutable state.
#[derive(Debug, Clone)]
pub struct ScriptedMotion {
    /// Seconds per repetition
    pub rep_secs: f64,

    /// Peak flexion (degrees) for each scripted rep
    pub peaks: Vec<f64>,
}

impl ScriptedMotion {
    pub fn new(rep_secs: f64, peaks: Vec<f64>) -> Self {
        Self { rep_secs, peaks }
    }

    /// A short squat set with mixed depths, useful as a demo default.
    pub fn demo_set() -> Self {
        Self::new(2.0, vec![94.0, 82.0, 88.0, 80.0])
    }

    /// A subject standing still.
    pub fn standing() -> Self {
        Self::new(2.0, Vec::new())
    }

    /// Flexion (degrees) at the given session timestamp.
    pub fn flexion_at(&self, t: f64) -> f64 {
        if t < 0.0 || self.rep_secs <= 0.0 {
            return 0.0;
        }

        let rep = (t / self.rep_secs) as usize;
        let Some(&peak) = self.peaks.get(rep) else {
            return 0.0;
        };

        let phase = (t % self.rep_secs) / self.rep_secs;
        let frac = if phase < 0.5 {
            phase * 2.0
        } else {
            (1.0 - phase) * 2.0
        };
        peak * frac
    }

    /// Total scripted duration.
    pub fn duration_secs(&self) -> f64 {
        self.rep_secs * self.peaks.len() as f64
    }
}
