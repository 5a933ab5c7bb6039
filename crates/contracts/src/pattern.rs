//! Movement patterns and camera views.

use serde::{Deserialize, Serialize};

/// Screened movement pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
    Squat,
    Lunge,
    Hinge,
    Push,
    Pull,
}

impl MovementPattern {
    /// Default depth threshold (degrees of flexion) above which a rep
    /// counts as full range of motion. Config may override per pattern.
    pub fn default_depth_threshold_deg(&self) -> f64 {
        match self {
            MovementPattern::Squat => 90.0,
            MovementPattern::Lunge => 85.0,
            MovementPattern::Hinge => 60.0,
            MovementPattern::Push => 80.0,
            MovementPattern::Pull => 75.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementPattern::Squat => "squat",
            MovementPattern::Lunge => "lunge",
            MovementPattern::Hinge => "hinge",
            MovementPattern::Push => "push",
            MovementPattern::Pull => "pull",
        }
    }
}

impl std::str::FromStr for MovementPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "squat" => Ok(MovementPattern::Squat),
            "lunge" => Ok(MovementPattern::Lunge),
            "hinge" => Ok(MovementPattern::Hinge),
            "push" => Ok(MovementPattern::Push),
            "pull" => Ok(MovementPattern::Pull),
            other => Err(format!("unknown movement pattern '{other}'")),
        }
    }
}

impl std::fmt::Display for MovementPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Camera placement relative to the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraView {
    #[default]
    Front,
    Side,
    ThreeQuarter,
}
