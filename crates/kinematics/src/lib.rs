//! # Kinematics
//!
//! Pure signal processing over pose keypoints: joint-angle geometry,
//! per-frame feature extraction, thumbnail sampling, and aggregation of the
//! per-frame stream into per-repetition metric records.
//!
//! Everything here is deterministic; no IO, no clocks.

pub mod aggregator;
pub mod geometry;
pub mod sample;
pub mod sampler;

pub use aggregator::RepAggregator;
pub use geometry::{joint_angle, knee_valgus, mean, std_dev, trunk_flexion};
pub use sample::extract_sample;
pub use sampler::{clip_sample_plan, FrameSampler};
