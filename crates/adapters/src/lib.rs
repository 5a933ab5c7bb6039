//! # Adapters
//!
//! Runtime implementations of the capture capabilities and collaborator
//! interfaces: a mock camera that synthesizes frames from a scripted
//! motion, a mock pose estimator that replays that motion as keypoints,
//! and in-memory persistence/fusion/clip-store collaborators.
//!
//! Real device and service integrations implement the same contracts
//! traits; everything downstream is indifferent to which one it gets.

mod camera;
mod clip_store;
mod estimator;
mod motion;
mod persistence;

pub use camera::{MockCamera, MockCameraConfig};
pub use clip_store::MemoryClipStore;
pub use estimator::MockPoseEstimator;
pub use motion::ScriptedMotion;
pub use persistence::{MemoryFusion, MemoryPersistence};
