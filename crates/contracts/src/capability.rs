//! Capture capability traits
//!
//! Abstractions over the camera and the per-frame pose estimator, decoupling
//! the capture controller from concrete device implementations. Mock and
//! real implementations share the same interfaces.

use async_trait::async_trait;

use crate::{ClipData, KeypointSet, ScreenError, VideoFrame};

/// Per-frame keypoint detector.
///
/// Loading the underlying model is an explicit, awaitable, idempotent step:
/// calling `load` again after success is a no-op. A load failure is
/// reportable but non-fatal; capture proceeds in a degraded clip-only mode.
#[async_trait]
pub trait PoseEstimator: Send + Sync {
    /// Initialize the estimator. Idempotent.
    async fn load(&self) -> Result<(), ScreenError>;

    fn is_loaded(&self) -> bool;

    /// Estimate poses in the given frame.
    ///
    /// Returns the detected subject's keypoint set, or None when no subject
    /// is visible.
    async fn estimate(&self, frame: &VideoFrame) -> Result<Option<KeypointSet>, ScreenError>;
}

/// Live camera frame stream.
///
/// `next_frame` suspends until the next frame is available; a tick-driven
/// consumer awaiting it cannot overlap with itself.
#[async_trait]
pub trait CameraStream: Send {
    /// Next frame, or None when the stream has ended.
    async fn next_frame(&mut self) -> Option<VideoFrame>;
}

/// Background clip recorder, independent of the sampling loop.
///
/// `finalize` returns the clip exactly once; later calls return Ok(None) so
/// the explicit-stop and ceiling-timer paths can converge on it safely.
#[async_trait]
pub trait ClipRecorder: Send {
    async fn start(&mut self) -> Result<(), ScreenError>;

    fn is_recording(&self) -> bool;

    /// Stop and hand back the encoded clip. Second call is a no-op.
    async fn finalize(&mut self) -> Result<Option<ClipData>, ScreenError>;
}

/// Scoped camera resource.
///
/// Acquisition happens exactly once per capture attempt; `release` must be
/// idempotent and is called on every path that leaves capture.
#[async_trait]
pub trait CameraClient: Send + Sync {
    /// Acquire the device and return its frame stream plus clip recorder.
    async fn acquire(
        &self,
    ) -> Result<(Box<dyn CameraStream>, Box<dyn ClipRecorder>), ScreenError>;

    /// Release the device. Idempotent.
    fn release(&self);

    /// Whether the device is currently held.
    fn is_held(&self) -> bool;
}
