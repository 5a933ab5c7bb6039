//! Mock camera implementation
//!
//! Implements `CameraClient`, synthesizing frames at a configurable
//! frequency. Used for testing and development without a physical device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use contracts::{
    CameraClient, CameraStream, ClipData, ClipRecorder, PixelFormat, ScreenError, VideoFrame,
};
use tracing::debug;

/// Mock camera configuration
#[derive(Debug, Clone)]
pub struct MockCameraConfig {
    /// Frame frequency (Hz)
    pub frequency_hz: f64,
    /// Frame width (pixels)
    pub width: u32,
    /// Frame height (pixels)
    pub height: u32,
    /// Simulate a denied permission / missing device
    pub fail_acquire: bool,
}

impl Default for MockCameraConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 20.0,
            width: 64,
            height: 48,
            fail_acquire: false,
        }
    }
}

/// Mock camera device.
///
/// `acquire` hands out a frame stream plus clip recorder; `release` is
/// idempotent and ends the stream.
pub struct MockCamera {
    config: MockCameraConfig,
    held: Arc<AtomicBool>,
}

impl MockCamera {
    pub fn new(config: MockCameraConfig) -> Self {
        Self {
            config,
            held: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(MockCameraConfig::default())
    }
}

#[async_trait]
impl CameraClient for MockCamera {
    async fn acquire(
        &self,
    ) -> Result<(Box<dyn CameraStream>, Box<dyn ClipRecorder>), ScreenError> {
        if self.config.fail_acquire {
            return Err(ScreenError::camera_unavailable("permission denied"));
        }
        if self.held.swap(true, Ordering::SeqCst) {
            return Err(ScreenError::camera_unavailable("device already in use"));
        }

        debug!(
            frequency_hz = self.config.frequency_hz,
            width = self.config.width,
            height = self.config.height,
            "mock camera acquired"
        );

        let stream = MockCameraStream {
            config: self.config.clone(),
            held: self.held.clone(),
            frame_id: 0,
        };
        let recorder = MockClipRecorder {
            started_at_secs: None,
            finalized: false,
        };

        Ok((Box::new(stream), Box::new(recorder)))
    }

    fn release(&self) {
        if self.held.swap(false, Ordering::SeqCst) {
            debug!("mock camera released");
        }
    }

    fn is_held(&self) -> bool {
        self.held.load(Ordering::Relaxed)
    }
}

/// Frame stream paced at the configured frequency.
///
/// Timestamps are derived from the frame counter, not the wall clock, so
/// the produced session timeline is deterministic.
struct MockCameraStream {
    config: MockCameraConfig,
    held: Arc<AtomicBool>,
    frame_id: u64,
}

#[async_trait]
impl CameraStream for MockCameraStream {
    async fn next_frame(&mut self) -> Option<VideoFrame> {
        if !self.held.load(Ordering::Relaxed) {
            return None;
        }

        let interval = Duration::from_secs_f64(1.0 / self.config.frequency_hz);
        tokio::time::sleep(interval).await;

        if !self.held.load(Ordering::Relaxed) {
            return None;
        }

        let timestamp = self.frame_id as f64 / self.config.frequency_hz;
        self.frame_id += 1;

        let size = self.config.width as usize * self.config.height as usize * 3;
        Some(VideoFrame {
            width: self.config.width,
            height: self.config.height,
            format: PixelFormat::Rgb8,
            data: Bytes::from(vec![128u8; size]),
            timestamp,
        })
    }
}

/// In-memory clip recorder.
///
/// Tracks recording duration and synthesizes a small opaque payload on
/// finalization. Finalize-once: the second call returns Ok(None).
struct MockClipRecorder {
    started_at_secs: Option<std::time::Instant>,
    finalized: bool,
}

#[async_trait]
impl ClipRecorder for MockClipRecorder {
    async fn start(&mut self) -> Result<(), ScreenError> {
        if self.started_at_secs.is_none() {
            self.started_at_secs = Some(std::time::Instant::now());
            debug!("mock recorder started");
        }
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.started_at_secs.is_some() && !self.finalized
    }

    async fn finalize(&mut self) -> Result<Option<ClipData>, ScreenError> {
        if self.finalized {
            return Ok(None);
        }
        let Some(started) = self.started_at_secs else {
            return Ok(None);
        };

        self.finalized = true;
        let duration_secs = started.elapsed().as_secs_f64();

        // Opaque stand-in payload, ~4KiB per recorded second
        let size = ((duration_secs * 4096.0) as usize).max(1024);
        debug!(duration_secs, size, "mock recorder finalized");

        Ok(Some(ClipData {
            data: Bytes::from(vec![0u8; size]),
            content_type: "video/mp4".to_string(),
            duration_secs,
        }))
    }
}
