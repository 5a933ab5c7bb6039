//! Thumbnail frame sampler.
//!
//! Keeps a bounded ring of downsampled still frames for review, decoupled
//! from the analysis frame rate. Live capture samples every Nth analysis
//! tick so the buffer stays representative of the whole set rather than
//! just the tail.

use bytes::Bytes;
use contracts::{PixelFormat, Thumbnail, VideoFrame};
use image::imageops::FilterType;
use image::RgbImage;
use ringbuf::{traits::*, HeapRb};
use tracing::warn;

/// Sample count bounds for recorded-clip sampling.
const CLIP_MIN_SAMPLES: usize = 8;
const CLIP_MAX_SAMPLES: usize = 20;

/// Bounded ring of downsampled frames.
pub struct FrameSampler {
    ring: HeapRb<Thumbnail>,
    target_width: u32,
    decimation: u32,
    tick_count: u64,
}

impl std::fmt::Debug for FrameSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSampler")
            .field("len", &self.ring.occupied_len())
            .field("capacity", &self.ring.capacity().get())
            .field("ticks", &self.tick_count)
            .finish()
    }
}

impl FrameSampler {
    /// Create a sampler with the given ring capacity, target width and
    /// live-capture decimation factor.
    pub fn new(capacity: usize, target_width: u32, decimation: u32) -> Self {
        Self {
            ring: HeapRb::new(capacity.max(1)),
            target_width,
            decimation: decimation.max(1),
            tick_count: 0,
        }
    }

    /// Observe one analysis tick during live capture.
    ///
    /// Every Nth tick the frame is downsampled and retained. Returns true
    /// when this tick produced a thumbnail.
    pub fn observe_tick(&mut self, frame: &VideoFrame) -> bool {
        let tick = self.tick_count;
        self.tick_count += 1;

        if tick % self.decimation as u64 != 0 {
            return false;
        }

        match downsample(frame, self.target_width) {
            Some(thumb) => {
                self.push(thumb);
                true
            }
            None => {
                warn!(
                    width = frame.width,
                    height = frame.height,
                    "frame could not be downsampled, skipping thumbnail"
                );
                false
            }
        }
    }

    /// Insert a thumbnail, evicting the oldest when full.
    pub fn push(&mut self, thumbnail: Thumbnail) {
        if self.ring.is_full() {
            let _ = self.ring.try_pop();
        }
        let _ = self.ring.try_push(thumbnail);
    }

    /// Retained thumbnails, oldest first.
    pub fn thumbnails(&self) -> Vec<Thumbnail> {
        self.ring.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Drop all retained thumbnails and reset the tick counter.
    pub fn clear(&mut self) {
        while self.ring.try_pop().is_some() {}
        self.tick_count = 0;
    }
}

/// Evenly spaced sample timestamps across an already-recorded clip.
///
/// Sample count scales with duration, clamped to [8, 20].
pub fn clip_sample_plan(duration_secs: f64) -> Vec<f64> {
    if duration_secs <= 0.0 {
        return Vec::new();
    }

    let count = (duration_secs.round() as usize).clamp(CLIP_MIN_SAMPLES, CLIP_MAX_SAMPLES);
    (0..count)
        .map(|i| (i as f64 + 0.5) * duration_secs / count as f64)
        .collect()
}

/// Downsample a raw frame to the target width, keeping the aspect ratio.
fn downsample(frame: &VideoFrame, target_width: u32) -> Option<Thumbnail> {
    let rgb = to_rgb(frame)?;

    if frame.width <= target_width {
        return Some(Thumbnail {
            width: frame.width,
            height: frame.height,
            data: Bytes::from(rgb.into_raw()),
            timestamp: frame.timestamp,
        });
    }

    let target_height = ((frame.height as u64 * target_width as u64) / frame.width as u64)
        .max(1) as u32;
    let resized = image::imageops::resize(&rgb, target_width, target_height, FilterType::Triangle);

    Some(Thumbnail {
        width: target_width,
        height: target_height,
        data: Bytes::from(resized.into_raw()),
        timestamp: frame.timestamp,
    })
}

fn to_rgb(frame: &VideoFrame) -> Option<RgbImage> {
    let expected = frame.width as usize * frame.height as usize * frame.format.stride();
    if frame.data.len() != expected {
        return None;
    }

    match frame.format {
        PixelFormat::Rgb8 => RgbImage::from_raw(frame.width, frame.height, frame.data.to_vec()),
        PixelFormat::Bgra8 => {
            let mut rgb = Vec::with_capacity(frame.width as usize * frame.height as usize * 3);
            for px in frame.data.chunks_exact(4) {
                rgb.extend_from_slice(&[px[2], px[1], px[0]]);
            }
            RgbImage::from_raw(frame.width, frame.height, rgb)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(timestamp: f64) -> VideoFrame {
        VideoFrame {
            width: 64,
            height: 48,
            format: PixelFormat::Rgb8,
            data: Bytes::from(vec![128u8; 64 * 48 * 3]),
            timestamp,
        }
    }

    fn make_thumb(timestamp: f64) -> Thumbnail {
        Thumbnail {
            width: 8,
            height: 6,
            data: Bytes::from(vec![0u8; 8 * 6 * 3]),
            timestamp,
        }
    }

    #[test]
    fn test_ring_caps_at_capacity() {
        let mut sampler = FrameSampler::new(20, 320, 1);
        for i in 0..25 {
            sampler.push(make_thumb(i as f64));
        }

        assert_eq!(sampler.len(), 20);
        let thumbs = sampler.thumbnails();
        // Exactly the most recent 20 remain, oldest first
        assert_eq!(thumbs.first().unwrap().timestamp, 5.0);
        assert_eq!(thumbs.last().unwrap().timestamp, 24.0);
    }

    #[test]
    fn test_decimation_samples_every_nth_tick() {
        let mut sampler = FrameSampler::new(20, 320, 6);
        let mut sampled = 0;
        for i in 0..12 {
            if sampler.observe_tick(&make_frame(i as f64)) {
                sampled += 1;
            }
        }
        assert_eq!(sampled, 2); // ticks 0 and 6
    }

    #[test]
    fn test_small_frames_kept_unscaled() {
        let mut sampler = FrameSampler::new(20, 320, 1);
        assert!(sampler.observe_tick(&make_frame(0.0)));
        let thumb = &sampler.thumbnails()[0];
        assert_eq!((thumb.width, thumb.height), (64, 48));
    }

    #[test]
    fn test_downsample_keeps_aspect_ratio() {
        let frame = VideoFrame {
            width: 640,
            height: 480,
            format: PixelFormat::Rgb8,
            data: Bytes::from(vec![10u8; 640 * 480 * 3]),
            timestamp: 0.0,
        };
        let thumb = downsample(&frame, 320).unwrap();
        assert_eq!((thumb.width, thumb.height), (320, 240));
        assert_eq!(thumb.data.len(), 320 * 240 * 3);
    }

    #[test]
    fn test_clip_plan_bounds() {
        assert_eq!(clip_sample_plan(3.0).len(), 8);
        assert_eq!(clip_sample_plan(12.0).len(), 12);
        assert_eq!(clip_sample_plan(45.0).len(), 20);
        assert!(clip_sample_plan(0.0).is_empty());
    }

    #[test]
    fn test_clip_plan_is_monotonic_and_in_range() {
        let plan = clip_sample_plan(10.0);
        for pair in plan.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(plan.first().unwrap() > &0.0);
        assert!(plan.last().unwrap() < &10.0);
    }

    #[test]
    fn test_clear_resets_ticks() {
        let mut sampler = FrameSampler::new(5, 320, 6);
        sampler.observe_tick(&make_frame(0.0));
        sampler.clear();
        assert!(sampler.is_empty());
        // First tick after clear samples again
        assert!(sampler.observe_tick(&make_frame(1.0)));
    }
}
