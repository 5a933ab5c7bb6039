//! VideoFrame - Camera output
//!
//! Raw frame and clip payload structures.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Pixel layout of a raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Rgb8,
    Bgra8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn stride(&self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Bgra8 => 4,
        }
    }
}

/// One raw camera frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoFrame {
    /// Frame width (pixels)
    pub width: u32,

    /// Frame height (pixels)
    pub height: u32,

    /// Pixel layout
    pub format: PixelFormat,

    /// Raw pixel data (zero-copy)
    pub data: Bytes,

    /// Seconds since session start
    pub timestamp: f64,
}

/// Downsampled still frame retained for review/thumbnailing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
    pub timestamp: f64,
}

/// Finalized recording handed off to clip storage.
#[derive(Debug, Clone)]
pub struct ClipData {
    /// Encoded clip bytes (opaque to this system)
    pub data: Bytes,

    /// MIME content type, e.g. "video/mp4"
    pub content_type: String,

    /// Recorded duration (seconds)
    pub duration_secs: f64,
}

/// Opaque storage reference returned by the clip store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRef(pub String);

impl std::fmt::Display for ClipRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
