//! In-memory clip storage collaborator.

use std::sync::Mutex;

use async_trait::async_trait;
use contracts::{ClipData, ClipRef, ClipStore, ScreenError};
use tracing::debug;
use uuid::Uuid;

/// Clip store backed by process memory. Only the storage key and size are
/// retained; the bytes themselves are opaque to this system.
#[derive(Default)]
pub struct MemoryClipStore {
    stored: Mutex<Vec<(ClipRef, usize)>>,
}

impl MemoryClipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clip_count(&self) -> usize {
        self.stored.lock().unwrap().len()
    }
}

#[async_trait]
impl ClipStore for MemoryClipStore {
    async fn store_clip(&self, clip: &ClipData) -> Result<ClipRef, ScreenError> {
        if clip.data.is_empty() {
            return Err(ScreenError::ClipStoreFailed {
                message: "empty clip payload".to_string(),
            });
        }

        let key = ClipRef(format!("clips/{}", Uuid::new_v4()));
        self.stored
            .lock()
            .unwrap()
            .push((key.clone(), clip.data.len()));

        debug!(key = %key, bytes = clip.data.len(), "clip stored");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_store_returns_opaque_key() {
        let store = MemoryClipStore::new();
        let clip = ClipData {
            data: Bytes::from(vec![1u8; 64]),
            content_type: "video/mp4".into(),
            duration_secs: 2.0,
        };

        let key = store.store_clip(&clip).await.unwrap();
        assert!(key.0.starts_with("clips/"));
        assert_eq!(store.clip_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_clip_rejected() {
        let store = MemoryClipStore::new();
        let clip = ClipData {
            data: Bytes::new(),
            content_type: "video/mp4".into(),
            duration_secs: 0.0,
        };
        assert!(store.store_clip(&clip).await.is_err());
    }
}
