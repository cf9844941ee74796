//! Preview resources for uploaded images and videos
//!
//! A preview is owned by exactly one `PreviewHandle`. Dropping the handle
//! releases the preview, so removing a record, replacing it, or clearing the
//! whole store each release its preview once and only once.

use axum::body::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct PreviewEntry {
    mime_type: String,
    bytes: Bytes,
}

/// Shared map of live previews, served at `/previews/{token}`
#[derive(Debug, Clone, Default)]
pub struct PreviewStore {
    inner: Arc<Mutex<HashMap<Uuid, PreviewEntry>>>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register preview bytes and return the owning handle
    pub fn create(&self, mime_type: impl Into<String>, bytes: Bytes) -> PreviewHandle {
        let token = Uuid::new_v4();
        self.lock().insert(
            token,
            PreviewEntry {
                mime_type: mime_type.into(),
                bytes,
            },
        );
        tracing::debug!(token = %token, "Preview created");
        PreviewHandle {
            token,
            store: self.clone(),
        }
    }

    /// MIME type and bytes of a live preview
    pub fn get(&self, token: Uuid) -> Option<(String, Bytes)> {
        self.lock()
            .get(&token)
            .map(|entry| (entry.mime_type.clone(), entry.bytes.clone()))
    }

    /// Number of live previews
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn release(&self, token: Uuid) {
        if self.lock().remove(&token).is_some() {
            tracing::debug!(token = %token, "Preview released");
        } else {
            tracing::warn!(token = %token, "Preview already released");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, PreviewEntry>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Owner of one preview; releases it on drop
#[derive(Debug)]
pub struct PreviewHandle {
    token: Uuid,
    store: PreviewStore,
}

impl PreviewHandle {
    pub fn token(&self) -> Uuid {
        self.token
    }

    /// URL path the dashboard uses to fetch this preview
    pub fn url(&self) -> String {
        preview_url(self.token)
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.store.release(self.token);
    }
}

pub fn preview_url(token: Uuid) -> String {
    format!("/previews/{}", token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_fetch() {
        let store = PreviewStore::new();
        let handle = store.create("image/png", Bytes::from_static(b"png-bytes"));

        let (mime, bytes) = store.get(handle.token()).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(&bytes[..], b"png-bytes");
        assert_eq!(handle.url(), format!("/previews/{}", handle.token()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_drop_releases_preview() {
        let store = PreviewStore::new();
        let handle = store.create("video/mp4", Bytes::from_static(b"mp4"));
        let token = handle.token();

        drop(handle);

        assert!(store.get(token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_handles_release_independently() {
        let store = PreviewStore::new();
        let first = store.create("image/jpeg", Bytes::from_static(b"a"));
        let second = store.create("image/jpeg", Bytes::from_static(b"b"));
        let second_token = second.token();

        drop(first);

        assert_eq!(store.len(), 1);
        assert!(store.get(second_token).is_some());
        drop(second);
        assert!(store.is_empty());
    }
}
