//! Revocable handles to playable bytes.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// Opaque, revocable reference to playable bytes held in memory.
///
/// Clones share the same underlying resource; releasing through any clone
/// revokes them all. Exactly one component owns release responsibility at a
/// time (the cache, once the handle has been inserted). The release counter
/// exists so cache-consistency tests can assert release-exactly-once; it is
/// not consulted at runtime.
#[derive(Clone)]
pub struct ResourceHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    id: Uuid,
    bytes: Mutex<Option<Arc<[u8]>>>,
    releases: AtomicU32,
}

impl ResourceHandle {
    /// Create a handle over playable bytes.
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: Uuid::new_v4(),
                bytes: Mutex::new(Some(bytes.into())),
                releases: AtomicU32::new(0),
            }),
        }
    }

    /// Unique identity of the underlying resource.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// The playable bytes, or `None` once the handle has been released.
    pub fn bytes(&self) -> Option<Arc<[u8]>> {
        self.inner.bytes.lock().expect("handle lock poisoned").clone()
    }

    /// Size of the playable bytes, zero once released.
    pub fn size_bytes(&self) -> u64 {
        self.bytes().map(|b| b.len() as u64).unwrap_or(0)
    }

    /// Whether the underlying resource has been released.
    pub fn is_released(&self) -> bool {
        self.inner.bytes.lock().expect("handle lock poisoned").is_none()
    }

    /// Release the underlying resource.
    ///
    /// Returns `true` if this call performed the revocation, `false` if the
    /// handle was already released. The counter records every call so tests
    /// can detect double-release defects.
    pub fn release(&self) -> bool {
        self.inner.releases.fetch_add(1, Ordering::SeqCst);
        self.inner
            .bytes
            .lock()
            .expect("handle lock poisoned")
            .take()
            .is_some()
    }

    /// Number of times `release` has been called on this resource.
    pub fn release_count(&self) -> u32 {
        self.inner.releases.load(Ordering::SeqCst)
    }
}

impl PartialEq for ResourceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ResourceHandle {}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("id", &self.inner.id)
            .field("released", &self.is_released())
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_visible_until_release() {
        let handle = ResourceHandle::new(vec![1u8, 2, 3]);
        assert_eq!(handle.size_bytes(), 3);
        assert!(!handle.is_released());

        assert!(handle.release());
        assert!(handle.is_released());
        assert!(handle.bytes().is_none());
        assert_eq!(handle.size_bytes(), 0);
    }

    #[test]
    fn test_release_is_effective_once() {
        let handle = ResourceHandle::new(vec![0u8; 4]);
        assert!(handle.release());
        assert!(!handle.release());
        assert_eq!(handle.release_count(), 2);
    }

    #[test]
    fn test_clones_share_the_resource() {
        let handle = ResourceHandle::new(vec![0u8; 4]);
        let clone = handle.clone();
        assert_eq!(handle, clone);

        assert!(clone.release());
        assert!(handle.is_released());
        assert_eq!(handle.release_count(), 1);
    }

    #[test]
    fn test_distinct_handles_differ() {
        let a = ResourceHandle::new(vec![0u8; 4]);
        let b = ResourceHandle::new(vec![0u8; 4]);
        assert_ne!(a, b);
    }
}
