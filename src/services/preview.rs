use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Identifier of a registered preview resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewId(pub u64);

impl PreviewId {
    /// URI under which a front end can resolve the preview bytes.
    pub fn uri(self) -> String {
        format!("bytes://preview/{}", self.0)
    }
}

impl fmt::Display for PreviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview#{}", self.0)
    }
}

/// Registry of previewable image resources.
///
/// Every id returned by `create` must be passed to `release` exactly once.
/// [`PreviewHandle`] enforces that by releasing on drop.
pub trait PreviewStore: Send + Sync {
    fn create(&self, bytes: Vec<u8>) -> PreviewId;
    fn release(&self, id: PreviewId);
}

/// Owning handle to a preview resource; releases it when dropped.
pub struct PreviewHandle {
    id: PreviewId,
    store: Arc<dyn PreviewStore>,
}

impl PreviewHandle {
    pub fn create(store: Arc<dyn PreviewStore>, bytes: Vec<u8>) -> Self {
        let id = store.create(bytes);
        Self { id, store }
    }

    pub fn id(&self) -> PreviewId {
        self.id
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        log::debug!("releasing {}", self.id);
        self.store.release(self.id);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.id).finish()
    }
}

/// In-process preview registry keyed by [`PreviewId`].
#[derive(Default)]
pub struct MemoryPreviews {
    next: AtomicU64,
    entries: Mutex<HashMap<PreviewId, Arc<[u8]>>>,
}

impl MemoryPreviews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of a live preview, or `None` once released.
    pub fn bytes(&self, id: PreviewId) -> Option<Arc<[u8]>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Number of previews currently held.
    pub fn live(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PreviewStore for MemoryPreviews {
    fn create(&self, bytes: Vec<u8>) -> PreviewId {
        let id = PreviewId(self.next.fetch_add(1, Ordering::Relaxed) + 1);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::from(bytes));
        id
    }

    fn release(&self, id: PreviewId) {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if removed.is_none() {
            log::warn!("{id} released twice or never registered");
        }
    }
}
