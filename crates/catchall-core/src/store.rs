//! Single-slot result store.
//!
//! Holds at most one [`CachedResult`]. A successful search overwrites the
//! slot wholesale; nothing is ever merged or appended. The value is built
//! completely before it is swapped in behind an `RwLock`, and readers get an
//! `Arc` snapshot, so a concurrent reader sees either the previous result or
//! the new one and never a partial write.

use std::sync::{Arc, PoisonError, RwLock};

use crate::models::CachedResult;

#[derive(Debug, Default)]
pub struct ResultStore {
    slot: RwLock<Option<Arc<CachedResult>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally replace the cached result. Returns the previous one.
    pub fn set(&self, result: CachedResult) -> Option<Arc<CachedResult>> {
        let next = Arc::new(result);
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.replace(next)
    }

    /// Snapshot of the current result, if any.
    pub fn get(&self) -> Option<Arc<CachedResult>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Drop the cached result. Only used when stale caches are not retained.
    pub fn clear(&self) -> Option<Arc<CachedResult>> {
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
