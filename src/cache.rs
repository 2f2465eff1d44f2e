use std::sync::{Arc, Mutex, PoisonError};

use crate::formats::Dataset;
use crate::request::CacheKey;

/// Single-slot memo of the most recent successful load.
///
/// The slot is replaced on every `put`; a lookup with any other key misses.
/// There is no expiry. Concurrent loads for different keys race and the
/// last one to finish owns the slot.
#[derive(Debug, Default)]
pub struct LoadCache {
    slot: Mutex<Option<(CacheKey, Arc<Dataset>)>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Dataset>> {
        let guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some((cached_key, dataset)) if cached_key == key => Some(Arc::clone(dataset)),
            _ => None,
        }
    }

    pub fn put(&self, key: CacheKey, dataset: Arc<Dataset>) {
        let mut guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some((key, dataset));
    }

    pub fn clear(&self) {
        let mut guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    pub fn key(&self) -> Option<CacheKey> {
        let guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|(key, _)| key.clone())
    }
}
