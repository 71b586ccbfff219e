//! Keyed store of reference images and their lazily built feature sets.
//!
//! The map sits behind a `parking_lot::RwLock`; values are `Arc` snapshots,
//! so readers clone a handle and drop the lock before doing any work.
//! Replacing an entry never mutates the old one, and in-flight matches keep
//! using the snapshot they started with. Features are computed on first use
//! through a per-entry `OnceLock`, so concurrent first requests compute
//! them once and nobody observes a partial set.

use crate::error::ExtractionError;
use crate::features::{FeatureExtractor, FeatureSet};
use crate::image::RasterImage;
use crate::types::PuzzleId;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// One indexed reference image.
#[derive(Debug)]
pub struct IndexEntry {
    fingerprint: u64,
    image: Arc<RasterImage>,
    features: OnceLock<Result<Arc<FeatureSet>, ExtractionError>>,
}

impl IndexEntry {
    fn new(image: Arc<RasterImage>) -> Self {
        Self {
            fingerprint: image.content_hash(),
            image,
            features: OnceLock::new(),
        }
    }

    /// Content hash of the indexed image.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn image(&self) -> &Arc<RasterImage> {
        &self.image
    }

    pub fn is_built(&self) -> bool {
        self.features.get().is_some()
    }

    /// Extract on first call, then return the cached result.
    pub fn features(
        &self,
        extractor: &dyn FeatureExtractor,
    ) -> Result<Arc<FeatureSet>, ExtractionError> {
        self.features
            .get_or_init(|| {
                debug!(
                    "FeatureIndex: building features for {}x{} reference",
                    self.image.width(),
                    self.image.height()
                );
                extractor.extract(&self.image).map(Arc::new)
            })
            .clone()
    }
}

/// What [`FeatureIndex::insert`] did with the supplied image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Added,
    /// Same id, different pixels: the old entry was dropped.
    Replaced,
    /// Same id, same pixels: the existing entry (and its features) was kept.
    Unchanged,
}

#[derive(Debug, Default)]
pub struct FeatureIndex {
    entries: RwLock<HashMap<PuzzleId, Arc<IndexEntry>>>,
}

impl FeatureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: PuzzleId, image: RasterImage) -> InsertOutcome {
        let entry = Arc::new(IndexEntry::new(Arc::new(image)));
        let mut map = self.entries.write();
        let outcome = match map.get(&id) {
            Some(existing) if existing.fingerprint == entry.fingerprint => {
                return InsertOutcome::Unchanged;
            }
            Some(_) => InsertOutcome::Replaced,
            None => InsertOutcome::Added,
        };
        debug!("FeatureIndex::insert {} -> {:?}", id, outcome);
        map.insert(id, entry);
        outcome
    }

    pub fn get(&self, id: &PuzzleId) -> Option<Arc<IndexEntry>> {
        self.entries.read().get(id).cloned()
    }

    /// Remove an entry; returns whether it existed.
    pub fn invalidate(&self, id: &PuzzleId) -> bool {
        let removed = self.entries.write().remove(id).is_some();
        if removed {
            debug!("FeatureIndex::invalidate {}", id);
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, id: &PuzzleId) -> bool {
        self.entries.read().contains_key(id)
    }
}
