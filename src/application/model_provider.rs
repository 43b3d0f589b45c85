use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error, info};

use crate::application::ports::{Detector, DetectorLoader};
use crate::domain::{
    errors::DomainResult,
    model::{ModelTier, WeightsId},
};

type Slot = Arc<Mutex<Option<Arc<dyn Detector>>>>;

/// Detectors already constructed, keyed by weights identifier.
/// Entries are never evicted; only three tiers exist.
#[derive(Default)]
pub struct DetectorCache {
    slots: Mutex<HashMap<WeightsId, Slot>>,
}

impl DetectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, weights: &WeightsId) -> Slot {
        // a slot only ever holds a fully loaded detector, so a poisoned lock is still consistent
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(weights.clone()).or_default().clone()
    }

    /// Returns the cached detector or builds it with `load`.
    /// Only the slot for `weights` is locked during construction, so a weights id
    /// is loaded at most once while other tiers stay available.
    pub fn get_or_load<F>(&self, weights: &WeightsId, load: F) -> DomainResult<Arc<dyn Detector>>
    where
        F: FnOnce(&WeightsId) -> DomainResult<Arc<dyn Detector>>,
    {
        let slot = self.slot(weights);
        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(detector) = entry.as_ref() {
            debug!(weights = %weights, "detector cache hit");
            return Ok(detector.clone());
        }

        let detector = load(weights)?;
        *entry = Some(detector.clone());
        Ok(detector)
    }

    fn filled(slot: &Slot) -> bool {
        slot.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn contains(&self, weights: &WeightsId) -> bool {
        let slot = self.slots.lock().unwrap_or_else(PoisonError::into_inner).get(weights).cloned();
        slot.is_some_and(|slot| Self::filled(&slot))
    }

    /// Number of detectors loaded so far.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> =
            self.slots.lock().unwrap_or_else(PoisonError::into_inner).values().cloned().collect();
        slots.iter().filter(|slot| Self::filled(slot)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves a model tier to a ready detector.
#[derive(Clone)]
pub struct ModelProvider {
    loader: Arc<dyn DetectorLoader>,
    cache: Arc<DetectorCache>,
}

impl ModelProvider {
    pub fn new(loader: Arc<dyn DetectorLoader>, cache: Arc<DetectorCache>) -> Self {
        Self { loader, cache }
    }

    pub fn get_detector(&self, tier: ModelTier) -> DomainResult<Arc<dyn Detector>> {
        let weights = tier.weights();
        self.cache.get_or_load(&weights, |w| {
            info!(tier = %tier, weights = %w, "loading detector");
            self.loader.load(w).map_err(|e| {
                error!(weights = %w, "detector load failed: {e}");
                e
            })
        })
    }

    pub fn cache(&self) -> &DetectorCache {
        &self.cache
    }
}
