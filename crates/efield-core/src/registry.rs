use crate::charge::{ChargeError, ChargeId, PointChargeSource};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Membership set of active charge sources, keyed by host-assigned id.
///
/// Iteration is in ascending id order so every evaluation pass over the same
/// membership sees the sources in the same order.
#[derive(Clone, Debug, Default)]
pub struct ChargeRegistry {
    sources: BTreeMap<ChargeId, PointChargeSource>,
}

impl ChargeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source. Returns `Ok(false)` without touching the stored data
    /// if `id` is already active.
    pub fn activate(&mut self, id: ChargeId, source: PointChargeSource) -> Result<bool, ChargeError> {
        source.validate()?;
        if self.sources.contains_key(&id) {
            return Ok(false);
        }
        self.sources.insert(id, source);
        Ok(true)
    }

    /// Replace the data of an already active source (moved or edited).
    pub fn update(&mut self, id: ChargeId, source: PointChargeSource) -> Result<(), ChargeError> {
        source.validate()?;
        let slot = self.sources.get_mut(&id).ok_or(ChargeError::NotActive(id))?;
        *slot = source;
        Ok(())
    }

    pub fn deactivate(&mut self, id: ChargeId) -> Option<PointChargeSource> {
        self.sources.remove(&id)
    }

    pub fn clear(&mut self) {
        self.sources.clear();
    }

    pub fn contains(&self, id: ChargeId) -> bool {
        self.sources.contains_key(&id)
    }

    pub fn get(&self, id: ChargeId) -> Option<&PointChargeSource> {
        self.sources.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChargeId, &PointChargeSource)> {
        self.sources.iter().map(|(id, s)| (*id, s))
    }

    pub fn snapshot(&self) -> ChargeSnapshot {
        ChargeSnapshot {
            sources: self.sources.values().copied().collect(),
        }
    }
}

/// Immutable copy of the registry taken at the start of a pass. Cheap to
/// clone and safe to share across worker threads.
#[derive(Clone, Debug, Default)]
pub struct ChargeSnapshot {
    sources: Arc<[PointChargeSource]>,
}

impl ChargeSnapshot {
    /// Build a snapshot directly from a list, bypassing the registry.
    pub fn from_sources(sources: Vec<PointChargeSource>) -> Result<Self, ChargeError> {
        for s in &sources {
            s.validate()?;
        }
        Ok(Self {
            sources: sources.into(),
        })
    }

    pub fn sources(&self) -> &[PointChargeSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn max_exclusion_radius(&self) -> f64 {
        self.sources
            .iter()
            .map(|s| s.exclusion_radius)
            .fold(0.0, f64::max)
    }
}

/// Registry handle shared between the host (activation events) and the
/// samplers. Mutation holds the write lock; `snapshot` holds the read lock
/// only while copying, so a pass never observes a half-applied change.
#[derive(Clone, Debug, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<ChargeRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: ChargeRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn activate(&self, id: ChargeId, source: PointChargeSource) -> Result<bool, ChargeError> {
        self.write(|r| r.activate(id, source))
    }

    pub fn update(&self, id: ChargeId, source: PointChargeSource) -> Result<(), ChargeError> {
        self.write(|r| r.update(id, source))
    }

    pub fn deactivate(&self, id: ChargeId) -> Option<PointChargeSource> {
        self.write(|r| r.deactivate(id))
    }

    pub fn snapshot(&self) -> ChargeSnapshot {
        // Registry data stays consistent even if a writer panicked mid-call:
        // every mutation is a single map operation.
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Run several mutations under one write lock so a concurrent pass sees
    /// either none or all of them.
    pub fn write<T>(&self, f: impl FnOnce(&mut ChargeRegistry) -> T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
