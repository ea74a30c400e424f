//! Lazy stage slots for the model pipeline.

use std::sync::Arc;

/// A lazily materialized pipeline stage.
///
/// Holds a reference-counted, immutable result. Invalidation always drops the
/// whole value; recomputation happens only on the next `get_or_build`, never
/// eagerly. The rebuild counter exists for diagnostics and invalidation-scope
/// tests.
#[derive(Debug)]
pub struct StageCache<T> {
    slot: Option<Arc<T>>,
    rebuilds: u64,
}

impl<T> Default for StageCache<T> {
    fn default() -> Self {
        Self {
            slot: None,
            rebuilds: 0,
        }
    }
}

impl<T> StageCache<T> {
    /// Return the cached value, building it first if the slot is empty.
    pub fn get_or_build<E>(
        &mut self,
        build: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        if let Some(value) = &self.slot {
            return Ok(value.clone());
        }
        let value = Arc::new(build()?);
        self.rebuilds += 1;
        self.slot = Some(value.clone());
        Ok(value)
    }

    /// Drop the cached value. The next access rebuilds from scratch; there is
    /// no partial rebuild.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    pub fn peek(&self) -> Option<&Arc<T>> {
        self.slot.as_ref()
    }

    pub fn is_cached(&self) -> bool {
        self.slot.is_some()
    }

    /// Number of times the slot has been materialized since construction.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}
