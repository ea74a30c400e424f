//! Stable identity handles for input specs and modifiers.
//!
//! Pipeline invalidation compares inputs by identity, not by structural
//! equality: two lattices built from the same numbers are still distinct
//! inputs. Every spec and modifier is stamped with a process-unique handle at
//! construction, which keeps the comparison well-defined even after the value
//! has been cloned or moved across threads.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_raw() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identity handle for lattice/shape/symmetry specs and factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecId(u64);

impl SpecId {
    pub fn allocate() -> Self {
        Self(next_raw())
    }
}

/// Identity handle for modifier callables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModifierId(u64);

impl ModifierId {
    pub fn allocate() -> Self {
        Self(next_raw())
    }
}
