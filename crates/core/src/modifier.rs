//! User-supplied perturbation callables.
//!
//! Modifiers come in two partitions. Structure modifiers (site state,
//! position) change which sites exist and where they sit; Hamiltonian
//! modifiers (onsite, hopping) perturb matrix values. The partition decides
//! how far an addition invalidates the pipeline.
//!
//! Modifiers work on whole arrays at once rather than site by site, so a
//! single virtual call covers the entire system.

use std::sync::Arc;

use num_complex::Complex64;

use crate::ident::ModifierId;

// ============================================================================
// Modifier traits
// ============================================================================

/// Common identity surface; sets deduplicate by this id.
pub trait Modifier {
    fn id(&self) -> ModifierId;
}

/// Switches sites on or off (vacancies, edges).
pub trait SiteStateModifier: Modifier {
    fn apply(&self, state: &mut [bool], positions: &[[f64; 3]], sublattices: &[usize]);
}

/// Displaces site positions (strain, relaxation).
pub trait PositionModifier: Modifier {
    fn apply(&self, positions: &mut [[f64; 3]], sublattices: &[usize]);
}

/// Perturbs onsite energies.
pub trait OnsiteModifier: Modifier {
    /// Declares whether the perturbation can produce complex values.
    fn is_complex(&self) -> bool {
        false
    }

    fn apply(&self, energies: &mut [Complex64], positions: &[[f64; 3]], sublattices: &[usize]);
}

/// Perturbs hopping energies.
pub trait HoppingModifier: Modifier {
    fn is_complex(&self) -> bool {
        false
    }

    fn apply(
        &self,
        energies: &mut [Complex64],
        from_positions: &[[f64; 3]],
        to_positions: &[[f64; 3]],
    );
}

// ============================================================================
// Ordered, deduplicated sets
// ============================================================================

/// Ordered collection with id-based deduplication. Re-adding a member is a
/// no-op and reports no change, so the caller knows not to invalidate.
pub struct ModifierSet<M: Modifier + ?Sized> {
    items: Vec<Arc<M>>,
}

impl<M: Modifier + ?Sized> Default for ModifierSet<M> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<M: Modifier + ?Sized> ModifierSet<M> {
    /// Add if absent (by id). Returns whether the set actually changed.
    pub fn add_unique(&mut self, modifier: Arc<M>) -> bool {
        if self.items.iter().any(|m| m.id() == modifier.id()) {
            return false;
        }
        self.items.push(modifier);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<M>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// The structure partition.
#[derive(Default)]
pub struct StructureModifiers {
    pub site_state: ModifierSet<dyn SiteStateModifier>,
    pub position: ModifierSet<dyn PositionModifier>,
}

impl StructureModifiers {
    pub fn clear(&mut self) {
        self.site_state.clear();
        self.position.clear();
    }
}

/// The Hamiltonian partition.
#[derive(Default)]
pub struct HamiltonianModifiers {
    pub onsite: ModifierSet<dyn OnsiteModifier>,
    pub hopping: ModifierSet<dyn HoppingModifier>,
}

impl HamiltonianModifiers {
    /// True if any member declares complex-valued output.
    pub fn any_complex(&self) -> bool {
        self.onsite.iter().any(|m| m.is_complex())
            || self.hopping.iter().any(|m| m.is_complex())
    }

    pub fn clear(&mut self) {
        self.onsite.clear();
        self.hopping.clear();
    }
}

// ============================================================================
// Closure adapters
// ============================================================================

struct FnSiteState<F> {
    id: ModifierId,
    f: F,
}

impl<F> Modifier for FnSiteState<F> {
    fn id(&self) -> ModifierId {
        self.id
    }
}

impl<F> SiteStateModifier for FnSiteState<F>
where
    F: Fn(&mut [bool], &[[f64; 3]], &[usize]),
{
    fn apply(&self, state: &mut [bool], positions: &[[f64; 3]], sublattices: &[usize]) {
        (self.f)(state, positions, sublattices);
    }
}

pub fn site_state_modifier<F>(f: F) -> Arc<dyn SiteStateModifier>
where
    F: Fn(&mut [bool], &[[f64; 3]], &[usize]) + 'static,
{
    Arc::new(FnSiteState {
        id: ModifierId::allocate(),
        f,
    })
}

struct FnPosition<F> {
    id: ModifierId,
    f: F,
}

impl<F> Modifier for FnPosition<F> {
    fn id(&self) -> ModifierId {
        self.id
    }
}

impl<F> PositionModifier for FnPosition<F>
where
    F: Fn(&mut [[f64; 3]], &[usize]),
{
    fn apply(&self, positions: &mut [[f64; 3]], sublattices: &[usize]) {
        (self.f)(positions, sublattices);
    }
}

pub fn position_modifier<F>(f: F) -> Arc<dyn PositionModifier>
where
    F: Fn(&mut [[f64; 3]], &[usize]) + 'static,
{
    Arc::new(FnPosition {
        id: ModifierId::allocate(),
        f,
    })
}

struct FnOnsite<F> {
    id: ModifierId,
    complex: bool,
    f: F,
}

impl<F> Modifier for FnOnsite<F> {
    fn id(&self) -> ModifierId {
        self.id
    }
}

impl<F> OnsiteModifier for FnOnsite<F>
where
    F: Fn(&mut [Complex64], &[[f64; 3]], &[usize]),
{
    fn is_complex(&self) -> bool {
        self.complex
    }

    fn apply(&self, energies: &mut [Complex64], positions: &[[f64; 3]], sublattices: &[usize]) {
        (self.f)(energies, positions, sublattices);
    }
}

/// `complex` declares whether `f` can write imaginary parts; it feeds the
/// scalar-type policy.
pub fn onsite_modifier<F>(complex: bool, f: F) -> Arc<dyn OnsiteModifier>
where
    F: Fn(&mut [Complex64], &[[f64; 3]], &[usize]) + 'static,
{
    Arc::new(FnOnsite {
        id: ModifierId::allocate(),
        complex,
        f,
    })
}

struct FnHopping<F> {
    id: ModifierId,
    complex: bool,
    f: F,
}

impl<F> Modifier for FnHopping<F> {
    fn id(&self) -> ModifierId {
        self.id
    }
}

impl<F> HoppingModifier for FnHopping<F>
where
    F: Fn(&mut [Complex64], &[[f64; 3]], &[[f64; 3]]),
{
    fn is_complex(&self) -> bool {
        self.complex
    }

    fn apply(
        &self,
        energies: &mut [Complex64],
        from_positions: &[[f64; 3]],
        to_positions: &[[f64; 3]],
    ) {
        (self.f)(energies, from_positions, to_positions);
    }
}

pub fn hopping_modifier<F>(complex: bool, f: F) -> Arc<dyn HoppingModifier>
where
    F: Fn(&mut [Complex64], &[[f64; 3]], &[[f64; 3]]) + 'static,
{
    Arc::new(FnHopping {
        id: ModifierId::allocate(),
        complex,
        f,
    })
}
