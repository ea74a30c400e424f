//! Translational symmetry: periodic reduction of the finite shape.
//!
//! When a symmetry is set, hoppings that leave the enumerated region wrap
//! around to the opposite boundary and carry the cartesian displacement of
//! the wrap. The Hamiltonian stage turns those displacements into Bloch
//! phase factors, which is why a symmetry forces complex arithmetic.

use crate::ident::SpecId;

#[derive(Debug, Clone)]
pub struct TranslationalSymmetry {
    id: SpecId,
    axes: Vec<usize>,
}

impl TranslationalSymmetry {
    /// Periodicity along the given lattice axes.
    pub fn along(axes: &[usize]) -> Self {
        Self {
            id: SpecId::allocate(),
            axes: axes.to_vec(),
        }
    }

    /// Periodicity along every axis of an `ndim`-dimensional lattice.
    pub fn full(ndim: usize) -> Self {
        Self::along(&(0..ndim).collect::<Vec<_>>())
    }

    pub fn id(&self) -> SpecId {
        self.id
    }

    pub fn is_periodic(&self, axis: usize) -> bool {
        self.axes.contains(&axis)
    }
}
