//! Crystal lattice description: primitive vectors, sublattices, hoppings.

use num_complex::Complex64;

use crate::ident::SpecId;

/// A basis site within the unit cell.
#[derive(Debug, Clone)]
pub struct Sublattice {
    pub name: String,
    /// Cartesian offset from the cell origin.
    pub offset: [f64; 3],
    /// Bare onsite energy before modifiers.
    pub onsite_energy: f64,
}

/// A hopping term between sublattices, possibly into a neighboring cell.
#[derive(Debug, Clone)]
pub struct HoppingTerm {
    /// Target cell relative to the source cell, in lattice-vector units.
    pub relative_index: [i32; 3],
    pub from: usize,
    pub to: usize,
    pub energy: Complex64,
}

/// Immutable lattice spec. Referenced (shared) by the model, never copied
/// into it; invalidation compares the stable id.
#[derive(Debug, Clone)]
pub struct Lattice {
    id: SpecId,
    pub vectors: Vec<[f64; 3]>,
    pub sublattices: Vec<Sublattice>,
    pub hoppings: Vec<HoppingTerm>,
}

impl Lattice {
    pub fn new(vectors: Vec<[f64; 3]>) -> Self {
        Self {
            id: SpecId::allocate(),
            vectors,
            sublattices: Vec::new(),
            hoppings: Vec::new(),
        }
    }

    /// Register a sublattice and return its index.
    pub fn add_sublattice(
        &mut self,
        name: impl Into<String>,
        offset: [f64; 3],
        onsite_energy: f64,
    ) -> usize {
        self.sublattices.push(Sublattice {
            name: name.into(),
            offset,
            onsite_energy,
        });
        self.sublattices.len() - 1
    }

    pub fn add_hopping(
        &mut self,
        relative_index: [i32; 3],
        from: usize,
        to: usize,
        energy: impl Into<Complex64>,
    ) {
        self.hoppings.push(HoppingTerm {
            relative_index,
            from,
            to,
            energy: energy.into(),
        });
    }

    pub fn id(&self) -> SpecId {
        self.id
    }

    pub fn ndim(&self) -> usize {
        self.vectors.len()
    }

    pub fn sublattice_index(&self, name: &str) -> Option<usize> {
        self.sublattices.iter().position(|s| s.name == name)
    }

    /// Cartesian position of a sublattice site in the given cell.
    pub fn site_position(&self, cell: [i32; 3], sublattice: usize) -> [f64; 3] {
        let mut pos = self.sublattices[sublattice].offset;
        for (axis, vector) in self.vectors.iter().enumerate() {
            let n = f64::from(cell[axis]);
            pos[0] += n * vector[0];
            pos[1] += n * vector[1];
            pos[2] += n * vector[2];
        }
        pos
    }
}
