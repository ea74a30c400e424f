//! Hamiltonian assembly: structure + modifiers + wave vector -> sparse matrix.
//!
//! Assembly runs in canonical `Complex64` arithmetic and is narrowed to the
//! scalar kind the policy selected. Boundary-crossing links pick up the Bloch
//! phase `exp(i k.d)` where `d` is the unwrapped displacement of the link.

use std::sync::Arc;

use num_complex::Complex64;

use crate::modifier::HamiltonianModifiers;
use crate::scalar::{Scalar, ScalarKind};
use crate::sparse::{CsrMatrix, Triplets};
use crate::structure::Structure;

/// Matrix payload for one concrete scalar type.
#[derive(Debug)]
pub struct HamiltonianData<T: Scalar> {
    pub matrix: CsrMatrix<T>,
    report: String,
}

impl<T: Scalar> HamiltonianData<T> {
    pub fn new(matrix: CsrMatrix<T>) -> Self {
        let report = format!(
            "Hamiltonian: {}x{} sparse matrix, {} non-zero(s), scalar type {}",
            matrix.rows(),
            matrix.cols(),
            matrix.non_zeros(),
            T::KIND.name()
        );
        Self { matrix, report }
    }

    pub fn report(&self) -> &str {
        &self.report
    }
}

/// Tagged-variant sparse Hamiltonian. The scalar type is fixed at build time
/// and stays fixed until the stage is rebuilt.
#[derive(Clone)]
pub enum Hamiltonian {
    RealF32(Arc<HamiltonianData<f32>>),
    ComplexF32(Arc<HamiltonianData<num_complex::Complex32>>),
    RealF64(Arc<HamiltonianData<f64>>),
    ComplexF64(Arc<HamiltonianData<Complex64>>),
}

impl Hamiltonian {
    pub fn scalar_kind(&self) -> ScalarKind {
        match self {
            Hamiltonian::RealF32(_) => ScalarKind::RealF32,
            Hamiltonian::ComplexF32(_) => ScalarKind::ComplexF32,
            Hamiltonian::RealF64(_) => ScalarKind::RealF64,
            Hamiltonian::ComplexF64(_) => ScalarKind::ComplexF64,
        }
    }

    pub fn rows(&self) -> usize {
        match self {
            Hamiltonian::RealF32(data) => data.matrix.rows(),
            Hamiltonian::ComplexF32(data) => data.matrix.rows(),
            Hamiltonian::RealF64(data) => data.matrix.rows(),
            Hamiltonian::ComplexF64(data) => data.matrix.rows(),
        }
    }

    pub fn non_zeros(&self) -> usize {
        match self {
            Hamiltonian::RealF32(data) => data.matrix.non_zeros(),
            Hamiltonian::ComplexF32(data) => data.matrix.non_zeros(),
            Hamiltonian::RealF64(data) => data.matrix.non_zeros(),
            Hamiltonian::ComplexF64(data) => data.matrix.non_zeros(),
        }
    }

    pub fn report(&self) -> &str {
        match self {
            Hamiltonian::RealF32(data) => data.report(),
            Hamiltonian::ComplexF32(data) => data.report(),
            Hamiltonian::RealF64(data) => data.report(),
            Hamiltonian::ComplexF64(data) => data.report(),
        }
    }

    /// Payload access for a statically known scalar type. Returns `None` on a
    /// tag mismatch; this backs `try_set_hamiltonian` and factory dispatch.
    pub fn downcast<T: HamiltonianScalar>(&self) -> Option<Arc<HamiltonianData<T>>> {
        T::extract(self)
    }
}

/// Scalar types that have a `Hamiltonian` variant.
pub trait HamiltonianScalar: Scalar {
    fn extract(h: &Hamiltonian) -> Option<Arc<HamiltonianData<Self>>>;
    fn wrap(data: Arc<HamiltonianData<Self>>) -> Hamiltonian;
}

impl HamiltonianScalar for f32 {
    fn extract(h: &Hamiltonian) -> Option<Arc<HamiltonianData<f32>>> {
        match h {
            Hamiltonian::RealF32(data) => Some(data.clone()),
            _ => None,
        }
    }

    fn wrap(data: Arc<HamiltonianData<f32>>) -> Hamiltonian {
        Hamiltonian::RealF32(data)
    }
}

impl HamiltonianScalar for num_complex::Complex32 {
    fn extract(h: &Hamiltonian) -> Option<Arc<HamiltonianData<num_complex::Complex32>>> {
        match h {
            Hamiltonian::ComplexF32(data) => Some(data.clone()),
            _ => None,
        }
    }

    fn wrap(data: Arc<HamiltonianData<num_complex::Complex32>>) -> Hamiltonian {
        Hamiltonian::ComplexF32(data)
    }
}

impl HamiltonianScalar for f64 {
    fn extract(h: &Hamiltonian) -> Option<Arc<HamiltonianData<f64>>> {
        match h {
            Hamiltonian::RealF64(data) => Some(data.clone()),
            _ => None,
        }
    }

    fn wrap(data: Arc<HamiltonianData<f64>>) -> Hamiltonian {
        Hamiltonian::RealF64(data)
    }
}

impl HamiltonianScalar for Complex64 {
    fn extract(h: &Hamiltonian) -> Option<Arc<HamiltonianData<Complex64>>> {
        match h {
            Hamiltonian::ComplexF64(data) => Some(data.clone()),
            _ => None,
        }
    }

    fn wrap(data: Arc<HamiltonianData<Complex64>>) -> Hamiltonian {
        Hamiltonian::ComplexF64(data)
    }
}

/// Build the Hamiltonian for the selected scalar kind.
pub fn build(
    structure: &Structure,
    modifiers: &HamiltonianModifiers,
    wave_vector: [f64; 3],
    kind: ScalarKind,
) -> Hamiltonian {
    let n = structure.num_sites();

    // Onsite terms.
    let mut onsite: Vec<Complex64> = structure
        .onsite
        .iter()
        .map(|&energy| Complex64::new(energy, 0.0))
        .collect();
    for modifier in modifiers.onsite.iter() {
        modifier.apply(&mut onsite, &structure.positions, &structure.sublattices);
    }

    // Hopping terms, then modifiers, then Bloch phases on boundary links.
    let mut link_energies: Vec<Complex64> =
        structure.links.iter().map(|link| link.energy).collect();
    if !modifiers.hopping.is_empty() {
        let from_positions: Vec<[f64; 3]> = structure
            .links
            .iter()
            .map(|link| structure.positions[link.from])
            .collect();
        let to_positions: Vec<[f64; 3]> = structure
            .links
            .iter()
            .map(|link| {
                let base = structure.positions[link.to];
                [
                    base[0] + link.displacement[0],
                    base[1] + link.displacement[1],
                    base[2] + link.displacement[2],
                ]
            })
            .collect();
        for modifier in modifiers.hopping.iter() {
            modifier.apply(&mut link_energies, &from_positions, &to_positions);
        }
    }
    for (energy, link) in link_energies.iter_mut().zip(&structure.links) {
        if link.boundary {
            let phase = wave_vector[0] * link.displacement[0]
                + wave_vector[1] * link.displacement[1]
                + wave_vector[2] * link.displacement[2];
            *energy *= Complex64::new(0.0, phase).exp();
        }
    }

    match kind {
        ScalarKind::RealF32 => Hamiltonian::RealF32(assemble(structure, &onsite, &link_energies, n)),
        ScalarKind::ComplexF32 => {
            Hamiltonian::ComplexF32(assemble(structure, &onsite, &link_energies, n))
        }
        ScalarKind::RealF64 => Hamiltonian::RealF64(assemble(structure, &onsite, &link_energies, n)),
        ScalarKind::ComplexF64 => {
            Hamiltonian::ComplexF64(assemble(structure, &onsite, &link_energies, n))
        }
    }
}

fn assemble<T: Scalar>(
    structure: &Structure,
    onsite: &[Complex64],
    link_energies: &[Complex64],
    n: usize,
) -> Arc<HamiltonianData<T>> {
    let mut triplets = Triplets::new(n, n);
    for (site, &energy) in onsite.iter().enumerate() {
        if energy != Complex64::new(0.0, 0.0) {
            triplets.push(site, site, T::from_c64(energy));
        }
    }
    for (link, &energy) in structure.links.iter().zip(link_energies) {
        triplets.push(link.from, link.to, T::from_c64(energy));
        if link.from != link.to || link.boundary {
            triplets.push(link.to, link.from, T::from_c64(energy.conj()));
        }
    }
    Arc::new(HamiltonianData::new(triplets.build()))
}
