#![cfg(test)]

use num_complex::{Complex32, Complex64};

use super::hamiltonian;
use super::lattice::Lattice;
use super::modifier::{
    hopping_modifier, onsite_modifier, HamiltonianModifiers, StructureModifiers,
};
use super::scalar::ScalarKind;
use super::shape::Shape;
use super::structure::{self, Structure};
use super::symmetry::TranslationalSymmetry;

fn chain_lattice(onsite: f64) -> Lattice {
    let mut lattice = Lattice::new(vec![[1.0, 0.0, 0.0]]);
    let a = lattice.add_sublattice("A", [0.0, 0.0, 0.0], onsite);
    lattice.add_hopping([1, 0, 0], a, a, -1.0);
    lattice
}

fn finite_chain(cells: usize, onsite: f64) -> Structure {
    let lattice = chain_lattice(onsite);
    let shape = Shape::primitive([cells, 1, 1]);
    structure::build(&lattice, &shape, None, &StructureModifiers::default())
}

#[test]
fn real_chain_assembles_hermitian_pairs() {
    let system = finite_chain(3, 0.0);
    let h = hamiltonian::build(
        &system,
        &HamiltonianModifiers::default(),
        [0.0; 3],
        ScalarKind::RealF32,
    );

    assert_eq!(h.scalar_kind(), ScalarKind::RealF32);
    assert_eq!(h.rows(), 3);
    // Two links, each stored in both directions; zero onsite drops out.
    assert_eq!(h.non_zeros(), 4);

    let data = h.downcast::<f32>().unwrap();
    assert_eq!(data.matrix.get(0, 1), -1.0);
    assert_eq!(data.matrix.get(1, 0), -1.0);
    assert_eq!(data.matrix.get(1, 2), -1.0);
    assert_eq!(data.matrix.get(2, 1), -1.0);
    assert_eq!(data.matrix.get(0, 2), 0.0);
    assert_eq!(data.matrix.get(0, 0), 0.0);
}

#[test]
fn onsite_energy_lands_on_the_diagonal() {
    let system = finite_chain(2, 0.75);
    let h = hamiltonian::build(
        &system,
        &HamiltonianModifiers::default(),
        [0.0; 3],
        ScalarKind::RealF64,
    );
    let data = h.downcast::<f64>().unwrap();
    assert_eq!(data.matrix.get(0, 0), 0.75);
    assert_eq!(data.matrix.get(1, 1), 0.75);
}

#[test]
fn onsite_modifier_perturbs_the_diagonal() {
    let system = finite_chain(2, 0.0);
    let mut modifiers = HamiltonianModifiers::default();
    modifiers.onsite.add_unique(onsite_modifier(
        false,
        |energies, positions, _sublattices| {
            for (energy, pos) in energies.iter_mut().zip(positions) {
                *energy += Complex64::new(pos[0], 0.0);
            }
        },
    ));
    let h = hamiltonian::build(&system, &modifiers, [0.0; 3], ScalarKind::RealF64);
    let data = h.downcast::<f64>().unwrap();
    assert_eq!(data.matrix.get(0, 0), 0.0);
    assert_eq!(data.matrix.get(1, 1), 1.0);
}

#[test]
fn hopping_modifier_sees_unwrapped_target_positions() {
    let lattice = chain_lattice(0.0);
    let shape = Shape::primitive([2, 1, 1]);
    let symmetry = TranslationalSymmetry::along(&[0]);
    let system = structure::build(
        &lattice,
        &shape,
        Some(&symmetry),
        &StructureModifiers::default(),
    );

    let mut modifiers = HamiltonianModifiers::default();
    modifiers.hopping.add_unique(hopping_modifier(
        false,
        |energies, from_positions, to_positions| {
            for ((energy, from), to) in energies.iter_mut().zip(from_positions).zip(to_positions) {
                // Distance-dependent rescale. The wrapped link must present
                // its unwrapped image, distance 1, not the in-region distance.
                let dx = (to[0] - from[0]).abs();
                assert!((dx - 1.0).abs() < 1e-9);
                *energy *= 2.0;
            }
        },
    ));
    let h = hamiltonian::build(&system, &modifiers, [0.0; 3], ScalarKind::ComplexF32);
    let data = h.downcast::<Complex32>().unwrap();
    assert_eq!(data.matrix.get(0, 1), Complex32::new(-4.0, 0.0));
}

#[test]
fn bloch_phase_on_wrapped_links() {
    let lattice = chain_lattice(0.0);
    let shape = Shape::primitive([1, 1, 1]);
    let symmetry = TranslationalSymmetry::full(1);
    let system = structure::build(
        &lattice,
        &shape,
        Some(&symmetry),
        &StructureModifiers::default(),
    );

    // Single-site periodic chain: H(k) = -2 cos(k).
    for (k, expected) in [
        (0.0, -2.0f32),
        (std::f64::consts::PI, 2.0),
        (std::f64::consts::FRAC_PI_2, 0.0),
    ] {
        let h = hamiltonian::build(
            &system,
            &HamiltonianModifiers::default(),
            [k, 0.0, 0.0],
            ScalarKind::ComplexF32,
        );
        let data = h.downcast::<Complex32>().unwrap();
        let value = data.matrix.get(0, 0);
        assert!(
            (value.re - expected).abs() < 1e-5 && value.im.abs() < 1e-5,
            "k={k}: got {value}, expected {expected}"
        );
    }
}

#[test]
fn complex_hopping_stores_conjugate_transpose() {
    let system = finite_chain(2, 0.0);
    let mut modifiers = HamiltonianModifiers::default();
    modifiers.hopping.add_unique(hopping_modifier(
        true,
        |energies, _from, _to| {
            for energy in energies.iter_mut() {
                *energy = Complex64::new(0.0, 1.0);
            }
        },
    ));
    let h = hamiltonian::build(&system, &modifiers, [0.0; 3], ScalarKind::ComplexF32);
    let data = h.downcast::<Complex32>().unwrap();
    assert_eq!(data.matrix.get(0, 1), Complex32::new(0.0, 1.0));
    assert_eq!(data.matrix.get(1, 0), Complex32::new(0.0, -1.0));
}

#[test]
fn downcast_rejects_other_scalar_types() {
    let system = finite_chain(2, 0.0);
    let h = hamiltonian::build(
        &system,
        &HamiltonianModifiers::default(),
        [0.0; 3],
        ScalarKind::RealF32,
    );
    assert!(h.downcast::<f32>().is_some());
    assert!(h.downcast::<f64>().is_none());
    assert!(h.downcast::<Complex32>().is_none());
}

#[test]
fn report_names_size_and_scalar_type() {
    let system = finite_chain(3, 0.0);
    let h = hamiltonian::build(
        &system,
        &HamiltonianModifiers::default(),
        [0.0; 3],
        ScalarKind::RealF32,
    );
    assert_eq!(
        h.report(),
        "Hamiltonian: 3x3 sparse matrix, 4 non-zero(s), scalar type real f32"
    );
}
