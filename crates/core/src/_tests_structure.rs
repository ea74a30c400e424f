#![cfg(test)]

use super::lattice::Lattice;
use super::modifier::{position_modifier, site_state_modifier, StructureModifiers};
use super::shape::Shape;
use super::structure;
use super::symmetry::TranslationalSymmetry;

/// 1D chain with one site per cell, nearest-neighbor hopping -1.
fn chain() -> Lattice {
    let mut lattice = Lattice::new(vec![[1.0, 0.0, 0.0]]);
    let a = lattice.add_sublattice("A", [0.0, 0.0, 0.0], 0.0);
    lattice.add_hopping([1, 0, 0], a, a, -1.0);
    lattice
}

#[test]
fn finite_chain_sites_and_links() {
    let lattice = chain();
    let shape = Shape::primitive([4, 1, 1]);
    let system = structure::build(&lattice, &shape, None, &StructureModifiers::default());

    assert_eq!(system.num_sites(), 4);
    assert_eq!(system.links.len(), 3, "open ends drop the outgoing hop");
    assert!(system.links.iter().all(|link| !link.boundary));
    assert_eq!(system.positions[0], [0.0, 0.0, 0.0]);
    assert_eq!(system.positions[3], [3.0, 0.0, 0.0]);
    assert_eq!(system.onsite, vec![0.0; 4]);
}

#[test]
fn periodic_chain_wraps_the_last_link() {
    let lattice = chain();
    let shape = Shape::primitive([4, 1, 1]);
    let symmetry = TranslationalSymmetry::along(&[0]);
    let system = structure::build(
        &lattice,
        &shape,
        Some(&symmetry),
        &StructureModifiers::default(),
    );

    assert_eq!(system.num_sites(), 4);
    assert_eq!(system.links.len(), 4);
    let wrapped: Vec<_> = system.links.iter().filter(|link| link.boundary).collect();
    assert_eq!(wrapped.len(), 1);
    assert_eq!(wrapped[0].from, 3);
    assert_eq!(wrapped[0].to, 0);
    // Unwrapped translation: 4 cells along the first lattice vector.
    assert_eq!(wrapped[0].displacement, [4.0, 0.0, 0.0]);
}

#[test]
fn single_cell_with_symmetry_links_to_its_own_image() {
    let lattice = chain();
    let shape = Shape::primitive([1, 1, 1]);
    let symmetry = TranslationalSymmetry::full(1);
    let system = structure::build(
        &lattice,
        &shape,
        Some(&symmetry),
        &StructureModifiers::default(),
    );

    assert_eq!(system.num_sites(), 1);
    assert_eq!(system.links.len(), 1);
    let link = &system.links[0];
    assert_eq!((link.from, link.to), (0, 0));
    assert!(link.boundary);
    assert_eq!(link.displacement, [1.0, 0.0, 0.0]);
}

#[test]
fn two_sublattice_cell() {
    let mut lattice = Lattice::new(vec![[1.0, 0.0, 0.0]]);
    let a = lattice.add_sublattice("A", [0.0, 0.0, 0.0], 0.5);
    let b = lattice.add_sublattice("B", [0.5, 0.0, 0.0], -0.5);
    lattice.add_hopping([0, 0, 0], a, b, -1.0);
    let shape = Shape::primitive([2, 1, 1]);
    let system = structure::build(&lattice, &shape, None, &StructureModifiers::default());

    assert_eq!(system.num_sites(), 4);
    assert_eq!(system.sublattices, vec![0, 1, 0, 1]);
    assert_eq!(system.onsite, vec![0.5, -0.5, 0.5, -0.5]);
    assert_eq!(system.links.len(), 2, "one intra-cell link per cell");
    assert_eq!(lattice.sublattice_index("B"), Some(b));
}

#[test]
fn vacancy_removes_site_and_its_links() {
    let lattice = chain();
    let shape = Shape::primitive([3, 1, 1]);
    let mut modifiers = StructureModifiers::default();
    // Switch off the middle site.
    modifiers.site_state.add_unique(site_state_modifier(
        |state, positions, _sublattices| {
            for (alive, pos) in state.iter_mut().zip(positions) {
                if (pos[0] - 1.0).abs() < 1e-9 {
                    *alive = false;
                }
            }
        },
    ));
    let system = structure::build(&lattice, &shape, None, &modifiers);

    assert_eq!(system.num_sites(), 2);
    assert!(
        system.links.is_empty(),
        "both chain links touched the removed site"
    );
    assert_eq!(system.positions[0], [0.0, 0.0, 0.0]);
    assert_eq!(system.positions[1], [2.0, 0.0, 0.0]);
}

#[test]
fn position_modifier_runs_before_site_state() {
    let lattice = chain();
    let shape = Shape::primitive([2, 1, 1]);
    let mut modifiers = StructureModifiers::default();
    modifiers.position.add_unique(position_modifier(
        |positions, _sublattices| {
            for pos in positions.iter_mut() {
                pos[1] += 0.25;
            }
        },
    ));
    modifiers.site_state.add_unique(site_state_modifier(
        |state, positions, _sublattices| {
            // Sees the displaced positions.
            for (alive, pos) in state.iter_mut().zip(positions) {
                assert!((pos[1] - 0.25).abs() < 1e-9);
                let _ = alive;
            }
        },
    ));
    let system = structure::build(&lattice, &shape, None, &modifiers);

    assert_eq!(system.num_sites(), 2);
    assert_eq!(system.positions[0], [0.0, 0.25, 0.0]);
    assert_eq!(system.positions[1], [1.0, 0.25, 0.0]);
}

#[test]
fn rectangle_shape_filters_by_position() {
    let lattice = chain();
    let shape = Shape::rectangle(2.2, 1.0);
    let system = structure::build(&lattice, &shape, None, &StructureModifiers::default());

    // |x| <= 1.1 keeps x in {-1, 0, 1}.
    assert_eq!(system.num_sites(), 3);
    let mut xs: Vec<f64> = system.positions.iter().map(|p| p[0]).collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(xs, vec![-1.0, 0.0, 1.0]);
}

#[test]
fn report_counts_sites_and_links() {
    let lattice = chain();
    let shape = Shape::primitive([3, 1, 1]);
    let symmetry = TranslationalSymmetry::along(&[0]);
    let system = structure::build(
        &lattice,
        &shape,
        Some(&symmetry),
        &StructureModifiers::default(),
    );
    assert_eq!(
        system.report(),
        "System: 3 site(s), 3 hopping link(s) (1 across boundaries)"
    );
}
