//! Materialized finite (or symmetry-reduced) lattice.

use std::collections::HashMap;

use num_complex::Complex64;

use crate::lattice::Lattice;
use crate::modifier::StructureModifiers;
use crate::shape::Shape;
use crate::symmetry::TranslationalSymmetry;

/// A directed hopping link between two materialized sites.
///
/// `displacement` is the cartesian translation that was unwrapped when the
/// link crosses a periodic boundary; it is zero for links inside the region
/// and feeds the Bloch phase during Hamiltonian assembly.
#[derive(Debug, Clone)]
pub struct Link {
    pub from: usize,
    pub to: usize,
    pub energy: Complex64,
    pub displacement: [f64; 3],
    pub boundary: bool,
}

/// The system: site positions, sublattice ids and neighbor topology, derived
/// deterministically from lattice + shape + symmetry + structure modifiers.
/// Immutable once built; shared by the Hamiltonian stage and by calculation
/// snapshots.
#[derive(Debug)]
pub struct Structure {
    pub positions: Vec<[f64; 3]>,
    pub sublattices: Vec<usize>,
    /// Bare onsite energy per site, folded in from the sublattice spec.
    pub onsite: Vec<f64>,
    pub links: Vec<Link>,
    boundary_links: usize,
}

impl Structure {
    pub fn num_sites(&self) -> usize {
        self.positions.len()
    }

    pub fn report(&self) -> String {
        format!(
            "System: {} site(s), {} hopping link(s) ({} across boundaries)",
            self.num_sites(),
            self.links.len(),
            self.boundary_links
        )
    }
}

pub fn build(
    lattice: &Lattice,
    shape: &Shape,
    symmetry: Option<&TranslationalSymmetry>,
    modifiers: &StructureModifiers,
) -> Structure {
    let ndim = lattice.ndim();
    let bounds = shape.cell_bounds(lattice);

    // Candidate sites are enumerated cell by cell in a fixed lexicographic
    // order so the result is deterministic.
    let cells = enumerate_cells(&bounds);

    let mut positions = Vec::new();
    let mut sublattices = Vec::new();
    let mut site_index: HashMap<([i32; 3], usize), usize> = HashMap::new();
    let mut site_cells = Vec::new();

    for &cell in &cells {
        for sub in 0..lattice.sublattices.len() {
            let pos = lattice.site_position(cell, sub);
            if !shape.contains(pos) {
                continue;
            }
            site_index.insert((cell, sub), positions.len());
            positions.push(pos);
            sublattices.push(sub);
            site_cells.push(cell);
        }
    }

    for modifier in modifiers.position.iter() {
        modifier.apply(&mut positions, &sublattices);
    }

    let mut state = vec![true; positions.len()];
    for modifier in modifiers.site_state.iter() {
        modifier.apply(&mut state, &positions, &sublattices);
    }

    // Compact away switched-off sites, remembering old -> new indices.
    let mut remap = vec![usize::MAX; positions.len()];
    let mut kept_positions = Vec::with_capacity(positions.len());
    let mut kept_sublattices = Vec::with_capacity(positions.len());
    let mut kept_onsite = Vec::with_capacity(positions.len());
    for (old, &alive) in state.iter().enumerate() {
        if alive {
            remap[old] = kept_positions.len();
            kept_positions.push(positions[old]);
            kept_sublattices.push(sublattices[old]);
            kept_onsite.push(lattice.sublattices[sublattices[old]].onsite_energy);
        }
    }

    let mut links = Vec::new();
    let mut boundary_links = 0;
    for (old, &cell) in site_cells.iter().enumerate() {
        if remap[old] == usize::MAX {
            continue;
        }
        let sub = sublattices[old];
        for hopping in &lattice.hoppings {
            if hopping.from != sub {
                continue;
            }
            let mut target = cell;
            let mut displacement = [0.0; 3];
            let mut dropped = false;
            for axis in 0..ndim {
                target[axis] += hopping.relative_index[axis];
                let (lo, hi) = bounds[axis];
                if target[axis] < lo || target[axis] > hi {
                    let periodic = symmetry.map(|s| s.is_periodic(axis)).unwrap_or(false);
                    if !periodic {
                        dropped = true;
                        break;
                    }
                    let span = hi - lo + 1;
                    let wrapped = lo + (target[axis] - lo).rem_euclid(span);
                    let offset_cells = f64::from(target[axis] - wrapped);
                    let vector = lattice.vectors[axis];
                    displacement[0] += offset_cells * vector[0];
                    displacement[1] += offset_cells * vector[1];
                    displacement[2] += offset_cells * vector[2];
                    target[axis] = wrapped;
                }
            }
            if dropped {
                continue;
            }
            let Some(&old_target) = site_index.get(&(target, hopping.to)) else {
                continue;
            };
            if remap[old_target] == usize::MAX {
                continue;
            }
            let boundary = displacement != [0.0; 3];
            if boundary {
                boundary_links += 1;
            }
            links.push(Link {
                from: remap[old],
                to: remap[old_target],
                energy: hopping.energy,
                displacement,
                boundary,
            });
        }
    }

    Structure {
        positions: kept_positions,
        sublattices: kept_sublattices,
        onsite: kept_onsite,
        links,
        boundary_links,
    }
}

fn enumerate_cells(bounds: &[(i32, i32)]) -> Vec<[i32; 3]> {
    let capacity = bounds
        .iter()
        .map(|&(lo, hi)| (hi - lo + 1).max(0) as usize)
        .product();
    let mut cells = Vec::with_capacity(capacity);
    let mut cursor = [0i32; 3];
    fill_cells(bounds, 0, &mut cursor, &mut cells);
    cells
}

fn fill_cells(
    bounds: &[(i32, i32)],
    axis: usize,
    cursor: &mut [i32; 3],
    out: &mut Vec<[i32; 3]>,
) {
    if axis == bounds.len() {
        out.push(*cursor);
        return;
    }
    for value in bounds[axis].0..=bounds[axis].1 {
        cursor[axis] = value;
        fill_cells(bounds, axis + 1, cursor, out);
    }
}
