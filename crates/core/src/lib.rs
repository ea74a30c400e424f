//! Core pipeline and solvers for the tbsolver tight-binding toolkit.

pub mod cache;
pub mod calculation;
pub mod dense;
pub mod error;
pub mod feast;
pub mod greens;
pub mod hamiltonian;
pub mod ident;
pub mod io;
pub mod lattice;
pub mod model;
pub mod modifier;
pub mod scalar;
pub mod shape;
pub mod solver;
pub mod sparse;
pub mod structure;
pub mod symmetry;

#[cfg(test)]
mod _tests_dense;
#[cfg(test)]
mod _tests_hamiltonian;
#[cfg(test)]
mod _tests_io;
#[cfg(test)]
mod _tests_sparse;
#[cfg(test)]
mod _tests_structure;
