//! Adapter and factory contracts for eigensolvers and Green's functions.

use crate::calculation::Calculation;
use crate::error::Error;
use crate::hamiltonian::Hamiltonian;
use crate::ident::SpecId;
use crate::scalar::ScalarKind;

/// An eigensolver bound to exactly one scalar type.
pub trait Solver {
    /// Run the solve to convergence. Called on every `Model::solver()` access;
    /// the solve step itself is never cached.
    fn solve(&mut self) -> Result<(), Error>;

    /// Rebind to a rebuilt Hamiltonian. Succeeds only when the scalar types
    /// match; on success existing eigenpair state is kept as a recycling seed.
    /// Returns `false` (and mutates nothing) on a mismatch.
    fn try_set_hamiltonian(&mut self, hamiltonian: &Hamiltonian) -> bool;

    fn scalar_kind(&self) -> ScalarKind;

    fn report(&self, shortform: bool) -> String;

    /// Push this solver's numerical products into the aggregate.
    fn accept(&mut self, result: &mut Calculation);
}

/// Constructs a solver variant matching the Hamiltonian's scalar type.
///
/// Candidates are tried in a fixed priority order: single-real,
/// single-complex, double-real. A Hamiltonian outside that set fails with
/// `UnsupportedScalarType`.
pub trait SolverFactory {
    fn create_for(&self, hamiltonian: &Hamiltonian) -> Result<Box<dyn Solver>, Error>;

    /// Stable identity; the model treats re-setting the same factory as a
    /// no-op.
    fn id(&self) -> SpecId;
}

/// A Green's function engine bound to one scalar type. Unlike solvers it is
/// not re-run on access; it computes on demand.
pub trait Greens {
    fn try_set_hamiltonian(&mut self, hamiltonian: &Hamiltonian) -> bool;

    fn scalar_kind(&self) -> ScalarKind;

    fn report(&self, shortform: bool) -> String;

    fn accept(&mut self, result: &mut Calculation);
}

pub trait GreensFactory {
    fn create_for(&self, hamiltonian: &Hamiltonian) -> Result<Box<dyn Greens>, Error>;

    fn id(&self) -> SpecId;
}
