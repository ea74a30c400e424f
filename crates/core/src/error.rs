//! Error taxonomy for the model pipeline and the eigensolver adapters.

use crate::scalar::ScalarKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed pipeline input. Surfaced immediately; never
    /// retried.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// `solver()` was called before a solver factory was set.
    #[error("the eigensolver factory is not configured")]
    SolverNotConfigured,

    /// `greens()` was called before a Green's function factory was set.
    #[error("the Green's function factory is not configured")]
    GreensNotConfigured,

    /// No adapter variant matches the Hamiltonian's scalar type.
    #[error("no solver variant matches scalar type `{}`", .0.name())]
    UnsupportedScalarType(ScalarKind),

    /// The solver exhausted its bounded retry budget.
    #[error("eigensolver failed to converge within the refinement budget ({loops} loops)")]
    ConvergenceFailure { loops: usize },

    /// Unrecognized return code from the contour-integration routine.
    #[error("eigensolver returned error code {0}")]
    SolverError(i32),
}
