//! Output aggregate filled by `Model::calculate`.

use std::sync::Arc;

use crate::structure::Structure;

/// One LDOS sample produced by the Green's function stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LdosSample {
    pub energy: f64,
    pub density: f64,
}

/// Collects whatever numerical products the configured solver and Green's
/// function adapters push after a solve. The bound structure snapshot keeps
/// the system alive for the lifetime of the result.
#[derive(Default)]
pub struct Calculation {
    pub system: Option<Arc<Structure>>,
    pub eigenvalues: Option<Vec<f64>>,
    pub max_residual: Option<f64>,
    pub ldos: Option<Vec<LdosSample>>,
}
