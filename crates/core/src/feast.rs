//! Adaptive contour-integration eigensolver adapter.
//!
//! Wraps a FEAST-style contour kernel with automatic subspace-size recovery.
//! The kernel reports FEAST return codes: 0 success, 1 no eigenvalues in the
//! requested window (valid empty result), 3 subspace guess too small. The
//! adapter reacts with a bounded retry policy: grow the guess by x1.7, drop
//! the eigenpair buffers and call again, failing once the refinement-loop
//! budget is exhausted.

use std::sync::Arc;

use log::{debug, warn};

use crate::calculation::Calculation;
use crate::error::Error;
use crate::hamiltonian::{Hamiltonian, HamiltonianData, HamiltonianScalar};
use crate::ident::SpecId;
use crate::scalar::{Scalar, ScalarKind};
use crate::solver::{Solver, SolverFactory};

// ============================================================================
// Configuration & diagnostics
// ============================================================================

#[derive(Debug, Clone)]
pub struct FeastConfig {
    pub energy_min: f64,
    pub energy_max: f64,
    pub initial_size_guess: usize,
    /// Reuse previous eigenvectors as a warm start across re-solves.
    pub recycle_subspace: bool,
    pub is_verbose: bool,
    pub contour_points: usize,
    pub max_refinement_loops: usize,
    pub sp_stop_criteria: u32,
    pub dp_stop_criteria: u32,
    pub residual_convergence: bool,
}

impl FeastConfig {
    pub fn new(energy_min: f64, energy_max: f64, initial_size_guess: usize) -> Self {
        Self {
            energy_min,
            energy_max,
            initial_size_guess: initial_size_guess.max(1),
            recycle_subspace: false,
            is_verbose: false,
            contour_points: 8,
            max_refinement_loops: 20,
            sp_stop_criteria: 5,
            dp_stop_criteria: 12,
            residual_convergence: false,
        }
    }
}

/// Per-solve diagnostics, mirroring what the contour library reports.
#[derive(Debug, Clone, Default)]
pub struct FeastInfo {
    pub return_code: i32,
    pub refinement_loops: usize,
    pub recycle_warning: bool,
    pub recycle_warning_loops: usize,
    pub size_warning: bool,
    pub suggested_size: usize,
    pub final_size: usize,
    pub error_trace: f64,
    pub max_residual: f64,
}

// ============================================================================
// Kernel boundary
// ============================================================================

/// Inputs handed to the contour-integration routine for one invocation.
pub struct KernelRequest<'a, T: Scalar> {
    pub matrix: &'a crate::sparse::CsrMatrix<T>,
    pub energy_min: f64,
    pub energy_max: f64,
    pub subspace_guess: usize,
    /// Whether the eigenvector buffer holds a reusable warm start.
    pub warm_start: bool,
    pub contour_points: usize,
    pub max_refinement_loops: usize,
    /// Requested accuracy as a digit count (`10^-k` on the trace error).
    pub stop_criteria: u32,
    pub residual_convergence: bool,
}

/// Eigenpair buffers shared with the kernel. The eigenvector buffer is
/// column-major `(system_size, subspace_guess)`.
#[derive(Debug)]
pub struct KernelBuffers<T: Scalar> {
    pub eigenvalues: Vec<T::Real>,
    pub eigenvectors: Vec<T>,
    pub residuals: Vec<T::Real>,
}

impl<T: Scalar> Default for KernelBuffers<T> {
    fn default() -> Self {
        Self {
            eigenvalues: Vec::new(),
            eigenvectors: Vec::new(),
            residuals: Vec::new(),
        }
    }
}

impl<T: Scalar> KernelBuffers<T> {
    fn force_clear(&mut self) {
        self.eigenvalues.clear();
        self.eigenvectors.clear();
        self.residuals.clear();
    }
}

/// What the routine reports back.
#[derive(Debug, Clone, Copy)]
pub struct KernelOutput {
    pub return_code: i32,
    pub refinement_loops: usize,
    pub suggested_size: usize,
    pub final_size: usize,
    pub error_trace: f64,
}

/// The external contour-integration routine, specified at its interface
/// boundary. `dense::DenseKernel` is the in-process reference implementation.
pub trait ContourKernel<T: Scalar> {
    fn run(&mut self, request: &KernelRequest<'_, T>, buffers: &mut KernelBuffers<T>)
        -> KernelOutput;
}

// ============================================================================
// Adapter state machine
// ============================================================================

// One solve attempt walks these phases; the retry policy of the adapter is
// exactly the transition set, which keeps the bounded-retry guarantee
// testable.
enum Phase {
    Init,
    Solving,
    RecycleRefine,
    SizeRecover,
    Converged,
    Failed(Error),
}

pub struct Feast<T: HamiltonianScalar, K: ContourKernel<T>> {
    kernel: K,
    config: FeastConfig,
    info: FeastInfo,
    hamiltonian: Arc<HamiltonianData<T>>,
    buffers: KernelBuffers<T>,
    system_size: usize,
    /// Working subspace guess; grown on undersize failures.
    size_guess: usize,
    is_solved: bool,
}

impl<T: HamiltonianScalar, K: ContourKernel<T>> Feast<T, K> {
    pub fn with_kernel(hamiltonian: Arc<HamiltonianData<T>>, config: FeastConfig, kernel: K) -> Self {
        let size_guess = config.initial_size_guess;
        Self {
            kernel,
            config,
            info: FeastInfo::default(),
            hamiltonian,
            buffers: KernelBuffers::default(),
            system_size: 0,
            size_guess,
            is_solved: false,
        }
    }

    pub fn info(&self) -> &FeastInfo {
        &self.info
    }

    pub fn is_solved(&self) -> bool {
        self.is_solved
    }

    pub fn eigenvalues(&self) -> &[T::Real] {
        &self.buffers.eigenvalues[..self.info.final_size.min(self.buffers.eigenvalues.len())]
    }

    /// Column-major eigenvector block, `system_size` rows per column.
    pub fn eigenvectors(&self) -> &[T] {
        let len = (self.info.final_size * self.system_size).min(self.buffers.eigenvectors.len());
        &self.buffers.eigenvectors[..len]
    }

    fn grown(guess: usize) -> usize {
        ((guess as f64) * 1.7).ceil() as usize
    }

    fn call_kernel(&mut self) {
        // The warm-start flag must reflect the buffer state before sizing:
        // only data that survived from a previous pass can be recycled.
        let warm_start = self.config.recycle_subspace && !self.buffers.eigenvalues.is_empty();

        // Buffers are resized only when empty so warm-start data survives
        // retries within the same solve.
        if self.buffers.eigenvalues.is_empty() {
            if self.size_guess > self.system_size || self.size_guess == 0 {
                self.size_guess = self.system_size;
            }
            self.buffers
                .eigenvalues
                .resize(self.size_guess, T::real_from_f64(0.0));
            self.info.suggested_size = self.size_guess;
        }
        if self.buffers.residuals.is_empty() {
            self.buffers
                .residuals
                .resize(self.size_guess, T::real_from_f64(0.0));
        }
        if self.buffers.eigenvectors.is_empty() {
            self.buffers
                .eigenvectors
                .resize(self.system_size * self.size_guess, T::zero());
        }

        let request = KernelRequest {
            matrix: &self.hamiltonian.matrix,
            energy_min: self.config.energy_min,
            energy_max: self.config.energy_max,
            subspace_guess: self.size_guess,
            warm_start,
            contour_points: self.config.contour_points,
            max_refinement_loops: self.config.max_refinement_loops,
            stop_criteria: match T::KIND.precision() {
                crate::scalar::Precision::Single => self.config.sp_stop_criteria,
                crate::scalar::Precision::Double => self.config.dp_stop_criteria,
            },
            residual_convergence: self.config.residual_convergence,
        };
        let output = self.kernel.run(&request, &mut self.buffers);

        self.info.return_code = output.return_code;
        self.info.refinement_loops = output.refinement_loops;
        self.info.suggested_size = output.suggested_size;
        self.info.final_size = output.final_size;
        self.info.error_trace = output.error_trace;

        if self.config.is_verbose {
            debug!(
                "feast: code={} loops={} final={} suggested={} guess={}",
                output.return_code,
                output.refinement_loops,
                output.final_size,
                output.suggested_size,
                self.size_guess
            );
        }
    }

    fn classify(&self) -> Phase {
        let code = self.info.return_code;
        if self.config.recycle_subspace
            && (self.info.refinement_loops >= self.config.max_refinement_loops || code == 3)
        {
            return Phase::RecycleRefine;
        }
        match code {
            0 | 1 => Phase::Converged,
            3 => Phase::SizeRecover,
            other => Phase::Failed(Error::SolverError(other)),
        }
    }

    fn recycle_refine(&mut self) -> Phase {
        self.info.recycle_warning = true;
        self.info.recycle_warning_loops += self.info.refinement_loops;
        if self.info.recycle_warning_loops > 2 * self.config.max_refinement_loops {
            return Phase::Failed(Error::ConvergenceFailure {
                loops: self.info.recycle_warning_loops,
            });
        }
        // Clearing the buffers resets the working size back to the guess; if
        // the kernel's suggestion already matched it, the guess itself has to
        // grow.
        if self.info.suggested_size == self.size_guess {
            self.size_guess = Self::grown(self.size_guess);
        }
        warn!(
            "feast: refinement budget hit (loops={}), retrying with subspace guess {}",
            self.info.refinement_loops, self.size_guess
        );
        self.buffers.force_clear();
        Phase::Solving
    }

    fn size_recover(&mut self) -> Phase {
        self.info.size_warning = true;
        loop {
            if self.size_guess >= self.system_size {
                // Already probing the whole spectrum; growing further cannot
                // change the answer.
                return Phase::Failed(Error::ConvergenceFailure {
                    loops: self.info.refinement_loops,
                });
            }
            self.size_guess = Self::grown(self.size_guess);
            warn!(
                "feast: subspace guess too small, growing to {}",
                self.size_guess
            );
            self.buffers.force_clear();
            self.call_kernel();
            match self.info.return_code {
                0 => return Phase::Converged,
                3 => continue,
                _ => {
                    // Ran into a different error while trying to recover.
                    return Phase::Failed(Error::ConvergenceFailure {
                        loops: self.info.refinement_loops,
                    });
                }
            }
        }
    }

    fn finish(&mut self) {
        let found = self.info.final_size.min(self.buffers.residuals.len());
        self.info.max_residual = self.buffers.residuals[..found]
            .iter()
            .fold(0.0f64, |acc, &r| acc.max(T::real_to_f64(r)));
        if self.info.recycle_warning {
            self.info.refinement_loops += self.info.recycle_warning_loops;
        }
        self.is_solved = true;
    }
}

impl<T: HamiltonianScalar, K: ContourKernel<T>> Solver for Feast<T, K> {
    fn solve(&mut self) -> Result<(), Error> {
        let mut phase = Phase::Init;
        loop {
            phase = match phase {
                Phase::Init => {
                    self.system_size = self.hamiltonian.matrix.rows();
                    self.info.recycle_warning = false;
                    self.info.recycle_warning_loops = 0;
                    self.info.size_warning = false;
                    if !self.config.recycle_subspace {
                        self.buffers.force_clear();
                    }
                    Phase::Solving
                }
                Phase::Solving => {
                    self.call_kernel();
                    self.classify()
                }
                Phase::RecycleRefine => self.recycle_refine(),
                Phase::SizeRecover => self.size_recover(),
                Phase::Converged => {
                    self.finish();
                    return Ok(());
                }
                Phase::Failed(error) => {
                    self.is_solved = false;
                    return Err(error);
                }
            };
        }
    }

    fn try_set_hamiltonian(&mut self, hamiltonian: &Hamiltonian) -> bool {
        match hamiltonian.downcast::<T>() {
            Some(data) => {
                let resized = data.matrix.rows() != self.system_size;
                self.hamiltonian = data;
                self.is_solved = false;
                // Eigenpair buffers stay intact as a recycling seed, but only
                // while the system size holds: a warm start from a different
                // dimension is meaningless and would mis-size the buffers.
                if !self.config.recycle_subspace || resized {
                    self.buffers.force_clear();
                    self.size_guess = self.config.initial_size_guess;
                }
                true
            }
            None => false,
        }
    }

    fn scalar_kind(&self) -> ScalarKind {
        T::KIND
    }

    fn report(&self, shortform: bool) -> String {
        let mut report = String::new();
        if self.info.size_warning {
            report.push_str(&format!("Resized initial guess: {}\n", self.size_guess));
        }
        let ratio = if self.info.final_size > 0 {
            self.info.suggested_size as f64 / self.info.final_size as f64
        } else {
            0.0
        };
        if shortform {
            report.push_str(&format!(
                "Subspace({}|{}|{:.2}), Refinement({}|{:.2e}|{:.2e})",
                self.info.final_size,
                self.info.suggested_size,
                ratio,
                self.info.refinement_loops,
                self.info.error_trace,
                self.info.max_residual
            ));
        } else {
            report.push_str(&format!(
                "Final subspace size is {} | Suggested size is {} ({:.2} ratio)\n\
                 Converged after {} refinement loop(s)\n\
                 Error trace: {:.2e} | Max. residual: {:.2e}",
                self.info.final_size,
                self.info.suggested_size,
                ratio,
                self.info.refinement_loops,
                self.info.error_trace,
                self.info.max_residual
            ));
        }
        report
    }

    fn accept(&mut self, result: &mut Calculation) {
        result.eigenvalues = Some(
            self.eigenvalues()
                .iter()
                .map(|&v| T::real_to_f64(v))
                .collect(),
        );
        result.max_residual = Some(self.info.max_residual);
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Builds a `Feast` adapter matching the Hamiltonian's scalar type, backed by
/// the dense reference kernel.
pub struct FeastFactory {
    id: SpecId,
    config: FeastConfig,
}

impl FeastFactory {
    pub fn new(energy_min: f64, energy_max: f64, subspace_size_guess: usize) -> Self {
        Self {
            id: SpecId::allocate(),
            config: FeastConfig::new(energy_min, energy_max, subspace_size_guess),
        }
    }

    pub fn recycle_subspace(mut self, recycle: bool) -> Self {
        self.config.recycle_subspace = recycle;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.is_verbose = verbose;
        self
    }

    /// Tuning knobs for the contour routine.
    pub fn advanced(
        mut self,
        contour_points: usize,
        max_refinement_loops: usize,
        sp_stop_criteria: u32,
        dp_stop_criteria: u32,
        residual_convergence: bool,
    ) -> Self {
        self.config.contour_points = contour_points;
        self.config.max_refinement_loops = max_refinement_loops;
        self.config.sp_stop_criteria = sp_stop_criteria;
        self.config.dp_stop_criteria = dp_stop_criteria;
        self.config.residual_convergence = residual_convergence;
        self
    }

    fn make<T: HamiltonianScalar>(&self, data: Arc<HamiltonianData<T>>) -> Box<dyn Solver> {
        Box::new(Feast::with_kernel(
            data,
            self.config.clone(),
            crate::dense::DenseKernel::default(),
        ))
    }
}

impl SolverFactory for FeastFactory {
    fn create_for(&self, hamiltonian: &Hamiltonian) -> Result<Box<dyn Solver>, Error> {
        // Candidate scalar types in priority order: single-real,
        // single-complex, double-real. Double-complex is outside the
        // supported set.
        match hamiltonian {
            Hamiltonian::RealF32(data) => Ok(self.make(data.clone())),
            Hamiltonian::ComplexF32(data) => Ok(self.make(data.clone())),
            Hamiltonian::RealF64(data) => Ok(self.make(data.clone())),
            Hamiltonian::ComplexF64(_) => {
                Err(Error::UnsupportedScalarType(hamiltonian.scalar_kind()))
            }
        }
    }

    fn id(&self) -> SpecId {
        self.id
    }
}
