//! Green's function engine over the spectral representation.
//!
//! `G(E) = sum_n |n><n| / (E - e_n + i eta)` from the full eigendecomposition
//! of the bound Hamiltonian. Adequate for the system sizes the dense
//! reference kernel handles; the trait boundary in `solver` leaves room for a
//! moment-expansion engine later.

use std::sync::Arc;

use num_complex::Complex64;

use crate::calculation::{Calculation, LdosSample};
use crate::dense::DenseKernel;
use crate::error::Error;
use crate::feast::{ContourKernel, KernelBuffers, KernelRequest};
use crate::hamiltonian::{Hamiltonian, HamiltonianData, HamiltonianScalar};
use crate::ident::SpecId;
use crate::scalar::ScalarKind;
use crate::solver::{Greens, GreensFactory};

/// LDOS computed during `Model::calculate` when requested up front.
#[derive(Debug, Clone)]
pub struct LdosRequest {
    pub site: usize,
    pub energies: Vec<f64>,
}

pub struct SpectralGreens<T: HamiltonianScalar> {
    hamiltonian: Arc<HamiltonianData<T>>,
    broadening: f64,
    ldos_request: Option<LdosRequest>,
    // Cached full spectrum; dropped on rebind.
    eigenvalues: Vec<f64>,
    eigenvectors: Vec<Complex64>,
    solved: bool,
}

impl<T: HamiltonianScalar> SpectralGreens<T> {
    pub fn new(
        hamiltonian: Arc<HamiltonianData<T>>,
        broadening: f64,
        ldos_request: Option<LdosRequest>,
    ) -> Self {
        Self {
            hamiltonian,
            broadening,
            ldos_request,
            eigenvalues: Vec::new(),
            eigenvectors: Vec::new(),
            solved: false,
        }
    }

    fn ensure_spectrum(&mut self) {
        if self.solved {
            return;
        }
        let n = self.hamiltonian.matrix.rows();
        let mut buffers = KernelBuffers::<T>::default();
        buffers.eigenvalues.resize(n, T::real_from_f64(0.0));
        buffers.eigenvectors.resize(n * n, T::zero());
        buffers.residuals.resize(n, T::real_from_f64(0.0));
        let request = KernelRequest {
            matrix: &self.hamiltonian.matrix,
            energy_min: f64::NEG_INFINITY,
            energy_max: f64::INFINITY,
            subspace_guess: n,
            warm_start: false,
            contour_points: 0,
            max_refinement_loops: 0,
            stop_criteria: 12,
            residual_convergence: false,
        };
        let mut kernel = DenseKernel;
        let output = kernel.run(&request, &mut buffers);
        let found = output.final_size;
        self.eigenvalues = buffers.eigenvalues[..found]
            .iter()
            .map(|&v| T::real_to_f64(v))
            .collect();
        self.eigenvectors = buffers.eigenvectors[..found * n]
            .iter()
            .map(|&v| v.to_c64())
            .collect();
        self.solved = true;
    }

    /// Diagonal Green's function element at one energy.
    pub fn diagonal(&mut self, site: usize, energy: f64) -> Complex64 {
        self.ensure_spectrum();
        let n = self.hamiltonian.matrix.rows();
        let mut sum = Complex64::new(0.0, 0.0);
        for (k, &eigenvalue) in self.eigenvalues.iter().enumerate() {
            let amplitude = self.eigenvectors[k * n + site];
            let weight = amplitude.norm_sqr();
            sum += weight / Complex64::new(energy - eigenvalue, self.broadening);
        }
        sum
    }

    /// Local density of states: `-Im G_ii(E) / pi`.
    pub fn ldos(&mut self, site: usize, energies: &[f64]) -> Vec<f64> {
        energies
            .iter()
            .map(|&energy| -self.diagonal(site, energy).im / std::f64::consts::PI)
            .collect()
    }
}

impl<T: HamiltonianScalar> Greens for SpectralGreens<T> {
    fn try_set_hamiltonian(&mut self, hamiltonian: &Hamiltonian) -> bool {
        match hamiltonian.downcast::<T>() {
            Some(data) => {
                self.hamiltonian = data;
                self.eigenvalues.clear();
                self.eigenvectors.clear();
                self.solved = false;
                true
            }
            None => false,
        }
    }

    fn scalar_kind(&self) -> ScalarKind {
        T::KIND
    }

    fn report(&self, shortform: bool) -> String {
        if shortform {
            format!(
                "Greens(spectral|{}|{:.1e})",
                self.eigenvalues.len(),
                self.broadening
            )
        } else {
            format!(
                "Green's function: spectral representation over {} state(s), broadening {:.1e}",
                self.eigenvalues.len(),
                self.broadening
            )
        }
    }

    fn accept(&mut self, result: &mut Calculation) {
        let Some(request) = self.ldos_request.clone() else {
            return;
        };
        let densities = self.ldos(request.site, &request.energies);
        result.ldos = Some(
            request
                .energies
                .iter()
                .zip(densities)
                .map(|(&energy, density)| LdosSample { energy, density })
                .collect(),
        );
    }
}

/// Builds a `SpectralGreens` variant matching the Hamiltonian's scalar type,
/// with the same candidate priority as the solver factory.
pub struct SpectralGreensFactory {
    id: SpecId,
    broadening: f64,
    ldos_request: Option<LdosRequest>,
}

impl SpectralGreensFactory {
    pub fn new(broadening: f64) -> Self {
        Self {
            id: SpecId::allocate(),
            broadening,
            ldos_request: None,
        }
    }

    pub fn with_ldos(mut self, request: LdosRequest) -> Self {
        self.ldos_request = Some(request);
        self
    }

    fn make<T: HamiltonianScalar>(&self, data: Arc<HamiltonianData<T>>) -> Box<dyn Greens> {
        Box::new(SpectralGreens::new(
            data,
            self.broadening,
            self.ldos_request.clone(),
        ))
    }
}

impl GreensFactory for SpectralGreensFactory {
    fn create_for(&self, hamiltonian: &Hamiltonian) -> Result<Box<dyn Greens>, Error> {
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
