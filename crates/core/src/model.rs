//! Pipeline orchestrator ("model"): cascading lazy stages with selective
//! invalidation.
//!
//! Stage dependency graph: Structure -> Hamiltonian -> {Solver, Greens}.
//! Every mutator checks identity (or value, for the wave vector) first and
//! invalidates only the downstream edges its input actually feeds. No stage
//! is ever partially rebuilt; invalidation drops the cached value whole and
//! the next read rebuilds it.

use std::sync::Arc;

use log::debug;

use crate::cache::StageCache;
use crate::calculation::Calculation;
use crate::error::Error;
use crate::hamiltonian::{self, Hamiltonian};
use crate::lattice::Lattice;
use crate::modifier::{
    HamiltonianModifiers, HoppingModifier, OnsiteModifier, PositionModifier, SiteStateModifier,
    StructureModifiers,
};
use crate::scalar::{select_scalar, Precision, ScalarKind};
use crate::shape::Shape;
use crate::solver::{Greens, GreensFactory, Solver, SolverFactory};
use crate::structure::{self, Structure};
use crate::symmetry::TranslationalSymmetry;

#[derive(Default)]
pub struct Model {
    lattice: Option<Arc<Lattice>>,
    shape: Option<Arc<Shape>>,
    symmetry: Option<Arc<TranslationalSymmetry>>,
    wave_vector: [f64; 3],
    precision: Precision,
    structure_modifiers: StructureModifiers,
    hamiltonian_modifiers: HamiltonianModifiers,
    solver_factory: Option<Arc<dyn SolverFactory>>,
    greens_factory: Option<Arc<dyn GreensFactory>>,

    structure: StageCache<Structure>,
    hamiltonian: StageCache<Hamiltonian>,
    solver: Option<Box<dyn Solver>>,
    greens: Option<Box<dyn Greens>>,
    solver_builds: u64,
    greens_builds: u64,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Mutators: idempotent-check-then-invalidate
    // ------------------------------------------------------------------

    pub fn set_lattice(&mut self, lattice: Arc<Lattice>) -> Result<(), Error> {
        if self.lattice.as_ref().map(|l| l.id()) == Some(lattice.id()) {
            return Ok(());
        }
        if lattice.sublattices.is_empty() {
            return Err(Error::InvalidConfiguration(
                "at least 1 sublattice must be specified",
            ));
        }
        if lattice.vectors.is_empty() {
            return Err(Error::InvalidConfiguration(
                "at least 1 lattice vector must be specified",
            ));
        }
        self.lattice = Some(lattice);
        debug!("model: lattice changed, invalidating structure + hamiltonian");
        self.structure.invalidate();
        self.hamiltonian.invalidate();
        Ok(())
    }

    pub fn set_shape(&mut self, shape: Arc<Shape>) {
        if self.shape.as_ref().map(|s| s.id()) == Some(shape.id()) {
            return;
        }
        self.shape = Some(shape);
        self.structure.invalidate();
        self.hamiltonian.invalidate();
    }

    pub fn set_symmetry(&mut self, symmetry: Arc<TranslationalSymmetry>) {
        if self.symmetry.as_ref().map(|s| s.id()) == Some(symmetry.id()) {
            return;
        }
        self.symmetry = Some(symmetry);
        self.structure.invalidate();
        self.hamiltonian.invalidate();
    }

    /// Wave vector comparison is by value, unlike the identity-based spec
    /// setters.
    pub fn set_wave_vector(&mut self, wave_vector: [f64; 3]) {
        if self.wave_vector == wave_vector {
            return;
        }
        self.wave_vector = wave_vector;
        self.hamiltonian.invalidate();
    }

    /// Requesting a different precision changes the scalar policy, so the
    /// Hamiltonian has to be rebuilt.
    pub fn set_precision(&mut self, precision: Precision) {
        if self.precision == precision {
            return;
        }
        self.precision = precision;
        self.hamiltonian.invalidate();
    }

    pub fn set_solver_factory(&mut self, factory: Arc<dyn SolverFactory>) {
        if self.solver_factory.as_ref().map(|f| f.id()) == Some(factory.id()) {
            return;
        }
        self.solver_factory = Some(factory);
        self.solver = None;
    }

    pub fn set_greens_factory(&mut self, factory: Arc<dyn GreensFactory>) {
        if self.greens_factory.as_ref().map(|f| f.id()) == Some(factory.id()) {
            return;
        }
        self.greens_factory = Some(factory);
        self.greens = None;
    }

    pub fn add_site_state_modifier(&mut self, modifier: Arc<dyn SiteStateModifier>) {
        if self.structure_modifiers.site_state.add_unique(modifier) {
            self.structure.invalidate();
            self.hamiltonian.invalidate();
        }
    }

    pub fn add_position_modifier(&mut self, modifier: Arc<dyn PositionModifier>) {
        if self.structure_modifiers.position.add_unique(modifier) {
            self.structure.invalidate();
            self.hamiltonian.invalidate();
        }
    }

    pub fn add_onsite_modifier(&mut self, modifier: Arc<dyn OnsiteModifier>) {
        if self.hamiltonian_modifiers.onsite.add_unique(modifier) {
            self.hamiltonian.invalidate();
        }
    }

    pub fn add_hopping_modifier(&mut self, modifier: Arc<dyn HoppingModifier>) {
        if self.hamiltonian_modifiers.hopping.add_unique(modifier) {
            self.hamiltonian.invalidate();
        }
    }

    // ------------------------------------------------------------------
    // Forced invalidation, no value change required
    // ------------------------------------------------------------------

    pub fn clear_symmetry(&mut self) {
        self.symmetry = None;
        self.structure.invalidate();
        self.hamiltonian.invalidate();
    }

    pub fn clear_structure_modifiers(&mut self) {
        self.structure_modifiers.clear();
        self.structure.invalidate();
        self.hamiltonian.invalidate();
    }

    pub fn clear_hamiltonian_modifiers(&mut self) {
        self.hamiltonian_modifiers.clear();
        self.hamiltonian.invalidate();
    }

    pub fn clear_modifiers(&mut self) {
        self.clear_structure_modifiers();
        self.clear_hamiltonian_modifiers();
    }

    pub fn clear_solver(&mut self) {
        self.solver = None;
    }

    pub fn clear_greens(&mut self) {
        self.greens = None;
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn lattice(&self) -> Option<&Arc<Lattice>> {
        self.lattice.as_ref()
    }

    pub fn shape(&self) -> Option<&Arc<Shape>> {
        self.shape.as_ref()
    }

    pub fn symmetry(&self) -> Option<&Arc<TranslationalSymmetry>> {
        self.symmetry.as_ref()
    }

    pub fn wave_vector(&self) -> [f64; 3] {
        self.wave_vector
    }

    pub fn structure_modifiers(&self) -> &StructureModifiers {
        &self.structure_modifiers
    }

    pub fn hamiltonian_modifiers(&self) -> &HamiltonianModifiers {
        &self.hamiltonian_modifiers
    }

    /// The materialized system, building it if the stage is empty.
    ///
    /// With no shape set, a single unbounded primitive cell is substituted
    /// and cached as the current shape.
    pub fn system(&mut self) -> Result<Arc<Structure>, Error> {
        let lattice = self
            .lattice
            .clone()
            .ok_or(Error::InvalidConfiguration("a lattice must be defined"))?;
        let shape = match &self.shape {
            Some(shape) => shape.clone(),
            None => {
                let substitute = Arc::new(Shape::primitive_cell());
                self.shape = Some(substitute.clone());
                substitute
            }
        };
        let symmetry = self.symmetry.clone();
        let modifiers = &self.structure_modifiers;
        self.structure.get_or_build(|| {
            Ok(structure::build(
                &lattice,
                &shape,
                symmetry.as_deref(),
                modifiers,
            ))
        })
    }

    /// The Hamiltonian, building Structure first if needed. The scalar type
    /// is chosen here: complex if any Hamiltonian modifier declares complex
    /// output or a symmetry is set, double precision only when requested.
    pub fn hamiltonian(&mut self) -> Result<Arc<Hamiltonian>, Error> {
        let structure = self.system()?;
        let kind = self.scalar_kind();
        let wave_vector = self.wave_vector;
        let modifiers = &self.hamiltonian_modifiers;
        self.hamiltonian.get_or_build(|| {
            Ok(hamiltonian::build(&structure, modifiers, wave_vector, kind))
        })
    }

    pub fn scalar_kind(&self) -> ScalarKind {
        select_scalar(
            self.hamiltonian_modifiers.any_complex(),
            self.symmetry.is_some(),
            self.precision,
        )
    }

    /// Acquire the solver and run the solve step. Solving is not cached:
    /// every call re-solves with current state. A cached adapter is kept only
    /// if its scalar type still matches the Hamiltonian's.
    pub fn solver(&mut self) -> Result<&mut dyn Solver, Error> {
        let factory = self
            .solver_factory
            .clone()
            .ok_or(Error::SolverNotConfigured)?;
        let hamiltonian = self.hamiltonian()?;

        let keep = match self.solver.as_mut() {
            Some(solver) => solver.try_set_hamiltonian(&hamiltonian),
            None => false,
        };
        if !keep {
            self.solver = Some(factory.create_for(&hamiltonian)?);
            self.solver_builds += 1;
        }

        match self.solver.as_mut() {
            Some(solver) => {
                solver.solve()?;
                Ok(solver.as_mut())
            }
            None => Err(Error::SolverNotConfigured),
        }
    }

    /// Symmetric to `solver()`, but Green's functions compute on demand, so
    /// there is no solve step here.
    pub fn greens(&mut self) -> Result<&mut dyn Greens, Error> {
        let factory = self
            .greens_factory
            .clone()
            .ok_or(Error::GreensNotConfigured)?;
        let hamiltonian = self.hamiltonian()?;

        let keep = match self.greens.as_mut() {
            Some(greens) => greens.try_set_hamiltonian(&hamiltonian),
            None => false,
        };
        if !keep {
            self.greens = Some(factory.create_for(&hamiltonian)?);
            self.greens_builds += 1;
        }

        match self.greens.as_mut() {
            Some(greens) => Ok(greens.as_mut()),
            None => Err(Error::GreensNotConfigured),
        }
    }

    // ------------------------------------------------------------------
    // Reports and result collection
    // ------------------------------------------------------------------

    /// Structure and Hamiltonian summaries; builds both as a side effect.
    pub fn build_report(&mut self) -> Result<String, Error> {
        let system_report = self.system()?.report();
        let hamiltonian_report = self.hamiltonian()?.report().to_string();
        Ok(format!("{system_report}\n{hamiltonian_report}"))
    }

    /// Solver and Green's summaries for whichever factories are configured;
    /// triggers a solve as a side effect.
    pub fn compute_report(&mut self, shortform: bool) -> Result<String, Error> {
        let mut report = String::new();
        if self.solver_factory.is_some() {
            report.push_str(&self.solver()?.report(shortform));
        }
        if self.greens_factory.is_some() {
            report.push_str(&self.greens()?.report(shortform));
        }
        Ok(report)
    }

    /// Bind the current structure into the aggregate, then let the configured
    /// adapters push their numerical products.
    pub fn calculate(&mut self, result: &mut Calculation) -> Result<(), Error> {
        result.system = Some(self.system()?);
        if self.solver_factory.is_some() {
            self.solver()?.accept(result);
        }
        if self.greens_factory.is_some() {
            self.greens()?.accept(result);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    pub fn structure_rebuilds(&self) -> u64 {
        self.structure.rebuilds()
    }

    pub fn hamiltonian_rebuilds(&self) -> u64 {
        self.hamiltonian.rebuilds()
    }

    pub fn solver_builds(&self) -> u64 {
        self.solver_builds
    }

    pub fn greens_builds(&self) -> u64 {
        self.greens_builds
    }

    pub fn structure_cached(&self) -> bool {
        self.structure.is_cached()
    }

    pub fn hamiltonian_cached(&self) -> bool {
        self.hamiltonian.is_cached()
    }

    /// Peek at the cached structure without triggering a build.
    pub fn cached_structure(&self) -> Option<Arc<Structure>> {
        self.structure.peek().cloned()
    }
}
