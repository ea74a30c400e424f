//! Configuration file parsing.
//!
//! This module provides the types needed to load tight-binding jobs from
//! TOML files. The main type is `JobConfig`, which can be parsed from a TOML
//! file and turned into a configured `Model`.
//!
//! # File Format
//!
//! ```toml
//! [lattice]
//! vectors = [[1.0, 0.0, 0.0]]
//!
//! [[lattice.sublattices]]
//! name = "A"
//! offset = [0.0, 0.0, 0.0]
//! onsite = 0.0
//!
//! [[lattice.hoppings]]
//! relative_index = [1, 0, 0]
//! from = "A"
//! to = "A"
//! energy = -1.0
//!
//! [shape]
//! kind = "primitive"
//! cells = [4, 1, 1]
//!
//! wave_vector = [0.0, 0.0, 0.0]
//! precision = "single"
//!
//! [solver]
//! energy_min = -3.0
//! energy_max = 3.0
//! subspace_guess = 4
//!
//! [greens]
//! broadening = 0.05
//! ldos = { site = 0, energies = { start = -3.0, stop = 3.0, points = 101 } }
//! ```

use std::sync::Arc;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::feast::FeastFactory;
use crate::greens::{LdosRequest, SpectralGreensFactory};
use crate::lattice::Lattice;
use crate::model::Model;
use crate::scalar::Precision;
use crate::shape::Shape;
use crate::symmetry::TranslationalSymmetry;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("hopping references unknown sublattice `{0}`")]
    UnknownSublattice(String),
    #[error(transparent)]
    Model(#[from] Error),
}

// ============================================================================
// Lattice section
// ============================================================================

/// A hopping energy: either a plain real number or `{ re = ..., im = ... }`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnergyValue {
    Real(f64),
    Complex { re: f64, im: f64 },
}

impl From<EnergyValue> for Complex64 {
    fn from(value: EnergyValue) -> Self {
        match value {
            EnergyValue::Real(re) => Complex64::new(re, 0.0),
            EnergyValue::Complex { re, im } => Complex64::new(re, im),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SublatticeConfig {
    pub name: String,
    #[serde(default)]
    pub offset: [f64; 3],
    /// Bare onsite energy.
    #[serde(default)]
    pub onsite: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoppingConfig {
    /// Target cell relative to the source cell, in lattice-vector units.
    pub relative_index: [i32; 3],
    pub from: String,
    pub to: String,
    pub energy: EnergyValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatticeConfig {
    pub vectors: Vec<[f64; 3]>,
    pub sublattices: Vec<SublatticeConfig>,
    #[serde(default)]
    pub hoppings: Vec<HoppingConfig>,
}

impl LatticeConfig {
    fn build(&self) -> Result<Lattice, ConfigError> {
        let mut lattice = Lattice::new(self.vectors.clone());
        for sublattice in &self.sublattices {
            lattice.add_sublattice(&sublattice.name, sublattice.offset, sublattice.onsite);
        }
        for hopping in &self.hoppings {
            let from = lattice
                .sublattice_index(&hopping.from)
                .ok_or_else(|| ConfigError::UnknownSublattice(hopping.from.clone()))?;
            let to = lattice
                .sublattice_index(&hopping.to)
                .ok_or_else(|| ConfigError::UnknownSublattice(hopping.to.clone()))?;
            lattice.add_hopping(hopping.relative_index, from, to, hopping.energy);
        }
        Ok(lattice)
    }
}

// ============================================================================
// Shape & symmetry sections
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeConfig {
    Primitive {
        #[serde(default = "default_cells")]
        cells: [usize; 3],
    },
    Rectangle {
        width: f64,
        height: f64,
    },
    Circle {
        radius: f64,
    },
}

fn default_cells() -> [usize; 3] {
    [1, 1, 1]
}

impl ShapeConfig {
    fn build(&self) -> Shape {
        match *self {
            ShapeConfig::Primitive { cells } => Shape::primitive(cells),
            ShapeConfig::Rectangle { width, height } => Shape::rectangle(width, height),
            ShapeConfig::Circle { radius } => Shape::circle(radius),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymmetryConfig {
    /// Periodic lattice axes.
    pub axes: Vec<usize>,
}

// ============================================================================
// Solver & Green's sections
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub energy_min: f64,
    pub energy_max: f64,
    pub subspace_guess: usize,
    #[serde(default)]
    pub recycle_subspace: bool,
    #[serde(default)]
    pub verbose: bool,
}

impl SolverConfig {
    fn build(&self) -> FeastFactory {
        FeastFactory::new(self.energy_min, self.energy_max, self.subspace_guess)
            .recycle_subspace(self.recycle_subspace)
            .verbose(self.verbose)
    }
}

/// Energy sample points: either an explicit list or a uniform grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnergySamples {
    List(Vec<f64>),
    Linspace { start: f64, stop: f64, points: usize },
}

impl EnergySamples {
    pub fn expand(&self) -> Vec<f64> {
        match self {
            EnergySamples::List(values) => values.clone(),
            EnergySamples::Linspace { start, stop, points } => match points {
                0 => Vec::new(),
                1 => vec![*start],
                _ => {
                    let step = (stop - start) / (points - 1) as f64;
                    (0..*points).map(|i| start + step * i as f64).collect()
                }
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdosConfig {
    pub site: usize,
    pub energies: EnergySamples,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreensConfig {
    #[serde(default = "default_broadening")]
    pub broadening: f64,
    #[serde(default)]
    pub ldos: Option<LdosConfig>,
}

fn default_broadening() -> f64 {
    0.05
}

impl GreensConfig {
    fn build(&self) -> SpectralGreensFactory {
        let factory = SpectralGreensFactory::new(self.broadening);
        match &self.ldos {
            Some(ldos) => factory.with_ldos(LdosRequest {
                site: ldos.site,
                energies: ldos.energies.expand(),
            }),
            None => factory,
        }
    }
}

// ============================================================================
// Job Configuration
// ============================================================================

/// Configuration for a tight-binding job (loadable from TOML).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub lattice: LatticeConfig,
    #[serde(default)]
    pub shape: Option<ShapeConfig>,
    #[serde(default)]
    pub symmetry: Option<SymmetryConfig>,
    #[serde(default)]
    pub wave_vector: [f64; 3],
    #[serde(default)]
    pub precision: Precision,
    #[serde(default)]
    pub solver: Option<SolverConfig>,
    #[serde(default)]
    pub greens: Option<GreensConfig>,
}

impl JobConfig {
    /// Assemble a `Model` from the parsed sections. Nothing is computed yet;
    /// the pipeline stays lazy until the first report or calculation.
    pub fn build_model(&self) -> Result<Model, ConfigError> {
        let mut model = Model::new();
        model.set_lattice(Arc::new(self.lattice.build()?))?;
        if let Some(shape) = &self.shape {
            model.set_shape(Arc::new(shape.build()));
        }
        if let Some(symmetry) = &self.symmetry {
            model.set_symmetry(Arc::new(TranslationalSymmetry::along(&symmetry.axes)));
        }
        model.set_wave_vector(self.wave_vector);
        model.set_precision(self.precision);
        if let Some(solver) = &self.solver {
            model.set_solver_factory(Arc::new(solver.build()));
        }
        if let Some(greens) = &self.greens {
            model.set_greens_factory(Arc::new(greens.build()));
        }
        Ok(model)
    }
}
