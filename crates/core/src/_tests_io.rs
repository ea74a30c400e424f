#![cfg(test)]

use super::calculation::Calculation;
use super::io::{ConfigError, EnergySamples, JobConfig};
use super::scalar::ScalarKind;

const CHAIN_JOB: &str = r#"
wave_vector = [0.0, 0.0, 0.0]

[lattice]
vectors = [[1.0, 0.0, 0.0]]

[[lattice.sublattices]]
name = "A"

[[lattice.hoppings]]
relative_index = [1, 0, 0]
from = "A"
to = "A"
energy = -1.0

[shape]
kind = "primitive"
cells = [4, 1, 1]

[solver]
energy_min = -3.0
energy_max = 3.0
subspace_guess = 4
"#;

#[test]
fn chain_job_parses_and_runs() {
    let config: JobConfig = toml::from_str(CHAIN_JOB).unwrap();
    assert_eq!(config.lattice.sublattices.len(), 1);
    assert_eq!(config.lattice.hoppings.len(), 1);

    let mut model = config.build_model().unwrap();
    assert!(!model.structure_cached(), "building the model computes nothing");

    let mut result = Calculation::default();
    model.calculate(&mut result).unwrap();
    assert_eq!(result.system.unwrap().num_sites(), 4);
    assert_eq!(result.eigenvalues.unwrap().len(), 4);
}

#[test]
fn defaults_fill_the_optional_sections() {
    let minimal = r#"
[lattice]
vectors = [[1.0, 0.0, 0.0]]

[[lattice.sublattices]]
name = "A"
"#;
    let config: JobConfig = toml::from_str(minimal).unwrap();
    assert!(config.shape.is_none());
    assert!(config.symmetry.is_none());
    assert!(config.solver.is_none());
    assert!(config.greens.is_none());
    assert_eq!(config.wave_vector, [0.0; 3]);

    // No shape: one primitive cell is substituted.
    let mut model = config.build_model().unwrap();
    assert_eq!(model.system().unwrap().num_sites(), 1);
}

#[test]
fn unknown_sublattice_is_rejected() {
    let broken = r#"
[lattice]
vectors = [[1.0, 0.0, 0.0]]

[[lattice.sublattices]]
name = "A"

[[lattice.hoppings]]
relative_index = [1, 0, 0]
from = "A"
to = "B"
energy = -1.0
"#;
    let config: JobConfig = toml::from_str(broken).unwrap();
    let Err(error) = config.build_model() else {
        panic!("a hopping to an undeclared sublattice must be rejected");
    };
    assert!(matches!(error, ConfigError::UnknownSublattice(name) if name == "B"));
}

#[test]
fn complex_energy_and_symmetry_select_complex_scalars() {
    let periodic = r#"
precision = "single"

[lattice]
vectors = [[1.0, 0.0, 0.0]]

[[lattice.sublattices]]
name = "A"

[[lattice.hoppings]]
relative_index = [1, 0, 0]
from = "A"
to = "A"
energy = { re = -1.0, im = 0.5 }

[symmetry]
axes = [0]
"#;
    let config: JobConfig = toml::from_str(periodic).unwrap();
    let model = config.build_model().unwrap();
    assert_eq!(model.scalar_kind(), ScalarKind::ComplexF32);
}

#[test]
fn greens_section_wires_an_ldos_request() {
    let job = r#"
[lattice]
vectors = [[1.0, 0.0, 0.0]]

[[lattice.sublattices]]
name = "A"

[[lattice.hoppings]]
relative_index = [1, 0, 0]
from = "A"
to = "A"
energy = -1.0

[shape]
kind = "primitive"
cells = [2, 1, 1]

[greens]
broadening = 0.1
ldos = { site = 0, energies = { start = -2.0, stop = 2.0, points = 5 } }
"#;
    let config: JobConfig = toml::from_str(job).unwrap();
    let mut model = config.build_model().unwrap();
    let mut result = Calculation::default();
    model.calculate(&mut result).unwrap();
    let ldos = result.ldos.expect("the greens section requested ldos");
    assert_eq!(ldos.len(), 5);
    assert_eq!(ldos[0].energy, -2.0);
    assert_eq!(ldos[4].energy, 2.0);
}

#[test]
fn energy_samples_expand() {
    let list = EnergySamples::List(vec![1.0, 2.0]);
    assert_eq!(list.expand(), vec![1.0, 2.0]);

    let grid = EnergySamples::Linspace {
        start: 0.0,
        stop: 1.0,
        points: 3,
    };
    assert_eq!(grid.expand(), vec![0.0, 0.5, 1.0]);

    let single = EnergySamples::Linspace {
        start: 2.0,
        stop: 9.0,
        points: 1,
    };
    assert_eq!(single.expand(), vec![2.0]);
}
