#![cfg(test)]

use num_complex::Complex64;

use super::dense::DenseKernel;
use super::feast::{ContourKernel, KernelBuffers, KernelOutput, KernelRequest};
use super::scalar::Scalar;
use super::sparse::{CsrMatrix, Triplets};

fn run<T: Scalar>(
    matrix: &CsrMatrix<T>,
    energy_min: f64,
    energy_max: f64,
    guess: usize,
) -> (KernelOutput, KernelBuffers<T>) {
    let n = matrix.rows();
    let mut buffers = KernelBuffers::<T>::default();
    buffers.eigenvalues.resize(guess, T::real_from_f64(0.0));
    buffers.eigenvectors.resize(n * guess, T::zero());
    buffers.residuals.resize(guess, T::real_from_f64(0.0));
    let request = KernelRequest {
        matrix,
        energy_min,
        energy_max,
        subspace_guess: guess,
        warm_start: false,
        contour_points: 8,
        max_refinement_loops: 20,
        stop_criteria: 12,
        residual_convergence: false,
    };
    let output = DenseKernel::default().run(&request, &mut buffers);
    (output, buffers)
}

#[test]
fn window_selects_from_a_diagonal_matrix() {
    let mut triplets = Triplets::<f64>::new(3, 3);
    triplets.push(0, 0, 0.5);
    triplets.push(1, 1, 1.5);
    triplets.push(2, 2, 3.0);
    let matrix = triplets.build();

    let (output, buffers) = run(&matrix, 1.0, 4.0, 3);
    assert_eq!(output.return_code, 0);
    assert_eq!(output.final_size, 2);
    assert!((buffers.eigenvalues[0] - 1.5).abs() < 1e-9);
    assert!((buffers.eigenvalues[1] - 3.0).abs() < 1e-9);

    // The eigenvector of the diagonal entry 1.5 is the second basis vector.
    let column = &buffers.eigenvectors[0..3];
    assert!(column[0].abs() < 1e-9);
    assert!((column[1].abs() - 1.0).abs() < 1e-9);
    assert!(column[2].abs() < 1e-9);

    for k in 0..output.final_size {
        assert!(buffers.residuals[k] < 1e-9);
    }
}

#[test]
fn symmetric_two_by_two() {
    // [[2, 1], [1, 3]] has eigenvalues (5 +- sqrt(5)) / 2.
    let mut triplets = Triplets::<f64>::new(2, 2);
    triplets.push(0, 0, 2.0);
    triplets.push(0, 1, 1.0);
    triplets.push(1, 0, 1.0);
    triplets.push(1, 1, 3.0);
    let matrix = triplets.build();

    let (output, buffers) = run(&matrix, -10.0, 10.0, 2);
    assert_eq!(output.return_code, 0);
    assert_eq!(output.final_size, 2);
    let lo = (5.0 - 5.0f64.sqrt()) / 2.0;
    let hi = (5.0 + 5.0f64.sqrt()) / 2.0;
    assert!((buffers.eigenvalues[0] - lo).abs() < 1e-8);
    assert!((buffers.eigenvalues[1] - hi).abs() < 1e-8);
    assert!(output.error_trace < 1e-8);
}

#[test]
fn hermitian_pauli_y() {
    // [[0, -i], [i, 0]] has eigenvalues -1 and +1.
    let i = Complex64::new(0.0, 1.0);
    let mut triplets = Triplets::<Complex64>::new(2, 2);
    triplets.push(0, 1, -i);
    triplets.push(1, 0, i);
    let matrix = triplets.build();

    let (output, buffers) = run(&matrix, -2.0, 2.0, 2);
    assert_eq!(output.return_code, 0);
    assert_eq!(output.final_size, 2);
    assert!((buffers.eigenvalues[0] + 1.0).abs() < 1e-8);
    assert!((buffers.eigenvalues[1] - 1.0).abs() < 1e-8);
    for k in 0..2 {
        assert!(buffers.residuals[k] < 1e-8, "residual {}", buffers.residuals[k]);
    }
}

#[test]
fn larger_chain_stays_accurate() {
    // Open 6-site chain with hopping -1: eigenvalues -2 cos(pi k / 7).
    let n = 6;
    let mut triplets = Triplets::<f64>::new(n, n);
    for site in 0..n - 1 {
        triplets.push(site, site + 1, -1.0);
        triplets.push(site + 1, site, -1.0);
    }
    let matrix = triplets.build();

    let (output, buffers) = run(&matrix, -3.0, 3.0, n);
    assert_eq!(output.return_code, 0);
    assert_eq!(output.final_size, n);
    for k in 0..n {
        let expected = -2.0 * (std::f64::consts::PI * (k + 1) as f64 / 7.0).cos();
        assert!(
            (buffers.eigenvalues[k] - expected).abs() < 1e-8,
            "eigenvalue {k}: {} vs {expected}",
            buffers.eigenvalues[k]
        );
    }
}

#[test]
fn undersized_guess_reports_code_three() {
    let mut triplets = Triplets::<f64>::new(5, 5);
    for site in 0..5 {
        triplets.push(site, site, site as f64);
    }
    let matrix = triplets.build();

    let (output, _) = run(&matrix, -1.0, 10.0, 2);
    assert_eq!(output.return_code, 3);
    assert_eq!(output.final_size, 0);
    assert_eq!(output.suggested_size, 5, "how many states the window holds");
}

#[test]
fn empty_window_reports_code_one() {
    let mut triplets = Triplets::<f64>::new(3, 3);
    for site in 0..3 {
        triplets.push(site, site, site as f64);
    }
    let matrix = triplets.build();

    let (output, _) = run(&matrix, 50.0, 60.0, 3);
    assert_eq!(output.return_code, 1);
    assert_eq!(output.final_size, 0);
}

#[test]
fn empty_matrix_reports_code_one() {
    let matrix = Triplets::<f64>::new(0, 0).build();
    let (output, _) = run(&matrix, -1.0, 1.0, 1);
    assert_eq!(output.return_code, 1);
    assert_eq!(output.final_size, 0);
}
