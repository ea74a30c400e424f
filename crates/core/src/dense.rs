//! Dense reference kernel for the contour-solver boundary.
//!
//! Stands in for the vendor FEAST library so the toolkit works without
//! external linkage: densify the matrix, diagonalize with cyclic Jacobi
//! rotations (complex matrices via the 2n x 2n real-symmetric embedding),
//! then report the eigenpairs inside the energy window using FEAST return
//! codes. The undersized-subspace code (3) and the empty-window code (1) are
//! produced exactly where the real library would produce them, so the
//! adapter's retry machinery is exercised identically.

use num_complex::Complex64;
use rayon::prelude::*;

use crate::feast::{ContourKernel, KernelBuffers, KernelOutput, KernelRequest};
use crate::scalar::Scalar;
use crate::sparse::CsrMatrix;

#[derive(Debug, Default, Clone)]
pub struct DenseKernel;

impl<T: Scalar> ContourKernel<T> for DenseKernel {
    fn run(
        &mut self,
        request: &KernelRequest<'_, T>,
        buffers: &mut KernelBuffers<T>,
    ) -> KernelOutput {
        let n = request.matrix.rows();
        if n == 0 {
            return KernelOutput {
                return_code: 1,
                refinement_loops: 0,
                suggested_size: request.subspace_guess,
                final_size: 0,
                error_trace: 0.0,
            };
        }

        let (values, vectors) = if T::KIND.is_complex() {
            hermitian_eig(request.matrix)
        } else {
            symmetric_eig(request.matrix)
        };

        let selected: Vec<usize> = (0..values.len())
            .filter(|&k| values[k] >= request.energy_min && values[k] <= request.energy_max)
            .collect();
        let count = selected.len();

        if count == 0 {
            return KernelOutput {
                return_code: 1,
                refinement_loops: 1,
                suggested_size: request.subspace_guess,
                final_size: 0,
                error_trace: 0.0,
            };
        }
        if count > request.subspace_guess {
            // The window holds more states than the guess: FEAST's "subspace
            // too small" condition.
            return KernelOutput {
                return_code: 3,
                refinement_loops: 1,
                suggested_size: count,
                final_size: 0,
                error_trace: 0.0,
            };
        }

        for (column, &k) in selected.iter().enumerate() {
            buffers.eigenvalues[column] = T::real_from_f64(values[k]);
            for row in 0..n {
                buffers.eigenvectors[column * n + row] = T::from_c64(vectors[k * n + row]);
            }
        }

        let residuals = compute_residuals(request.matrix, buffers, count, n);
        for (column, &residual) in residuals.iter().enumerate() {
            buffers.residuals[column] = T::real_from_f64(residual);
        }
        let error_trace = residuals.iter().sum::<f64>() / count as f64;

        KernelOutput {
            return_code: 0,
            refinement_loops: 1,
            suggested_size: (count + count / 2).max(1).min(request.subspace_guess),
            final_size: count,
            error_trace,
        }
    }
}

/// Relative residuals `||H v - e v|| / max(1, |e|)` per eigenpair column.
fn compute_residuals<T: Scalar>(
    matrix: &CsrMatrix<T>,
    buffers: &KernelBuffers<T>,
    count: usize,
    n: usize,
) -> Vec<f64> {
    (0..count)
        .into_par_iter()
        .map(|column| {
            let x = &buffers.eigenvectors[column * n..(column + 1) * n];
            let eigenvalue = T::real_to_f64(buffers.eigenvalues[column]);
            let mut y = vec![T::zero(); n];
            matrix.mul_vec(x, &mut y);
            let scale = T::from_c64(Complex64::new(eigenvalue, 0.0));
            let norm_sqr: f64 = y
                .iter()
                .zip(x)
                .map(|(&yi, &xi)| (yi - scale * xi).norm_sqr())
                .sum();
            norm_sqr.sqrt() / eigenvalue.abs().max(1.0)
        })
        .collect()
}

// ============================================================================
// Dense diagonalization
// ============================================================================

fn symmetric_eig<T: Scalar>(matrix: &CsrMatrix<T>) -> (Vec<f64>, Vec<Complex64>) {
    let n = matrix.rows();
    let mut dense = vec![0.0f64; n * n];
    for (row, col, value) in matrix.entries() {
        dense[row * n + col] += value.to_c64().re;
    }
    let (values, vectors) = jacobi(dense, n);
    let complex_vectors = vectors
        .iter()
        .map(|&v| Complex64::new(v, 0.0))
        .collect();
    (values, complex_vectors)
}

/// Hermitian eigendecomposition through the real-symmetric embedding
/// `[[A, -B], [B, A]]` of `H = A + iB`. Each eigenvalue of `H` shows up
/// twice; the duplicates are collapsed pairwise after sorting.
fn hermitian_eig<T: Scalar>(matrix: &CsrMatrix<T>) -> (Vec<f64>, Vec<Complex64>) {
    let n = matrix.rows();
    let m = 2 * n;
    let mut dense = vec![0.0f64; m * m];
    for (row, col, value) in matrix.entries() {
        let v = value.to_c64();
        dense[row * m + col] += v.re;
        dense[(row + n) * m + col + n] += v.re;
        dense[(row + n) * m + col] += v.im;
        dense[row * m + col + n] -= v.im;
    }
    let (values, vectors) = jacobi(dense, m);

    let mut out_values = Vec::with_capacity(n);
    let mut out_vectors = Vec::with_capacity(n * n);
    for pair in 0..n {
        let k = 2 * pair;
        out_values.push(values[k]);
        let column = &vectors[k * m..(k + 1) * m];
        for row in 0..n {
            out_vectors.push(Complex64::new(column[row], column[row + n]));
        }
    }
    (out_values, out_vectors)
}

/// Cyclic Jacobi diagonalization of a dense symmetric matrix.
///
/// Returns eigenvalues sorted ascending with matching column-major
/// eigenvectors.
fn jacobi(mut a: Vec<f64>, n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut v = vec![0.0f64; n * n];
    for i in 0..n {
        v[i * n + i] = 1.0;
    }

    let scale: f64 = (0..n)
        .map(|i| a[i * n + i].abs())
        .fold(1.0f64, f64::max);

    for _sweep in 0..100 {
        let off: f64 = off_diagonal_norm(&a, n);
        if off <= 1e-24 * scale * scale {
            break;
        }
        for p in 0..n.saturating_sub(1) {
            for q in (p + 1)..n {
                let apq = a[p * n + q];
                if apq.abs() <= 1e-300 {
                    continue;
                }
                let app = a[p * n + p];
                let aqq = a[q * n + q];
                let theta = 0.5 * (aqq - app) / apq;
                let t = if theta.abs() > 1e12 {
                    0.5 / theta
                } else {
                    theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt())
                };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                // A <- J^T A J, applied to rows then columns p and q.
                for k in 0..n {
                    let akp = a[k * n + p];
                    let akq = a[k * n + q];
                    a[k * n + p] = c * akp - s * akq;
                    a[k * n + q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p * n + k];
                    let aqk = a[q * n + k];
                    a[p * n + k] = c * apk - s * aqk;
                    a[q * n + k] = s * apk + c * aqk;
                }
                // V <- V J, columns p and q (column-major storage).
                for k in 0..n {
                    let vkp = v[p * n + k];
                    let vkq = v[q * n + k];
                    v[p * n + k] = c * vkp - s * vkq;
                    v[q * n + k] = s * vkp + c * vkq;
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        a[i * n + i]
            .partial_cmp(&a[j * n + j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let values = order.iter().map(|&i| a[i * n + i]).collect();
    let mut vectors = Vec::with_capacity(n * n);
    for &i in &order {
        vectors.extend_from_slice(&v[i * n..(i + 1) * n]);
    }
    (values, vectors)
}

fn off_diagonal_norm(a: &[f64], n: usize) -> f64 {
    let mut sum = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            sum += a[i * n + j] * a[i * n + j];
        }
    }
    sum
}
