//! Minimal compressed-sparse-row matrix used for Hamiltonian storage.

use crate::scalar::Scalar;

/// Coordinate-format builder. Duplicate entries are summed during the CSR
/// conversion, which is what hermitian assembly relies on for wrapped
/// self-hoppings.
pub struct Triplets<T> {
    rows: usize,
    cols: usize,
    entries: Vec<(usize, usize, T)>,
}

impl<T: Scalar> Triplets<T> {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, row: usize, col: usize, value: T) {
        debug_assert!(row < self.rows && col < self.cols);
        self.entries.push((row, col, value));
    }

    pub fn build(mut self) -> CsrMatrix<T> {
        self.entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut merged: Vec<(usize, usize, T)> = Vec::with_capacity(self.entries.len());
        for (row, col, value) in self.entries {
            match merged.last_mut() {
                Some((r, c, v)) if *r == row && *c == col => *v = *v + value,
                _ => merged.push((row, col, value)),
            }
        }

        let mut row_ptr = vec![0usize; self.rows + 1];
        let mut col_idx = Vec::with_capacity(merged.len());
        let mut values = Vec::with_capacity(merged.len());
        for (row, col, value) in merged {
            row_ptr[row + 1] += 1;
            col_idx.push(col);
            values.push(value);
        }
        for row in 0..self.rows {
            row_ptr[row + 1] += row_ptr[row];
        }

        CsrMatrix {
            rows: self.rows,
            cols: self.cols,
            row_ptr,
            col_idx,
            values,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsrMatrix<T> {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Scalar> CsrMatrix<T> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn non_zeros(&self) -> usize {
        self.values.len()
    }

    /// Stored value at (row, col), or zero.
    pub fn get(&self, row: usize, col: usize) -> T {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        for k in start..end {
            if self.col_idx[k] == col {
                return self.values[k];
            }
        }
        T::zero()
    }

    /// y = A x
    pub fn mul_vec(&self, x: &[T], y: &mut [T]) {
        debug_assert_eq!(x.len(), self.cols);
        debug_assert_eq!(y.len(), self.rows);
        for row in 0..self.rows {
            let mut sum = T::zero();
            for k in self.row_ptr[row]..self.row_ptr[row + 1] {
                sum = sum + self.values[k] * x[self.col_idx[k]];
            }
            y[row] = sum;
        }
    }

    /// Iterate stored entries as (row, col, value).
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.rows).flat_map(move |row| {
            (self.row_ptr[row]..self.row_ptr[row + 1])
                .map(move |k| (row, self.col_idx[k], self.values[k]))
        })
    }
}
