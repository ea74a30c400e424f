#![cfg(test)]

use num_complex::Complex64;

use super::sparse::Triplets;

#[test]
fn builds_sorted_csr_from_unsorted_triplets() {
    let mut triplets = Triplets::<f64>::new(3, 3);
    triplets.push(2, 0, 5.0);
    triplets.push(0, 1, 2.0);
    triplets.push(1, 1, 3.0);
    triplets.push(0, 0, 1.0);
    let matrix = triplets.build();

    assert_eq!(matrix.rows(), 3);
    assert_eq!(matrix.cols(), 3);
    assert_eq!(matrix.non_zeros(), 4);
    assert_eq!(matrix.get(0, 0), 1.0);
    assert_eq!(matrix.get(0, 1), 2.0);
    assert_eq!(matrix.get(1, 1), 3.0);
    assert_eq!(matrix.get(2, 0), 5.0);
    assert_eq!(matrix.get(2, 2), 0.0);

    let entries: Vec<_> = matrix.entries().collect();
    assert_eq!(
        entries,
        vec![(0, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0), (2, 0, 5.0)]
    );
}

#[test]
fn duplicate_entries_are_summed() {
    let mut triplets = Triplets::<f64>::new(2, 2);
    triplets.push(0, 0, 1.5);
    triplets.push(1, 0, -1.0);
    triplets.push(0, 0, 2.5);
    let matrix = triplets.build();

    assert_eq!(matrix.non_zeros(), 2);
    assert_eq!(matrix.get(0, 0), 4.0);
    assert_eq!(matrix.get(1, 0), -1.0);
}

#[test]
fn empty_rows_are_represented() {
    let mut triplets = Triplets::<f64>::new(4, 4);
    triplets.push(3, 3, 9.0);
    let matrix = triplets.build();

    assert_eq!(matrix.non_zeros(), 1);
    for row in 0..3 {
        for col in 0..4 {
            assert_eq!(matrix.get(row, col), 0.0);
        }
    }
    assert_eq!(matrix.get(3, 3), 9.0);
}

#[test]
fn mul_vec_matches_dense_product() {
    // [[2, 1], [1, 3]] * [1, 2] = [4, 7]
    let mut triplets = Triplets::<f64>::new(2, 2);
    triplets.push(0, 0, 2.0);
    triplets.push(0, 1, 1.0);
    triplets.push(1, 0, 1.0);
    triplets.push(1, 1, 3.0);
    let matrix = triplets.build();

    let x = [1.0, 2.0];
    let mut y = [0.0; 2];
    matrix.mul_vec(&x, &mut y);
    assert_eq!(y, [4.0, 7.0]);
}

#[test]
fn complex_mul_vec() {
    // [[0, i], [-i, 0]] * [1, 1] = [i, -i]
    let i = Complex64::new(0.0, 1.0);
    let one = Complex64::new(1.0, 0.0);
    let mut triplets = Triplets::<Complex64>::new(2, 2);
    triplets.push(0, 1, i);
    triplets.push(1, 0, -i);
    let matrix = triplets.build();

    let x = [one, one];
    let mut y = [Complex64::new(0.0, 0.0); 2];
    matrix.mul_vec(&x, &mut y);
    assert_eq!(y, [i, -i]);
}
