//! Integration tests for conversions to and from sprs

use csrkit::utils::{from_sprs_csc, from_sprs_csr, to_sprs_csc, to_sprs_csr};
use csrkit::{IndexBase, SparseMatrixCSR};

/// Creates a test matrix with a specific pattern
fn create_test_matrix_csr() -> SparseMatrixCSR<f64> {
    // [ 1.0  0.0  2.0  0.0  0.0 ]
    // [ 0.0  3.0  0.0  0.0  4.0 ]
    // [ 0.0  0.0  5.0  0.0  0.0 ]
    // [ 6.0  0.0  0.0  7.0  0.0 ]
    // [ 0.0  0.0  8.0  0.0  9.0 ]
    SparseMatrixCSR::new(
        5, 5,
        vec![0, 2, 4, 5, 7, 9],
        vec![0, 2, 1, 4, 2, 0, 3, 2, 4],
        vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
    )
}

/// Creates a tridiagonal matrix in CSR format
fn create_tridiagonal_csr(n: usize) -> SparseMatrixCSR<f64> {
    let mut row_ptr = Vec::with_capacity(n + 1);
    let mut col_idx = Vec::new();
    let mut values = Vec::new();

    row_ptr.push(0);

    for i in 0..n {
        if i > 0 {
            col_idx.push(i - 1);
            values.push(1.0f64);
        }

        col_idx.push(i);
        values.push(2.0f64);

        if i < n - 1 {
            col_idx.push(i + 1);
            values.push(1.0f64);
        }

        row_ptr.push(col_idx.len());
    }

    SparseMatrixCSR::new(n, n, row_ptr, col_idx, values)
}

#[test]
fn test_csr_to_sprs_conversion() {
    let csr = create_test_matrix_csr();
    let sprs_mat = to_sprs_csr(&csr).unwrap();

    assert_eq!(sprs_mat.rows(), csr.n_rows);
    assert_eq!(sprs_mat.cols(), csr.n_cols);
    assert_eq!(sprs_mat.nnz(), csr.nnz());
    assert!(sprs_mat.is_csr());

    assert_eq!(sprs_mat.get(0, 2), Some(&2.0));
    assert_eq!(sprs_mat.get(3, 3), Some(&7.0));
    assert_eq!(sprs_mat.get(2, 3), None);
}

#[test]
fn test_one_based_to_sprs() {
    let csr = create_test_matrix_csr().rebased(IndexBase::One);
    let sprs_mat = to_sprs_csr(&csr).unwrap();

    assert_eq!(sprs_mat.get(0, 0), Some(&1.0));
    assert_eq!(sprs_mat.get(4, 4), Some(&9.0));
}

#[test]
fn test_sprs_to_csr_conversion() {
    let mut trip = sprs::TriMat::new((4, 4));
    trip.add_triplet(0, 0, 1.0);
    trip.add_triplet(0, 2, 2.0);
    trip.add_triplet(1, 1, 3.0);
    trip.add_triplet(2, 0, 4.0);
    trip.add_triplet(3, 3, 5.0);

    let csr = from_sprs_csr(trip.to_csr());

    assert_eq!(csr.n_rows, 4);
    assert_eq!(csr.nnz(), 5);

    let dense = csr.to_dense();
    assert_eq!(dense[[0, 2]], 2.0);
    assert_eq!(dense[[2, 0]], 4.0);
    assert_eq!(dense[[3, 3]], 5.0);
}

#[test]
fn test_csc_matches_sprs() {
    let csr = create_test_matrix_csr();
    let csc = csr.to_csc();

    let sprs_csc = to_sprs_csc(&csc).unwrap();
    assert!(sprs_csc.is_csc());

    let expected = to_sprs_csr(&csr).unwrap().to_csc();
    assert_eq!(from_sprs_csc(expected), csc);
    assert_eq!(from_sprs_csc(sprs_csc), csc);
}

#[test]
fn test_transpose_matches_sprs() {
    let a = create_tridiagonal_csr(10);
    let mut b = a.clone();
    // Make it non-symmetric
    b.values[1] = 7.0;

    let ours = b.transpose().unwrap();
    let theirs = from_sprs_csr(to_sprs_csr(&b).unwrap().transpose_view().to_csr());

    assert_eq!(ours, theirs);
    assert_eq!(a.transpose().unwrap(), a);
}
