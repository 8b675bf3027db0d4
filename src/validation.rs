//! Validation oracle: compares transform outputs against the reference
//! transforms, element by element.
//!
//! Values are only ever moved, never computed, so every comparison is exact.

use std::fmt::Debug;

use num_traits::Num;
use thiserror::Error;

use crate::matrix::permutation::is_bijection;
use crate::matrix::{
    reference_csr2csc, reference_csrsort, Action, CscConversion, Permutation, SparseMatrixCSC,
    SparseMatrixCSR,
};

/// The first discrepancy found between an output and the oracle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An output array has the wrong length
    #[error("{array}: expected {expected} elements, got {got}")]
    LengthMismatch {
        /// Array name
        array: &'static str,
        /// Oracle length
        expected: usize,
        /// Output length
        got: usize,
    },

    /// An output element differs from the oracle
    #[error("{array}[{position}]: expected {expected}, got {got}")]
    ElementMismatch {
        /// Array name
        array: &'static str,
        /// First differing position
        position: usize,
        /// Oracle element, formatted
        expected: String,
        /// Output element, formatted
        got: String,
    },

    /// A permutation is not a bijection on `[0, nnz)`
    #[error("permutation of length {len} is not a bijection")]
    NotABijection {
        /// Permutation length
        len: usize,
    },

    /// A permutation was expected but not produced, or vice versa
    #[error("permutation presence: expected {expected}, got {got}")]
    PermutationPresence {
        /// Whether the oracle expects one
        expected: bool,
        /// Whether the output has one
        got: bool,
    },

    /// A row is not sorted after sorting
    #[error("row {row} is not sorted")]
    Unsorted {
        /// The offending row
        row: usize,
    },
}

/// Compares two arrays element-wise
pub fn compare_arrays<E>(array: &'static str, expected: &[E], got: &[E]) -> Result<(), ValidationError>
where
    E: PartialEq + Debug,
{
    if expected.len() != got.len() {
        return Err(ValidationError::LengthMismatch {
            array,
            expected: expected.len(),
            got: got.len(),
        });
    }

    match expected.iter().zip(got).position(|(e, g)| e != g) {
        Some(position) => Err(ValidationError::ElementMismatch {
            array,
            position,
            expected: format!("{:?}", expected[position]),
            got: format!("{:?}", got[position]),
        }),
        None => Ok(()),
    }
}

/// Checks that `perm` is a bijection and reproduces `expected` from `source`
pub fn check_permutation<T>(
    array: &'static str,
    perm: &Permutation,
    source: &[T],
    expected: &[T],
) -> Result<(), ValidationError>
where
    T: Copy + PartialEq + Debug,
{
    if perm.len() != source.len() {
        return Err(ValidationError::LengthMismatch {
            array: "perm",
            expected: source.len(),
            got: perm.len(),
        });
    }
    if !is_bijection(perm.as_slice()) {
        return Err(ValidationError::NotABijection { len: perm.len() });
    }
    compare_arrays(array, expected, &perm.gather(source))
}

/// Validates a CSR→CSC conversion of `input`
///
/// Pointer and index arrays must match the reference exactly. A numeric
/// conversion must carry the reference values; a symbolic conversion must
/// carry a permutation that reproduces them.
pub fn verify_csr2csc<T>(
    input: &SparseMatrixCSR<T>,
    action: Action,
    output: &CscConversion<T>,
) -> Result<(), ValidationError>
where
    T: Copy + Num + Debug,
{
    let (expected, expected_perm) = reference_csr2csc(input);
    let csc = &output.csc;

    compare_arrays("col_ptr", &expected.col_ptr, &csc.col_ptr)?;
    compare_arrays("row_idx", &expected.row_idx, &csc.row_idx)?;

    match (action, &output.permutation) {
        (Action::Numeric, None) => compare_arrays("csc_values", &expected.values, &csc.values),
        (Action::Symbolic, Some(perm)) => {
            compare_arrays("perm", expected_perm.as_slice(), perm.as_slice())?;
            check_permutation("csc_values", perm, &input.values, &expected.values)
        }
        (_, got) => Err(ValidationError::PermutationPresence {
            expected: action == Action::Symbolic,
            got: got.is_some(),
        }),
    }
}

/// Validates an in-place row sort
///
/// `original` is the matrix before sorting and `sorted` the matrix after.
/// When `perm` is given, values must be untouched and the permutation must
/// reproduce the reference order; otherwise values must have moved.
pub fn verify_csrsort<T>(
    original: &SparseMatrixCSR<T>,
    sorted: &SparseMatrixCSR<T>,
    perm: Option<&Permutation>,
) -> Result<(), ValidationError>
where
    T: Copy + Num + Debug,
{
    let (expected, _) = reference_csrsort(original);

    compare_arrays("row_ptr", &expected.row_ptr, &sorted.row_ptr)?;
    compare_arrays("col_idx", &expected.col_idx, &sorted.col_idx)?;
    check_rows_sorted(sorted)?;

    match perm {
        Some(perm) => {
            compare_arrays("csr_values", &original.values, &sorted.values)?;
            check_permutation("csr_values", perm, &original.values, &expected.values)
        }
        None => compare_arrays("csr_values", &expected.values, &sorted.values),
    }
}

/// Checks that every row's column indices are non-decreasing
pub fn check_rows_sorted<T>(csr: &SparseMatrixCSR<T>) -> Result<(), ValidationError>
where
    T: Copy + Num,
{
    for row in 0..csr.n_rows {
        let cols = &csr.col_idx[csr.row_range(row)];
        if cols.windows(2).any(|w| w[0] > w[1]) {
            return Err(ValidationError::Unsorted { row });
        }
    }
    Ok(())
}

/// All `(row, col, value)` triples of a CSR matrix in row-major order,
/// duplicates in stored order
pub fn csr_entries<T>(csr: &SparseMatrixCSR<T>) -> Vec<(usize, usize, T)>
where
    T: Copy + Num,
{
    (0..csr.n_rows)
        .flat_map(|i| csr.row_iter(i).map(move |(j, &v)| (i, j, v)))
        .collect()
}

/// All `(row, col, value)` triples of a CSC matrix, re-ordered row-major
///
/// The reorder is stable, so duplicates of a position keep their order
/// within the column.
pub fn csc_entries<T>(csc: &SparseMatrixCSC<T>) -> Vec<(usize, usize, T)>
where
    T: Copy + Num,
{
    let mut entries: Vec<(usize, usize, T)> = (0..csc.n_cols)
        .flat_map(|j| csc.col_iter(j).map(move |(i, &v)| (i, j, v)))
        .collect();
    entries.sort_by_key(|&(i, j, _)| (i, j));
    entries
}

/// Whether a CSR and a CSC matrix hold the same entries, duplicates included
///
/// Row-sorted CSR input is compared directly; unsorted rows are first put
/// into row-major order with a stable sort.
pub fn same_entries<T>(csr: &SparseMatrixCSR<T>, csc: &SparseMatrixCSC<T>) -> bool
where
    T: Copy + Num,
{
    if csr.n_rows != csc.n_rows || csr.n_cols != csc.n_cols {
        return false;
    }
    let mut lhs = csr_entries(csr);
    lhs.sort_by_key(|&(i, j, _)| (i, j));
    lhs == csc_entries(csc)
}
