//! Reference transforms used as a correctness oracle
//!
//! These deliberately avoid the counting-sort scatter: they materialise every
//! entry as a tuple and lean on the standard library's stable sort, so they
//! agree with the fast paths only if those honour the same stability rule.

use num_traits::Num;

use crate::matrix::{Permutation, SparseMatrixCSC, SparseMatrixCSR};

/// Converts CSR to CSC by stable-sorting `(col, row, position)` tuples
///
/// Tuples are generated row by row in stored order, so a stable sort on the
/// column alone leaves each column's entries in ascending row order with
/// duplicates in their original relative order.
pub fn reference_csr2csc<T>(csr: &SparseMatrixCSR<T>) -> (SparseMatrixCSC<T>, Permutation)
where
    T: Copy + Num,
{
    let base = csr.index_base.offset();

    let mut entries: Vec<(usize, usize, usize)> = Vec::with_capacity(csr.nnz());
    for i in 0..csr.n_rows {
        for p in csr.row_range(i) {
            entries.push((csr.col_idx[p] - base, i, p));
        }
    }
    entries.sort_by_key(|&(col, _, _)| col);

    let mut col_ptr = Vec::with_capacity(csr.n_cols + 1);
    col_ptr.push(base);
    let mut next = 0;
    for j in 0..csr.n_cols {
        while next < entries.len() && entries[next].0 == j {
            next += 1;
        }
        col_ptr.push(next + base);
    }

    let row_idx = entries.iter().map(|&(_, row, _)| row + base).collect();
    let values = entries.iter().map(|&(_, _, p)| csr.values[p]).collect();
    let perm = entries.iter().map(|&(_, _, p)| p).collect();

    let csc = SparseMatrixCSC {
        n_rows: csr.n_rows,
        n_cols: csr.n_cols,
        col_ptr,
        row_idx,
        values,
        index_base: csr.index_base,
    };

    (csc, Permutation::from_vec_unchecked(perm))
}

/// Sorts every row by stable-sorting its `(col, position)` pairs
///
/// Returns the sorted matrix (values moved) and the permutation that maps
/// each sorted position to its original position.
pub fn reference_csrsort<T>(csr: &SparseMatrixCSR<T>) -> (SparseMatrixCSR<T>, Permutation)
where
    T: Copy + Num,
{
    let mut perm = Vec::with_capacity(csr.nnz());

    for i in 0..csr.n_rows {
        let mut row: Vec<(usize, usize)> = csr
            .row_range(i)
            .map(|p| (csr.col_idx[p], p))
            .collect();
        row.sort_by_key(|&(col, _)| col);
        perm.extend(row.into_iter().map(|(_, p)| p));
    }

    let sorted = SparseMatrixCSR {
        n_rows: csr.n_rows,
        n_cols: csr.n_cols,
        row_ptr: csr.row_ptr.clone(),
        col_idx: perm.iter().map(|&p| csr.col_idx[p]).collect(),
        values: perm.iter().map(|&p| csr.values[p]).collect(),
        index_base: csr.index_base,
    };

    (sorted, Permutation::from_vec_unchecked(perm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::IndexBase;

    #[test]
    fn test_reference_conversion() {
        let csr = SparseMatrixCSR::new(
            3,
            3,
            vec![0, 2, 2, 4],
            vec![2, 0, 1, 1],
            vec![5, 1, 2, 3],
        );

        let (csc, perm) = reference_csr2csc(&csr);

        assert_eq!(csc.col_ptr, vec![0, 1, 3, 4]);
        assert_eq!(csc.row_idx, vec![0, 2, 2, 0]);
        assert_eq!(csc.values, vec![1, 2, 3, 5]);
        assert_eq!(perm.as_slice(), &[1, 2, 3, 0]);
    }

    #[test]
    fn test_reference_conversion_trailing_empty_columns() {
        let csr = SparseMatrixCSR::with_base(2, 4, vec![1, 2, 3], vec![1, 1], vec![7, 8], IndexBase::One);
        let (csc, _) = reference_csr2csc(&csr);
        assert_eq!(csc.col_ptr, vec![1, 3, 3, 3, 3]);
        assert_eq!(csc.row_idx, vec![1, 2]);
    }

    #[test]
    fn test_reference_sort() {
        let csr = SparseMatrixCSR::new(2, 4, vec![0, 3, 5], vec![3, 0, 3, 2, 1], vec![1, 2, 3, 4, 5]);

        let (sorted, perm) = reference_csrsort(&csr);

        assert_eq!(sorted.col_idx, vec![0, 3, 3, 1, 2]);
        assert_eq!(sorted.values, vec![2, 1, 3, 5, 4]);
        assert_eq!(perm.as_slice(), &[1, 0, 2, 4, 3]);
    }
}
