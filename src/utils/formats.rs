//! Utilities for converting between our matrix formats and sprs

use crate::error::{Result, SparseError};
use crate::matrix::{IndexBase, SparseMatrixCSC, SparseMatrixCSR};
use num_traits::Num;
use sprs::CsMat;

/// sprs only accepts zero-based layouts with strictly increasing inner indices
fn check_canonical(ptr: &[usize], idx: &[usize], base: IndexBase) -> Result<()> {
    let base = base.offset();
    for (outer, w) in ptr.windows(2).enumerate() {
        let seg = &idx[(w[0] - base)..(w[1] - base)];
        if seg.windows(2).any(|p| p[0] >= p[1]) {
            return Err(SparseError::Interop(format!(
                "segment {} has unsorted or duplicate indices",
                outer
            )));
        }
    }
    Ok(())
}

/// Converts our CSR matrix format to sprs CsMat format
///
/// The matrix must have sorted, duplicate-free rows; one-based matrices
/// are rebased to zero.
pub fn to_sprs_csr<T>(matrix: &SparseMatrixCSR<T>) -> Result<CsMat<T>>
where
    T: Copy + Num + Default,
{
    check_canonical(&matrix.row_ptr, &matrix.col_idx, matrix.index_base)?;
    let zero = matrix.rebased(IndexBase::Zero);

    Ok(CsMat::new(
        (zero.n_rows, zero.n_cols),
        zero.row_ptr,
        zero.col_idx,
        zero.values,
    ))
}

/// Converts our CSC matrix format to sprs CsMat format (as CSC)
pub fn to_sprs_csc<T>(matrix: &SparseMatrixCSC<T>) -> Result<CsMat<T>>
where
    T: Copy + Num + Default,
{
    check_canonical(&matrix.col_ptr, &matrix.row_idx, matrix.index_base)?;
    let base = matrix.index_base.offset();

    Ok(CsMat::new_csc(
        (matrix.n_rows, matrix.n_cols),
        matrix.col_ptr.iter().map(|&p| p - base).collect(),
        matrix.row_idx.iter().map(|&r| r - base).collect(),
        matrix.values.clone(),
    ))
}

/// Converts sprs CsMat in CSR format to our zero-based SparseMatrixCSR format
pub fn from_sprs_csr<T>(matrix: CsMat<T>) -> SparseMatrixCSR<T>
where
    T: Copy + Num + Default,
{
    // Ensure matrix is in CSR format
    let matrix = if matrix.is_csr() {
        matrix
    } else {
        matrix.to_csr()
    };

    let shape = matrix.shape();
    let (indptr, indices, data) = matrix.into_raw_storage();

    SparseMatrixCSR::new(shape.0, shape.1, indptr, indices, data)
}

/// Converts sprs CsMat in CSC format to our zero-based SparseMatrixCSC format
pub fn from_sprs_csc<T>(matrix: CsMat<T>) -> SparseMatrixCSC<T>
where
    T: Copy + Num + Default,
{
    // Ensure matrix is in CSC format
    let matrix = if matrix.is_csc() {
        matrix
    } else {
        matrix.to_csc()
    };

    let shape = matrix.shape();
    let (indptr, indices, data) = matrix.into_raw_storage();

    SparseMatrixCSC::new(shape.0, shape.1, indptr, indices, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csr_roundtrip_one_based() {
        let original = SparseMatrixCSR::with_base(
            3, 3,
            vec![1, 3, 4, 6],
            vec![1, 2, 2, 1, 3],
            vec![1.0f64, 2.0, 3.0, 4.0, 5.0],
            IndexBase::One,
        );

        let roundtrip = from_sprs_csr(to_sprs_csr(&original).unwrap());

        assert_eq!(roundtrip.index_base, IndexBase::Zero);
        assert_eq!(roundtrip, original.rebased(IndexBase::Zero));
    }

    #[test]
    fn test_sprs_rejects_duplicates() {
        let dup = SparseMatrixCSR::new(1, 3, vec![0, 2], vec![1, 1], vec![1.0f64, 2.0]);
        assert!(matches!(to_sprs_csr(&dup), Err(SparseError::Interop(_))));

        let unsorted = SparseMatrixCSR::new(1, 3, vec![0, 2], vec![2, 0], vec![1.0f64, 2.0]);
        assert!(to_sprs_csr(&unsorted).is_err());
    }

    #[test]
    fn test_conversion_agrees_with_sprs() {
        let csr = SparseMatrixCSR::new(
            4, 5,
            vec![0, 2, 3, 3, 6],
            vec![0, 4, 2, 1, 2, 3],
            vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0],
        );

        let ours = csr.to_csc();
        let theirs = from_sprs_csc(to_sprs_csr(&csr).unwrap().to_csc());

        assert_eq!(ours, theirs);
    }
}
