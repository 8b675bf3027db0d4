//! In-place sorting of the minor indices inside each row (or column)
//!
//! Every row is an independent slice of the index array, so rows are sorted
//! with a stable sort and no cross-row synchronization. A payload array
//! (values or a permutation) travels with the indices.

use std::ops::Range;

use num_traits::Num;
use rayon::prelude::*;

use crate::error::{try_alloc, Result};
use crate::matrix::config::TransformConfig;
use crate::matrix::csr::{validate_compressed, Axes};
use crate::matrix::{Permutation, SparseMatrixCSC, SparseMatrixCSR};

/// Whether the stored indices of every major segment are non-decreasing
pub(crate) fn segments_sorted(ptr: &[usize], idx: &[usize], base: usize) -> bool {
    ptr.windows(2).all(|w| {
        let seg = &idx[(w[0] - base)..(w[1] - base)];
        seg.windows(2).all(|p| p[0] <= p[1])
    })
}

/// Stable-sorts one row's indices, carrying `payload` along
fn sort_row<P: Copy>(cols: &mut [usize], payload: Option<&mut [P]>, scratch: &mut Vec<(usize, P)>) {
    if cols.windows(2).all(|w| w[0] <= w[1]) {
        return;
    }

    match payload {
        // Equal keys are indistinguishable, stability is moot
        None => cols.sort_unstable(),
        Some(payload) => {
            scratch.clear();
            scratch.extend(cols.iter().copied().zip(payload.iter().copied()));
            scratch.sort_by_key(|&(c, _)| c);

            for ((c, p), &(sc, sp)) in cols.iter_mut().zip(payload.iter_mut()).zip(scratch.iter()) {
                *c = sc;
                *p = sp;
            }
        }
    }
}

/// Sorts the rows in `rows`, whose entries start at position `offset`
fn sort_block<P: Copy>(
    ptr: &[usize],
    base: usize,
    rows: Range<usize>,
    offset: usize,
    idx: &mut [usize],
    mut payload: Option<&mut [P]>,
) {
    let mut scratch = Vec::new();

    for r in rows {
        let range = (ptr[r] - base - offset)..(ptr[r + 1] - base - offset);
        let row_payload = payload.as_deref_mut().map(|p| &mut p[range.clone()]);
        sort_row(&mut idx[range], row_payload, &mut scratch);
    }
}

/// Sorts every major segment of a compressed layout in place
///
/// `ptr` must satisfy the pointer invariants for `idx`, and `payload`, when
/// present, must be as long as `idx`.
pub(crate) fn sort_segments<P>(
    ptr: &[usize],
    base: usize,
    idx: &mut [usize],
    payload: Option<&mut [P]>,
    config: &TransformConfig,
) where
    P: Copy + Send,
{
    let n_major = ptr.len().saturating_sub(1);
    let blocks = config.n_blocks(n_major);
    let parallel = config.use_parallel(idx.len()) && blocks > 1;

    tracing::debug!(
        n_major,
        nnz = idx.len(),
        with_payload = payload.is_some(),
        parallel,
        "sorting compressed segments"
    );

    if !parallel {
        sort_block(ptr, base, 0..n_major, 0, idx, payload);
        return;
    }

    // Cut the index (and payload) arrays at block boundaries
    let block_len = n_major.div_ceil(blocks);
    let mut segments = Vec::with_capacity(blocks);
    let mut rest_idx = idx;
    let mut rest_payload = payload;
    let mut consumed = 0;

    for b in 0..blocks {
        let start = (b * block_len).min(n_major);
        let rows = start..((b + 1) * block_len).min(n_major);
        let end = ptr[rows.end] - base;

        let (head, tail) = std::mem::take(&mut rest_idx).split_at_mut(end - consumed);
        rest_idx = tail;

        let head_payload = rest_payload.take().map(|p| {
            let (h, t) = p.split_at_mut(end - consumed);
            rest_payload = Some(t);
            h
        });

        segments.push((rows, consumed, head, head_payload));
        consumed = end;
    }

    segments
        .into_par_iter()
        .for_each(|(rows, offset, idx, payload)| sort_block(ptr, base, rows, offset, idx, payload));
}

/// `[0, 1, .., nnz)`, allocated fallibly
fn identity_positions(nnz: usize) -> Result<Vec<usize>> {
    let mut perm = try_alloc("perm", nnz, 0usize)?;
    for (i, p) in perm.iter_mut().enumerate() {
        *p = i;
    }
    Ok(perm)
}

impl<T> SparseMatrixCSR<T>
where
    T: Copy + Num + Send + Sync,
{
    /// Sorts the column indices of every row in place
    ///
    /// Ties keep their stored order. Without `emit_permutation` the values
    /// move with their column indices. With `emit_permutation` the values
    /// are left untouched and the returned permutation reorders them:
    /// `values = perm.gather(&values)` (or [`SparseMatrixCSR::apply_permutation`]).
    /// The same permutation can reorder any number of parallel value arrays.
    pub fn sort_in_place(&mut self, emit_permutation: bool) -> Result<Option<Permutation>> {
        self.sort_in_place_with(emit_permutation, &TransformConfig::default())
    }

    /// [`SparseMatrixCSR::sort_in_place`] with an explicit configuration
    pub fn sort_in_place_with(
        &mut self,
        emit_permutation: bool,
        config: &TransformConfig,
    ) -> Result<Option<Permutation>> {
        validate_compressed(
            Axes::ROWS,
            self.n_rows,
            self.n_cols,
            &self.row_ptr,
            &self.col_idx,
            self.values.len(),
            self.index_base,
        )?;
        let base = self.index_base.offset();

        if emit_permutation {
            let mut perm = identity_positions(self.nnz())?;
            sort_segments(&self.row_ptr, base, &mut self.col_idx, Some(perm.as_mut_slice()), config);
            Ok(Some(Permutation::from_vec_unchecked(perm)))
        } else {
            sort_segments(&self.row_ptr, base, &mut self.col_idx, Some(self.values.as_mut_slice()), config);
            Ok(None)
        }
    }

    /// Reorders the values with a permutation returned by a permuted sort
    pub fn apply_permutation(&mut self, perm: &Permutation) {
        self.values = perm.gather(&self.values);
    }

    /// A copy of this matrix with every row sorted
    pub fn sorted(&self) -> Result<Self> {
        let mut out = self.clone();
        out.sort_in_place(false)?;
        Ok(out)
    }

    /// Whether every row's column indices are non-decreasing
    pub fn has_sorted_indices(&self) -> bool {
        segments_sorted(&self.row_ptr, &self.col_idx, self.index_base.offset())
    }
}

impl<T> SparseMatrixCSC<T>
where
    T: Copy + Num + Send + Sync,
{
    /// Sorts the row indices of every column in place
    ///
    /// Same contract as [`SparseMatrixCSR::sort_in_place`], with rows and
    /// columns swapped.
    pub fn sort_in_place(&mut self, emit_permutation: bool) -> Result<Option<Permutation>> {
        self.sort_in_place_with(emit_permutation, &TransformConfig::default())
    }

    /// [`SparseMatrixCSC::sort_in_place`] with an explicit configuration
    pub fn sort_in_place_with(
        &mut self,
        emit_permutation: bool,
        config: &TransformConfig,
    ) -> Result<Option<Permutation>> {
        validate_compressed(
            Axes::COLS,
            self.n_cols,
            self.n_rows,
            &self.col_ptr,
            &self.row_idx,
            self.values.len(),
            self.index_base,
        )?;
        let base = self.index_base.offset();

        if emit_permutation {
            let mut perm = identity_positions(self.nnz())?;
            sort_segments(&self.col_ptr, base, &mut self.row_idx, Some(perm.as_mut_slice()), config);
            Ok(Some(Permutation::from_vec_unchecked(perm)))
        } else {
            sort_segments(&self.col_ptr, base, &mut self.row_idx, Some(self.values.as_mut_slice()), config);
            Ok(None)
        }
    }

    /// Whether every column's row indices are non-decreasing
    pub fn has_sorted_indices(&self) -> bool {
        segments_sorted(&self.col_ptr, &self.row_idx, self.index_base.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::IndexBase;

    fn example() -> SparseMatrixCSR<f64> {
        SparseMatrixCSR::new(
            3,
            3,
            vec![0, 2, 2, 4],
            vec![2, 0, 1, 1],
            vec![5.0, 1.0, 2.0, 3.0],
        )
    }

    #[test]
    fn test_sort_moves_values() {
        let mut csr = example();
        assert!(!csr.has_sorted_indices());

        let perm = csr.sort_in_place(false).unwrap();
        assert!(perm.is_none());
        assert_eq!(csr.col_idx, vec![0, 2, 1, 1]);
        assert_eq!(csr.values, vec![1.0, 5.0, 2.0, 3.0]);
        assert!(csr.has_sorted_indices());
    }

    #[test]
    fn test_sort_with_permutation_leaves_values() {
        let mut csr = example();
        let perm = csr.sort_in_place(true).unwrap().unwrap();

        assert_eq!(csr.col_idx, vec![0, 2, 1, 1]);
        assert_eq!(csr.values, vec![5.0, 1.0, 2.0, 3.0]);
        assert_eq!(perm.as_slice(), &[1, 0, 2, 3]);

        csr.apply_permutation(&perm);
        assert_eq!(csr.values, vec![1.0, 5.0, 2.0, 3.0]);
    }

    #[test]
    fn test_ties_keep_order() {
        let mut csr = SparseMatrixCSR::new(1, 4, vec![0, 5], vec![3, 1, 3, 1, 0], vec![1, 2, 3, 4, 5]);
        csr.sort_in_place(false).unwrap();
        assert_eq!(csr.col_idx, vec![0, 1, 1, 3, 3]);
        assert_eq!(csr.values, vec![5, 2, 4, 1, 3]);
    }

    #[test]
    fn test_sorted_input_is_identity() {
        let mut csr = SparseMatrixCSR::<f64>::identity(4);
        let before = csr.clone();
        let perm = csr.sort_in_place(true).unwrap().unwrap();
        assert!(perm.is_identity());
        assert_eq!(csr, before);
    }

    #[test]
    fn test_one_based_sort() {
        let mut csr = example().rebased(IndexBase::One);
        csr.sort_in_place(false).unwrap();
        assert_eq!(csr.col_idx, vec![1, 3, 2, 2]);
        assert_eq!(csr.values, vec![1.0, 5.0, 2.0, 3.0]);
    }

    #[test]
    fn test_empty() {
        let mut csr = SparseMatrixCSR::<f32>::zeros(10, 3);
        let perm = csr.sort_in_place(true).unwrap().unwrap();
        assert!(perm.is_empty());
        assert_eq!(csr.row_ptr, vec![0; 11]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let n_rows = 41;
        let mut row_ptr = vec![0];
        let mut col_idx = Vec::new();
        for i in 0..n_rows {
            for k in 0..(i % 6) {
                col_idx.push((i * 13 + k * 7) % 4);
            }
            row_ptr.push(col_idx.len());
        }
        let values: Vec<i64> = (0..col_idx.len() as i64).collect();
        let csr = SparseMatrixCSR::new(n_rows, 4, row_ptr, col_idx, values);

        let mut parallel = TransformConfig::parallel();
        parallel.system_params.n_threads = 5;

        for emit in [false, true] {
            let mut seq = csr.clone();
            let mut par = csr.clone();
            let p_seq = seq.sort_in_place_with(emit, &TransformConfig::sequential()).unwrap();
            let p_par = par.sort_in_place_with(emit, &parallel).unwrap();
            assert_eq!(seq, par);
            assert_eq!(p_seq, p_par);
        }
    }

    #[test]
    fn test_csc_column_sort() {
        let mut csc = SparseMatrixCSC::new(3, 2, vec![0, 3, 4], vec![2, 0, 1, 1], vec![1, 2, 3, 4]);
        csc.sort_in_place(false).unwrap();
        assert_eq!(csc.row_idx, vec![0, 1, 2, 1]);
        assert_eq!(csc.values, vec![2, 3, 1, 4]);
        assert!(csc.has_sorted_indices());
    }

    #[test]
    fn test_csc_parallel_matches_sequential() {
        let csc = crate::sweep::MatrixGenerator::new(13)
            .generate(400, 300, IndexBase::One)
            .to_csc();
        // Reversing each column's entries makes every column unsorted
        let mut shuffled = csc.clone();
        for j in 0..shuffled.n_cols {
            let range = shuffled.col_range(j);
            shuffled.row_idx[range.clone()].reverse();
            shuffled.values[range].reverse();
        }

        let mut seq = shuffled.clone();
        let mut par = shuffled.clone();
        let p_seq = seq.sort_in_place_with(true, &TransformConfig::sequential()).unwrap();
        let p_par = par.sort_in_place_with(true, &TransformConfig::parallel()).unwrap();

        assert_eq!(seq, par);
        assert_eq!(p_seq, p_par);
        assert!(seq.has_sorted_indices());

        let mut moved = shuffled.clone();
        moved.sort_in_place(false).unwrap();
        assert_eq!(p_seq.unwrap().gather(&shuffled.values), moved.values);
        assert_eq!(moved.row_idx, csc.row_idx);
    }
}
