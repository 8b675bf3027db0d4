//! Conversion between CSR and CSC layouts
//!
//! Both directions are the same counting-sort scatter: count entries per
//! minor index, prefix-sum the counts into the output pointer array, then
//! walk the major axis in ascending order and drop every entry at its minor
//! index's cursor. Because the walk is ordered, entries sharing a minor index
//! keep their source order and duplicates survive untouched.

use rayon::prelude::*;

use crate::error::{try_alloc, Result};
use crate::matrix::config::TransformConfig;
use crate::matrix::{Action, Permutation, SparseMatrixCSC, SparseMatrixCSR};
use crate::routines::{self, CscOutput, CsrInput};
use num_traits::Num;
use std::fmt;

/// Per-block count tables larger than this fall back to the sequential scatter
const MAX_BLOCK_COUNT_CELLS: usize = 1 << 25;

/// A compressed layout viewed along its major axis
///
/// Buffers must already satisfy the pointer and index invariants.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Compressed<'a> {
    pub n_major: usize,
    pub n_minor: usize,
    pub ptr: &'a [usize],
    pub idx: &'a [usize],
    pub base: usize,
}

impl Compressed<'_> {
    fn nnz(&self) -> usize {
        self.idx.len()
    }

    fn major_range(&self, i: usize) -> std::ops::Range<usize> {
        (self.ptr[i] - self.base)..(self.ptr[i + 1] - self.base)
    }
}

/// What gets moved alongside the transposed indices
pub(crate) struct Payload<'a, T> {
    /// Source values and their destination, when values are moved
    pub values: Option<(&'a [T], &'a mut [T])>,
    /// Destination-to-source positions, when requested
    pub perm: Option<&'a mut [usize]>,
}

/// Counts entries per minor index and writes the prefix sum into `out_ptr`
///
/// Returns the zero-based start offset of every minor index.
fn count_and_scan(src: &Compressed<'_>, out_ptr: &mut [usize]) -> Result<Vec<usize>> {
    let mut counts = try_alloc("counts", src.n_minor + 1, 0usize)?;

    for &c in src.idx {
        counts[c - src.base + 1] += 1;
    }

    // Exclusive scan: counts[j] becomes the offset of minor index j
    for j in 0..src.n_minor {
        counts[j + 1] += counts[j];
    }

    for (dst, &offset) in out_ptr.iter_mut().zip(&counts) {
        *dst = offset + src.base;
    }

    counts.truncate(src.n_minor);
    Ok(counts)
}

/// Transposes a compressed layout into caller-sized outputs
///
/// `out_ptr` must hold `n_minor + 1` elements; `out_idx` and every payload
/// destination must hold `nnz`.
pub(crate) fn transpose_compressed<T>(
    src: Compressed<'_>,
    out_ptr: &mut [usize],
    out_idx: &mut [usize],
    payload: Payload<'_, T>,
    config: &TransformConfig,
) -> Result<()>
where
    T: Copy + Send + Sync,
{
    let blocks = config.n_blocks(src.n_major);
    let parallel = config.use_parallel(src.nnz())
        && blocks > 1
        && blocks.saturating_mul(src.n_minor) <= MAX_BLOCK_COUNT_CELLS;

    tracing::debug!(
        n_major = src.n_major,
        n_minor = src.n_minor,
        nnz = src.nnz(),
        parallel,
        "transposing compressed layout"
    );

    if parallel {
        scatter_blocked(src, out_ptr, out_idx, payload, blocks)
    } else {
        let cursor = count_and_scan(&src, out_ptr)?;
        scatter_sequential(src, cursor, out_idx, payload);
        Ok(())
    }
}

fn scatter_sequential<T: Copy>(
    src: Compressed<'_>,
    mut cursor: Vec<usize>,
    out_idx: &mut [usize],
    mut payload: Payload<'_, T>,
) {
    for i in 0..src.n_major {
        for p in src.major_range(i) {
            let c = src.idx[p] - src.base;
            let d = cursor[c];

            out_idx[d] = i + src.base;
            if let Some((from, to)) = payload.values.as_mut() {
                to[d] = from[p];
            }
            if let Some(perm) = payload.perm.as_mut() {
                perm[d] = p;
            }

            cursor[c] += 1;
        }
    }
}

/// Shared write handle for disjoint parallel scatter
struct SharedMut<T> {
    ptr: *mut T,
    len: usize,
}

// Safety: every position is written by exactly one worker (see scatter_blocked).
unsafe impl<T: Send> Send for SharedMut<T> {}
unsafe impl<T: Send> Sync for SharedMut<T> {}

impl<T> SharedMut<T> {
    fn new(slice: &mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
        }
    }

    /// # Safety
    ///
    /// No other thread may read or write position `i` concurrently.
    unsafe fn write(&self, i: usize, value: T) {
        assert!(i < self.len, "scatter position out of bounds");
        self.ptr.add(i).write(value);
    }
}

/// Row-block partitioned scatter
///
/// Major indices are split into contiguous blocks. Each block counts its own
/// entries per minor index; the global prefix sum then gives every
/// (block, minor) pair a private, contiguous run of output positions, laid
/// out in block order. Each block advances only its own cursors, so the
/// result is identical to the sequential walk.
fn scatter_blocked<T>(
    src: Compressed<'_>,
    out_ptr: &mut [usize],
    out_idx: &mut [usize],
    payload: Payload<'_, T>,
    blocks: usize,
) -> Result<()>
where
    T: Copy + Send + Sync,
{
    let block_len = src.n_major.div_ceil(blocks);
    let block_range = |b: usize| {
        let start = (b * block_len).min(src.n_major);
        start..((b + 1) * block_len).min(src.n_major)
    };

    let mut block_counts = (0..blocks)
        .map(|_| try_alloc("block_counts", src.n_minor, 0usize))
        .collect::<Result<Vec<_>>>()?;

    // 1) Per-block counts
    block_counts
        .par_iter_mut()
        .enumerate()
        .for_each(|(b, counts)| {
            for i in block_range(b) {
                for p in src.major_range(i) {
                    counts[src.idx[p] - src.base] += 1;
                }
            }
        });

    // 2) Global scan, then per-block cursors in block order
    let mut offset = 0;
    out_ptr[0] = src.base;
    for j in 0..src.n_minor {
        for counts in block_counts.iter_mut() {
            let k = counts[j];
            counts[j] = offset;
            offset += k;
        }
        out_ptr[j + 1] = offset + src.base;
    }

    // 3) Scatter
    let idx_out = SharedMut::new(out_idx);
    let Payload { values, perm } = payload;
    let values = values.map(|(from, to)| (from, SharedMut::new(to)));
    let perm = perm.map(SharedMut::new);

    block_counts
        .into_par_iter()
        .enumerate()
        .for_each(|(b, mut cursor)| {
            for i in block_range(b) {
                for p in src.major_range(i) {
                    let c = src.idx[p] - src.base;
                    let d = cursor[c];

                    // Safety: d lies in the run owned by (b, c); no other
                    // block holds a cursor into it.
                    unsafe {
                        idx_out.write(d, i + src.base);
                        if let Some((from, to)) = values.as_ref() {
                            to.write(d, from[p]);
                        }
                        if let Some(perm) = perm.as_ref() {
                            perm.write(d, p);
                        }
                    }

                    cursor[c] += 1;
                }
            }
        });

    Ok(())
}

/// Result of a CSR→CSC conversion
#[derive(Clone, PartialEq)]
pub struct CscConversion<T> {
    /// The converted matrix; for `Action::Symbolic` its values are zero-filled
    pub csc: SparseMatrixCSC<T>,
    /// Destination-to-source positions, produced by `Action::Symbolic`
    pub permutation: Option<Permutation>,
}

impl<T: fmt::Debug + Copy + Num> fmt::Debug for CscConversion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CscConversion")
            .field("csc", &self.csc)
            .field("permutation", &self.permutation)
            .finish()
    }
}

impl<T> CscConversion<T>
where
    T: Copy + Num,
{
    /// Fills the CSC values from the original CSR values using the
    /// recorded permutation, without recomputing the structure.
    pub fn fill_values(&mut self, csr_values: &[T]) -> Result<()> {
        match &self.permutation {
            Some(perm) => perm.gather_into(csr_values, &mut self.csc.values),
            None => Ok(()),
        }
    }
}

impl<T> SparseMatrixCSR<T>
where
    T: Copy + Num + Send + Sync,
{
    /// Converts this CSR matrix to CSC format, moving values
    ///
    /// # Panics
    ///
    /// Panics if the matrix fields have been left inconsistent.
    pub fn to_csc(&self) -> SparseMatrixCSC<T> {
        match self.convert(Action::Numeric, &TransformConfig::default()) {
            Ok(result) => result.csc,
            Err(e) => panic!("{}", e),
        }
    }

    /// Converts this CSR matrix to CSC format
    ///
    /// With `Action::Numeric` the values are moved. With `Action::Symbolic`
    /// only the structure is computed and a permutation is returned that
    /// maps every CSC position to its CSR source position.
    pub fn convert(&self, action: Action, config: &TransformConfig) -> Result<CscConversion<T>> {
        let nnz = self.nnz();
        let mut col_ptr = try_alloc("col_ptr", self.n_cols + 1, 0usize)?;
        let mut row_idx = try_alloc("row_idx", nnz, 0usize)?;
        let mut values = try_alloc("values", nnz, T::zero())?;
        let mut perm = match action {
            Action::Symbolic => Some(try_alloc("perm", nnz, 0usize)?),
            Action::Numeric => None,
        };

        let input = CsrInput::from_matrix(self)?;
        let output = CscOutput {
            col_ptr: Some(&mut col_ptr),
            row_idx: Some(&mut row_idx),
            values: match action {
                Action::Numeric => Some(&mut values),
                Action::Symbolic => None,
            },
            perm: perm.as_deref_mut(),
        };
        routines::csr2csc_with(input, output, action, self.index_base, config)?;

        Ok(CscConversion {
            csc: SparseMatrixCSC {
                n_rows: self.n_rows,
                n_cols: self.n_cols,
                col_ptr,
                row_idx,
                values,
                index_base: self.index_base,
            },
            permutation: perm.map(Permutation::from_vec_unchecked),
        })
    }

    /// The transpose Aᵀ, as a CSR matrix
    ///
    /// The CSC arrays of A are exactly the CSR arrays of Aᵀ.
    pub fn transpose(&self) -> Result<SparseMatrixCSR<T>> {
        let csc = self.convert(Action::Numeric, &TransformConfig::default())?.csc;
        Ok(SparseMatrixCSR {
            n_rows: csc.n_cols,
            n_cols: csc.n_rows,
            row_ptr: csc.col_ptr,
            col_idx: csc.row_idx,
            values: csc.values,
            index_base: csc.index_base,
        })
    }
}

impl<T> SparseMatrixCSC<T>
where
    T: Copy + Num + Send + Sync,
{
    /// Converts this CSC matrix to CSR format
    ///
    /// # Panics
    ///
    /// Panics if the matrix fields have been left inconsistent.
    pub fn to_csr(&self) -> SparseMatrixCSR<T> {
        match self.convert(&TransformConfig::default()) {
            Ok(csr) => csr,
            Err(e) => panic!("{}", e),
        }
    }

    /// Converts this CSC matrix to CSR format, moving values
    ///
    /// Entries sharing a row keep their column order.
    pub fn convert(&self, config: &TransformConfig) -> Result<SparseMatrixCSR<T>> {
        let nnz = self.nnz();
        let mut row_ptr = try_alloc("row_ptr", self.n_rows + 1, 0usize)?;
        let mut col_idx = try_alloc("col_idx", nnz, 0usize)?;
        let mut values = try_alloc("values", nnz, T::zero())?;

        // A CSC matrix is the CSR layout of its transpose
        let input = CsrInput {
            m: routines::signed(self.n_cols)?,
            n: routines::signed(self.n_rows)?,
            nnz: routines::signed(nnz)?,
            row_ptr: Some(&self.col_ptr),
            col_idx: Some(&self.row_idx),
            values: Some(&self.values),
        };
        let output = CscOutput {
            col_ptr: Some(&mut row_ptr),
            row_idx: Some(&mut col_idx),
            values: Some(&mut values),
            perm: None,
        };
        routines::csr2csc_with(input, output, Action::Numeric, self.index_base, config)?;

        Ok(SparseMatrixCSR {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr,
            col_idx,
            values,
            index_base: self.index_base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::IndexBase;

    fn example() -> SparseMatrixCSR<f64> {
        // Row 0 holds (0,2)=5 then (0,0)=1; row 2 holds two entries in column 1
        SparseMatrixCSR::new(
            3,
            3,
            vec![0, 2, 2, 4],
            vec![2, 0, 1, 1],
            vec![5.0, 1.0, 2.0, 3.0],
        )
    }

    #[test]
    fn test_csr_to_csc_conversion() {
        // Create a CSR matrix
        //    [1 2 0]
        //    [0 3 0]
        //    [4 0 5]
        let csr = SparseMatrixCSR::new(
            3,
            3,
            vec![0, 2, 3, 5],
            vec![0, 1, 1, 0, 2],
            vec![1, 2, 3, 4, 5],
        );

        let csc = csr.to_csc();

        assert_eq!(csc.nnz(), 5);
        assert_eq!(csc.col_ptr, vec![0, 2, 4, 5]);

        let col0: Vec<_> = csc.col_iter(0).collect();
        assert_eq!(col0, vec![(0, &1), (2, &4)]);

        let col1: Vec<_> = csc.col_iter(1).collect();
        assert_eq!(col1, vec![(0, &2), (1, &3)]);

        let col2: Vec<_> = csc.col_iter(2).collect();
        assert_eq!(col2, vec![(2, &5)]);
    }

    #[test]
    fn test_unsorted_rows_with_duplicates() {
        let csc = example().to_csc();

        assert_eq!(csc.col_ptr, vec![0, 1, 3, 4]);
        assert_eq!(csc.row_idx, vec![0, 2, 2, 0]);
        assert_eq!(csc.values, vec![1.0, 2.0, 3.0, 5.0]);
    }

    #[test]
    fn test_symbolic_matches_numeric() {
        let csr = example();
        let config = TransformConfig::sequential();

        let numeric = csr.convert(Action::Numeric, &config).unwrap();
        let mut symbolic = csr.convert(Action::Symbolic, &config).unwrap();

        assert!(numeric.permutation.is_none());
        assert_eq!(symbolic.csc.col_ptr, numeric.csc.col_ptr);
        assert_eq!(symbolic.csc.row_idx, numeric.csc.row_idx);

        let perm = symbolic.permutation.clone().unwrap();
        assert_eq!(perm.as_slice(), &[1, 2, 3, 0]);

        symbolic.fill_values(&csr.values).unwrap();
        assert_eq!(symbolic.csc.values, numeric.csc.values);
    }

    #[test]
    fn test_one_based_conversion() {
        let csr = example().rebased(IndexBase::One);
        let csc = csr.to_csc();

        assert_eq!(csc.index_base, IndexBase::One);
        assert_eq!(csc.col_ptr, vec![1, 2, 4, 5]);
        assert_eq!(csc.row_idx, vec![1, 3, 3, 1]);
        assert_eq!(csc.values, vec![1.0, 2.0, 3.0, 5.0]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        // Many rows hitting few columns, so blocks share every column
        let n_rows = 97;
        let mut row_ptr = vec![0];
        let mut col_idx = Vec::new();
        for i in 0..n_rows {
            for k in 0..(i % 4) {
                col_idx.push((i * 7 + k * 3) % 5);
            }
            row_ptr.push(col_idx.len());
        }
        let values: Vec<f64> = (0..col_idx.len()).map(|v| v as f64).collect();
        let csr = SparseMatrixCSR::new(n_rows, 5, row_ptr, col_idx, values);

        let mut parallel = TransformConfig::parallel();
        parallel.system_params.n_threads = 6;

        for action in Action::ALL {
            let seq = csr.convert(action, &TransformConfig::sequential()).unwrap();
            let par = csr.convert(action, &parallel).unwrap();
            assert_eq!(seq, par);
        }
    }

    #[test]
    fn test_csc_to_csr_conversion() {
        let csc = SparseMatrixCSC::new(
            3,
            3,
            vec![0, 2, 4, 5],
            vec![0, 2, 0, 1, 2],
            vec![1, 4, 2, 3, 5],
        );

        let csr = csc.to_csr();

        assert_eq!(csr.row_ptr, vec![0, 2, 3, 5]);
        assert_eq!(csr.col_idx, vec![0, 1, 1, 0, 2]);
        assert_eq!(csr.values, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_transpose() {
        let csr = example();
        let t = csr.transpose().unwrap();

        assert_eq!(t.n_rows, 3);
        assert_eq!(t.row_ptr, vec![0, 1, 3, 4]);
        assert_eq!(t.to_dense(), csr.to_dense().t().to_owned());
    }

    #[test]
    fn test_empty_matrix() {
        let csr = SparseMatrixCSR::<f64>::zeros_with_base(10, 4, IndexBase::One);
        let csc = csr.to_csc();
        assert_eq!(csc.col_ptr, vec![1; 5]);
        assert!(csc.row_idx.is_empty());
        assert!(csc.values.is_empty());
    }

    #[test]
    fn test_conversion_debug_output() {
        let conversion = example()
            .convert(Action::Symbolic, &TransformConfig::default())
            .unwrap();
        let text = format!("{:?}", conversion);

        assert!(text.starts_with("CscConversion"));
        assert!(text.contains("SparseMatrixCSC"));
        assert!(text.contains("permutation"));
    }
}
