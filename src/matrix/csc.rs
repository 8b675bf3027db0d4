//! Compressed Sparse Column (CSC) matrix format implementation

use std::fmt;
use std::ops::Range;

use ndarray::Array2;
use num_traits::Num;

use crate::error::Result;
use crate::matrix::csr::{validate_compressed, Axes};
use crate::matrix::IndexBase;

/// A sparse matrix in Compressed Sparse Column (CSC) format
///
/// The CSC format stores a sparse matrix using three arrays:
/// - col_ptr: Array of size n_cols + 1 containing offsets into row_idx and values
/// - row_idx: Array of size nnz containing row indices of non-zero elements
/// - values: Array of size nnz containing the non-zero values
///
/// Stored indices include the `index_base` offset.
#[derive(Clone, PartialEq)]
pub struct SparseMatrixCSC<T> {
    /// Number of rows in the matrix
    pub n_rows: usize,

    /// Number of columns in the matrix
    pub n_cols: usize,

    /// Column pointers (size: n_cols + 1)
    /// col_ptr[j] - base is the position in row_idx and values where column j starts
    /// col_ptr[n_cols] is equal to nnz + base
    pub col_ptr: Vec<usize>,

    /// Row indices (size: nnz)
    pub row_idx: Vec<usize>,

    /// Non-zero values (size: nnz)
    pub values: Vec<T>,

    /// Offset of every stored index
    pub index_base: IndexBase,
}

impl<T> SparseMatrixCSC<T>
where
    T: Copy + Num,
{
    /// Creates a new zero-based CSC matrix with the given dimensions and data
    ///
    /// # Panics
    ///
    /// Panics if the input arrays are inconsistent; see [`SparseMatrixCSC::try_new`].
    pub fn new(
        n_rows: usize,
        n_cols: usize,
        col_ptr: Vec<usize>,
        row_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        Self::with_base(n_rows, n_cols, col_ptr, row_idx, values, IndexBase::Zero)
    }

    /// Creates a new CSC matrix whose stored indices use `index_base`
    pub fn with_base(
        n_rows: usize,
        n_cols: usize,
        col_ptr: Vec<usize>,
        row_idx: Vec<usize>,
        values: Vec<T>,
        index_base: IndexBase,
    ) -> Self {
        match Self::try_new(n_rows, n_cols, col_ptr, row_idx, values, index_base) {
            Ok(m) => m,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a new CSC matrix, checking every structural invariant
    pub fn try_new(
        n_rows: usize,
        n_cols: usize,
        col_ptr: Vec<usize>,
        row_idx: Vec<usize>,
        values: Vec<T>,
        index_base: IndexBase,
    ) -> Result<Self> {
        validate_compressed(
            Axes::COLS,
            n_cols,
            n_rows,
            &col_ptr,
            &row_idx,
            values.len(),
            index_base,
        )?;

        Ok(Self {
            n_rows,
            n_cols,
            col_ptr,
            row_idx,
            values,
            index_base,
        })
    }

    /// Returns the number of non-zero elements in the matrix
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Positions in `row_idx`/`values` occupied by column j
    pub fn col_range(&self, j: usize) -> Range<usize> {
        assert!(j < self.n_cols, "Column index out of bounds");
        let base = self.index_base.offset();
        (self.col_ptr[j] - base)..(self.col_ptr[j + 1] - base)
    }

    /// Returns an iterator over the non-zero elements in column j
    ///
    /// Each item is a tuple (row, value) where `row` is zero-based.
    pub fn col_iter(&self, j: usize) -> impl Iterator<Item = (usize, &T)> {
        let range = self.col_range(j);
        let base = self.index_base.offset();

        self.row_idx[range.clone()]
            .iter()
            .zip(&self.values[range])
            .map(move |(&row, val)| (row - base, val))
    }

    /// Creates an empty matrix with the given dimensions
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            col_ptr: vec![0; n_cols + 1],
            row_idx: Vec::new(),
            values: Vec::new(),
            index_base: IndexBase::Zero,
        }
    }

    /// Materialises the matrix densely, summing duplicate entries
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.n_rows, self.n_cols), T::zero());
        for j in 0..self.n_cols {
            for (i, &val) in self.col_iter(j) {
                dense[[i, j]] = dense[[i, j]] + val;
            }
        }
        dense
    }
}

impl<T: fmt::Debug + Copy + Num> fmt::Debug for SparseMatrixCSC<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SparseMatrixCSC {{")?;
        writeln!(f, "  dimensions: {} × {}", self.n_rows, self.n_cols)?;
        writeln!(f, "  nnz: {}", self.nnz())?;
        writeln!(f, "  index base: {:?}", self.index_base)?;

        let max_cols_to_print = 5.min(self.n_cols);

        if max_cols_to_print > 0 {
            writeln!(f, "  content sample:")?;

            for j in 0..max_cols_to_print {
                write!(f, "    col {}: ", j)?;
                let range = self.col_range(j);

                if range.is_empty() {
                    writeln!(f, "(empty)")?;
                } else {
                    let max_elements = 5.min(range.len());

                    for i in range.start..(range.start + max_elements) {
                        write!(f, "({}, {:?}) ", self.row_idx[i], self.values[i])?;
                    }

                    if range.len() > max_elements {
                        write!(f, "... ({} more)", range.len() - max_elements)?;
                    }

                    writeln!(f)?;
                }
            }

            if self.n_cols > max_cols_to_print {
                writeln!(f, "    ... ({} more columns)", self.n_cols - max_cols_to_print)?;
            }
        }

        write!(f, "}}")
    }
}
