//! Compressed Sparse Row (CSR) matrix format implementation

use std::fmt;
use std::ops::Range;

use ndarray::Array2;
use num_traits::Num;

use crate::error::{Result, SparseError};
use crate::matrix::IndexBase;

/// A sparse matrix in Compressed Sparse Row (CSR) format
///
/// The CSR format stores a sparse matrix using three arrays:
/// - row_ptr: Array of size n_rows + 1 containing offsets into col_idx and values
/// - col_idx: Array of size nnz containing column indices of non-zero elements
/// - values: Array of size nnz containing the non-zero values
///
/// All stored indices (both `row_ptr` entries and `col_idx` entries) include
/// the `index_base` offset. Within a row, column indices need not be sorted
/// or unique; duplicates are kept as separate entries.
#[derive(Clone, PartialEq)]
pub struct SparseMatrixCSR<T> {
    /// Number of rows in the matrix
    pub n_rows: usize,

    /// Number of columns in the matrix
    pub n_cols: usize,

    /// Row pointers (size: n_rows + 1)
    /// row_ptr[i] - base is the position in col_idx and values where row i starts
    /// row_ptr[n_rows] is equal to nnz + base
    pub row_ptr: Vec<usize>,

    /// Column indices (size: nnz)
    pub col_idx: Vec<usize>,

    /// Non-zero values (size: nnz)
    pub values: Vec<T>,

    /// Offset of every stored index
    pub index_base: IndexBase,
}

impl<T> SparseMatrixCSR<T>
where
    T: Copy + Num,
{
    /// Creates a new zero-based CSR matrix with the given dimensions and data
    ///
    /// # Arguments
    ///
    /// * `n_rows` - Number of rows
    /// * `n_cols` - Number of columns
    /// * `row_ptr` - Row pointers
    /// * `col_idx` - Column indices
    /// * `values` - Non-zero values
    ///
    /// # Panics
    ///
    /// Panics if the input arrays are inconsistent; see [`SparseMatrixCSR::try_new`].
    pub fn new(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        Self::with_base(n_rows, n_cols, row_ptr, col_idx, values, IndexBase::Zero)
    }

    /// Creates a new CSR matrix whose stored indices use `index_base`
    ///
    /// # Panics
    ///
    /// Panics if the input arrays are inconsistent; see [`SparseMatrixCSR::try_new`].
    pub fn with_base(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
        index_base: IndexBase,
    ) -> Self {
        match Self::try_new(n_rows, n_cols, row_ptr, col_idx, values, index_base) {
            Ok(m) => m,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a new CSR matrix, checking every structural invariant
    ///
    /// - row_ptr.len() must be n_rows + 1
    /// - col_idx.len() must equal values.len()
    /// - row_ptr[0] must equal the base and row_ptr[n_rows] must equal nnz + base
    /// - row_ptr must be non-decreasing
    /// - every column index must lie in [base, n_cols - 1 + base]
    pub fn try_new(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
        index_base: IndexBase,
    ) -> Result<Self> {
        validate_compressed(
            Axes::ROWS,
            n_rows,
            n_cols,
            &row_ptr,
            &col_idx,
            values.len(),
            index_base,
        )?;

        Ok(Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
            index_base,
        })
    }

    /// Returns the number of non-zero elements in the matrix
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Positions in `col_idx`/`values` occupied by row i
    pub fn row_range(&self, i: usize) -> Range<usize> {
        assert!(i < self.n_rows, "Row index out of bounds");
        let base = self.index_base.offset();
        (self.row_ptr[i] - base)..(self.row_ptr[i + 1] - base)
    }

    /// Returns an iterator over the non-zero elements in row i
    ///
    /// Each item is a tuple (col, value) where `col` is zero-based,
    /// in the row's stored order.
    pub fn row_iter(&self, i: usize) -> impl Iterator<Item = (usize, &T)> {
        let range = self.row_range(i);
        let base = self.index_base.offset();

        self.col_idx[range.clone()]
            .iter()
            .zip(&self.values[range])
            .map(move |(&col, val)| (col - base, val))
    }

    /// Creates an empty matrix with the given dimensions
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self::zeros_with_base(n_rows, n_cols, IndexBase::Zero)
    }

    /// Creates an empty matrix whose row pointers are all `index_base`
    pub fn zeros_with_base(n_rows: usize, n_cols: usize, index_base: IndexBase) -> Self {
        Self {
            n_rows,
            n_cols,
            row_ptr: vec![index_base.offset(); n_rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
            index_base,
        }
    }

    /// Creates an identity matrix of the given size
    pub fn identity(n: usize) -> Self {
        Self {
            n_rows: n,
            n_cols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![T::one(); n],
            index_base: IndexBase::Zero,
        }
    }

    /// Returns a copy of this matrix re-expressed in another index base
    pub fn rebased(&self, index_base: IndexBase) -> Self {
        let from = self.index_base.offset();
        let to = index_base.offset();

        Self {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr: self.row_ptr.iter().map(|&p| p - from + to).collect(),
            col_idx: self.col_idx.iter().map(|&c| c - from + to).collect(),
            values: self.values.clone(),
            index_base,
        }
    }

    /// Materialises the matrix densely, summing duplicate entries
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.n_rows, self.n_cols), T::zero());
        for i in 0..self.n_rows {
            for (j, &val) in self.row_iter(i) {
                dense[[i, j]] = dense[[i, j]] + val;
            }
        }
        dense
    }
}

/// Which axis of a compressed layout is the major (pointer) axis
#[derive(Debug, Clone, Copy)]
pub(crate) struct Axes {
    pub ptr: &'static str,
    pub idx: &'static str,
    pub major: &'static str,
    pub minor: &'static str,
}

impl Axes {
    pub const ROWS: Axes = Axes {
        ptr: "row_ptr",
        idx: "col_idx",
        major: "n_rows",
        minor: "n_cols",
    };

    pub const COLS: Axes = Axes {
        ptr: "col_ptr",
        idx: "row_idx",
        major: "n_cols",
        minor: "n_rows",
    };
}

/// Checks the invariants shared by CSR and CSC layouts
pub(crate) fn validate_compressed(
    axes: Axes,
    n_major: usize,
    n_minor: usize,
    ptr: &[usize],
    idx: &[usize],
    n_values: usize,
    index_base: IndexBase,
) -> Result<()> {
    let base = index_base.offset();

    if ptr.len() != n_major + 1 {
        return Err(SparseError::pointer(
            axes.ptr,
            format!("{}.len() must be {} + 1", axes.ptr, axes.major),
        ));
    }
    if idx.len() != n_values {
        return Err(SparseError::pointer(
            axes.idx,
            format!("{}.len() must equal values.len()", axes.idx),
        ));
    }
    check_pointers(axes, ptr, idx.len(), base)?;
    check_indices(axes, idx, n_minor, base)
}

pub(crate) fn check_pointers(axes: Axes, ptr: &[usize], nnz: usize, base: usize) -> Result<()> {
    if ptr[0] != base {
        return Err(SparseError::size(format!(
            "{}[0] must equal the index base {}",
            axes.ptr, base
        )));
    }
    if ptr[ptr.len() - 1] != nnz + base {
        return Err(SparseError::size(format!(
            "{}[{}] must equal nnz + base ({})",
            axes.ptr,
            axes.major,
            nnz + base
        )));
    }
    if let Some(w) = ptr.windows(2).position(|w| w[0] > w[1]) {
        return Err(SparseError::size(format!(
            "{} must be non-decreasing (decreases at {})",
            axes.ptr, w
        )));
    }
    Ok(())
}

pub(crate) fn check_indices(axes: Axes, idx: &[usize], n_minor: usize, base: usize) -> Result<()> {
    if let Some(&bad) = idx.iter().find(|&&c| c < base || c - base >= n_minor) {
        return Err(SparseError::size(format!(
            "{} entry {} out of bounds ({} = {}, base = {})",
            axes.idx, bad, axes.minor, n_minor, base
        )));
    }
    Ok(())
}

impl<T: fmt::Debug + Copy + Num> fmt::Debug for SparseMatrixCSR<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SparseMatrixCSR {{")?;
        writeln!(f, "  dimensions: {} × {}", self.n_rows, self.n_cols)?;
        writeln!(f, "  nnz: {}", self.nnz())?;
        writeln!(f, "  index base: {:?}", self.index_base)?;

        // Print a sample of the matrix content
        let max_rows_to_print = 5.min(self.n_rows);

        if max_rows_to_print > 0 {
            writeln!(f, "  content sample:")?;

            for i in 0..max_rows_to_print {
                write!(f, "    row {}: ", i)?;
                let range = self.row_range(i);

                if range.is_empty() {
                    writeln!(f, "(empty)")?;
                } else {
                    let max_elements = 5.min(range.len());

                    for j in range.start..(range.start + max_elements) {
                        write!(f, "({}, {:?}) ", self.col_idx[j], self.values[j])?;
                    }

                    if range.len() > max_elements {
                        write!(f, "... ({} more)", range.len() - max_elements)?;
                    }

                    writeln!(f)?;
                }
            }

            if self.n_rows > max_rows_to_print {
                writeln!(f, "    ... ({} more rows)", self.n_rows - max_rows_to_print)?;
            }
        }

        write!(f, "}}")
    }
}
