//! Status-returning routines over caller-owned buffers
//!
//! These mirror the classic sparse-BLAS calling convention: sizes are signed,
//! every buffer is optional (a missing buffer is `None`), and outputs are
//! written into slices the caller sized in advance. All preconditions are
//! checked before any output is touched, so an `Err` leaves every output
//! buffer exactly as it was.
//!
//! ```
//! use csrkit::routines::{self, CscOutput, CsrInput};
//! use csrkit::{Action, IndexBase};
//!
//! let row_ptr = [0, 2, 2, 4];
//! let col_idx = [2, 0, 1, 1];
//! let values = [5.0, 1.0, 2.0, 3.0];
//!
//! let mut col_ptr = [0; 4];
//! let mut row_idx = [0; 4];
//! let mut csc_values = [0.0; 4];
//!
//! routines::csr2csc(
//!     CsrInput {
//!         m: 3, n: 3, nnz: 4,
//!         row_ptr: Some(&row_ptr),
//!         col_idx: Some(&col_idx),
//!         values: Some(&values),
//!     },
//!     CscOutput {
//!         col_ptr: Some(&mut col_ptr),
//!         row_idx: Some(&mut row_idx),
//!         values: Some(&mut csc_values),
//!         perm: None,
//!     },
//!     Action::Numeric,
//!     IndexBase::Zero,
//! )
//! .unwrap();
//!
//! assert_eq!(col_ptr, [0, 1, 3, 4]);
//! assert_eq!(row_idx, [0, 2, 2, 0]);
//! assert_eq!(csc_values, [1.0, 2.0, 3.0, 5.0]);
//! ```

use crate::error::{Result, SparseError};
use crate::matrix::config::TransformConfig;
use crate::matrix::conversion::{transpose_compressed, Compressed, Payload};
use crate::matrix::csr::{check_indices, check_pointers, Axes};
use crate::matrix::sort::sort_segments;
use crate::matrix::{Action, IndexBase, SparseMatrixCSR};

pub use crate::matrix::permutation::gather;

/// Borrowed CSR input of a conversion
#[derive(Debug, Clone, Copy)]
pub struct CsrInput<'a, T> {
    /// Number of rows
    pub m: isize,
    /// Number of columns
    pub n: isize,
    /// Number of stored entries
    pub nnz: isize,
    /// Row pointers, `m + 1` elements
    pub row_ptr: Option<&'a [usize]>,
    /// Column indices, `nnz` elements
    pub col_idx: Option<&'a [usize]>,
    /// Values, `nnz` elements; only read by `Action::Numeric`
    pub values: Option<&'a [T]>,
}

impl<'a, T> CsrInput<'a, T> {
    /// Borrows the arrays of a typed matrix
    pub fn from_matrix(matrix: &'a SparseMatrixCSR<T>) -> Result<Self> {
        Ok(Self {
            m: signed(matrix.n_rows)?,
            n: signed(matrix.n_cols)?,
            nnz: signed(matrix.col_idx.len())?,
            row_ptr: Some(&matrix.row_ptr),
            col_idx: Some(&matrix.col_idx),
            values: Some(&matrix.values),
        })
    }
}

/// Caller-sized CSC outputs of a conversion
#[derive(Debug)]
pub struct CscOutput<'a, T> {
    /// Column pointers, `n + 1` elements
    pub col_ptr: Option<&'a mut [usize]>,
    /// Row indices, `nnz` elements
    pub row_idx: Option<&'a mut [usize]>,
    /// Values, `nnz` elements; required by `Action::Numeric`, never
    /// written by `Action::Symbolic`
    pub values: Option<&'a mut [T]>,
    /// Optional destination-to-source positions, `nnz` elements
    pub perm: Option<&'a mut [usize]>,
}

/// Borrowed CSR structure sorted in place
#[derive(Debug)]
pub struct CsrStructureMut<'a> {
    /// Number of rows
    pub m: isize,
    /// Number of columns
    pub n: isize,
    /// Number of stored entries
    pub nnz: isize,
    /// Row pointers, `m + 1` elements
    pub row_ptr: Option<&'a [usize]>,
    /// Column indices, `nnz` elements, sorted in place
    pub col_idx: Option<&'a mut [usize]>,
}

pub(crate) fn signed(n: usize) -> Result<isize> {
    isize::try_from(n).map_err(|_| SparseError::size(format!("{} does not fit in isize", n)))
}

/// Checks signs and cross-consistency of the sizes
fn check_sizes(m: isize, n: isize, nnz: isize) -> Result<(usize, usize, usize)> {
    if m < 0 {
        return Err(SparseError::size(format!("m = {} is negative", m)));
    }
    if n < 0 {
        return Err(SparseError::size(format!("n = {} is negative", n)));
    }
    if nnz < 0 {
        return Err(SparseError::size(format!("nnz = {} is negative", nnz)));
    }
    if nnz > 0 && (m == 0 || n == 0) {
        return Err(SparseError::size(format!(
            "nnz = {} entries cannot fit a {} x {} matrix",
            nnz, m, n
        )));
    }
    Ok((m as usize, n as usize, nnz as usize))
}

/// A buffer that must be present whenever `len > 0`
fn require<'a, E>(buf: Option<&'a [E]>, len: usize, arg: &'static str) -> Result<&'a [E]> {
    match buf {
        Some(b) if b.len() >= len => Ok(&b[..len]),
        Some(b) => Err(SparseError::pointer(
            arg,
            format!("has {} elements, {} required", b.len(), len),
        )),
        None if len == 0 => Ok(&[]),
        None => Err(SparseError::pointer(arg, "is missing")),
    }
}

fn require_mut<'a, E>(buf: Option<&'a mut [E]>, len: usize, arg: &'static str) -> Result<&'a mut [E]> {
    match buf {
        Some(b) if b.len() >= len => Ok(&mut b[..len]),
        Some(b) => Err(SparseError::pointer(
            arg,
            format!("has {} elements, {} required", b.len(), len),
        )),
        None if len == 0 => Ok(&mut []),
        None => Err(SparseError::pointer(arg, "is missing")),
    }
}

/// A buffer that is optional, but must be large enough when present
fn optional_mut<'a, E>(
    buf: Option<&'a mut [E]>,
    len: usize,
    arg: &'static str,
) -> Result<Option<&'a mut [E]>> {
    buf.map(|b| require_mut(Some(b), len, arg)).transpose()
}

/// Validates the row structure, returning the trimmed row pointers
fn check_structure<'a>(
    m: usize,
    n: usize,
    nnz: usize,
    row_ptr: Option<&'a [usize]>,
    col_idx: &[usize],
    base: usize,
) -> Result<&'a [usize]> {
    if m == 0 {
        return Ok(&[]);
    }
    let row_ptr = require(row_ptr, m + 1, "csr_row_ptr")?;
    check_pointers(Axes::ROWS, row_ptr, nnz, base)?;
    check_indices(Axes::ROWS, col_idx, n, base)?;
    Ok(row_ptr)
}

/// Converts a CSR matrix to CSC with the default configuration
///
/// See [`csr2csc_with`].
pub fn csr2csc<T>(
    input: CsrInput<'_, T>,
    output: CscOutput<'_, T>,
    action: Action,
    base: IndexBase,
) -> Result<()>
where
    T: Copy + Send + Sync,
{
    csr2csc_with(input, output, action, base, &TransformConfig::default())
}

/// Converts a CSR matrix to CSC
///
/// # Errors
///
/// - `InvalidSize` if `m`, `n` or `nnz` is negative, if `nnz > 0` with an
///   empty dimension, or if the row pointers or column indices break the
///   CSR invariants
/// - `InvalidPointer` if a buffer required by the sizes and `action` is
///   missing or shorter than required
/// - `AllocationFailure` if the column counts cannot be allocated
///
/// With `nnz == 0` the column pointers (when given) are filled with the
/// index base and nothing else is written.
pub fn csr2csc_with<T>(
    input: CsrInput<'_, T>,
    output: CscOutput<'_, T>,
    action: Action,
    base: IndexBase,
    config: &TransformConfig,
) -> Result<()>
where
    T: Copy + Send + Sync,
{
    let (m, n, nnz) = check_sizes(input.m, input.n, input.nnz)?;
    let offset = base.offset();

    let col_idx = require(input.col_idx, nnz, "csr_col_idx")?;
    let csr_values = match action {
        Action::Numeric => Some(require(input.values, nnz, "csr_values")?),
        Action::Symbolic => None,
    };

    let col_ptr = if n > 0 {
        Some(require_mut(output.col_ptr, n + 1, "csc_col_ptr")?)
    } else {
        optional_mut(output.col_ptr, 1, "csc_col_ptr")?
    };
    let row_idx = require_mut(output.row_idx, nnz, "csc_row_idx")?;
    let csc_values = match action {
        Action::Numeric => Some(require_mut(output.values, nnz, "csc_values")?),
        Action::Symbolic => None,
    };
    let perm = optional_mut(output.perm, nnz, "perm")?;

    let row_ptr = check_structure(m, n, nnz, input.row_ptr, col_idx, offset)?;

    let Some(col_ptr) = col_ptr else {
        // n == 0, hence nnz == 0: nothing to write
        return Ok(());
    };
    if nnz == 0 {
        col_ptr.fill(offset);
        return Ok(());
    }

    transpose_compressed(
        Compressed {
            n_major: m,
            n_minor: n,
            ptr: row_ptr,
            idx: col_idx,
            base: offset,
        },
        col_ptr,
        row_idx,
        Payload {
            values: csr_values.zip(csc_values),
            perm,
        },
        config,
    )
}

/// Sorts the column indices of every row in place with the default
/// configuration
///
/// See [`csrsort_with`].
pub fn csrsort(csr: CsrStructureMut<'_>, perm: Option<&mut [usize]>, base: IndexBase) -> Result<()> {
    csrsort_with(csr, perm, base, &TransformConfig::default())
}

/// Sorts the column indices of every row in place
///
/// When `perm` is given it is permuted together with the column indices;
/// initialise it with [`create_identity_permutation`] to obtain the
/// destination-to-source map, then reorder values with [`gather`]. Ties keep
/// their stored order.
///
/// # Errors
///
/// Same taxonomy as [`csr2csc_with`].
pub fn csrsort_with(
    csr: CsrStructureMut<'_>,
    perm: Option<&mut [usize]>,
    base: IndexBase,
    config: &TransformConfig,
) -> Result<()> {
    let (m, n, nnz) = check_sizes(csr.m, csr.n, csr.nnz)?;
    let offset = base.offset();

    let col_idx = require_mut(csr.col_idx, nnz, "csr_col_idx")?;
    let perm = optional_mut(perm, nnz, "perm")?;
    let row_ptr = check_structure(m, n, nnz, csr.row_ptr, col_idx, offset)?;

    if nnz == 0 {
        return Ok(());
    }

    sort_segments(row_ptr, offset, col_idx, perm, config);
    Ok(())
}

/// Fills `perm[..n]` with the identity permutation
pub fn create_identity_permutation(n: isize, perm: Option<&mut [usize]>) -> Result<()> {
    if n < 0 {
        return Err(SparseError::size(format!("n = {} is negative", n)));
    }
    let perm = require_mut(perm, n as usize, "perm")?;
    for (i, p) in perm.iter_mut().enumerate() {
        *p = i;
    }
    Ok(())
}
