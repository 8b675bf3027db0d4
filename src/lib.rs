//! # csrkit: CSR to CSC conversion and in-row CSR sorting
//!
//! Two structural transforms on compressed sparse matrices, each able to
//! report a permutation instead of moving values:
//!
//! 1. **Conversion**: CSR → CSC, stable within each column, duplicates kept.
//!    A *numeric* conversion moves values; a *symbolic* one returns the
//!    destination-to-source permutation so any number of value arrays can be
//!    gathered later.
//!
//! 2. **Row sort**: sorts the column indices of each row in place. Ties keep
//!    their stored order, and the optional permutation maps sorted positions
//!    back to the original ones.
//!
//! Both transforms accept zero- or one-based indices and run sequentially or
//! in parallel on `rayon`; the two schedules produce identical output.
//!
//! ## Usage
//!
//! ```
//! use csrkit::{Action, SparseMatrixCSR, TransformConfig};
//!
//! let csr = SparseMatrixCSR::new(
//!     3, 3,
//!     vec![0, 2, 2, 4],
//!     vec![2, 0, 1, 1],
//!     vec![5.0, 1.0, 2.0, 3.0],
//! );
//!
//! let csc = csr.to_csc();
//! assert_eq!(csc.col_ptr, vec![0, 1, 3, 4]);
//! assert_eq!(csc.values, vec![1.0, 2.0, 3.0, 5.0]);
//!
//! let symbolic = csr.convert(Action::Symbolic, &TransformConfig::default()).unwrap();
//! assert_eq!(symbolic.permutation.unwrap().as_slice(), &[1, 2, 3, 0]);
//! ```
//!
//! The [`routines`] module offers the same transforms over caller-owned
//! buffers with signed sizes, and [`validation`] holds the reference oracle.

pub mod error;
pub mod io;
pub mod matrix;
pub mod routines;
pub mod sweep;
pub mod utils;
pub mod validation;

// Re-export primary types and functions
pub use error::{Result, SparseError};
pub use matrix::{
    reference_csr2csc, reference_csrsort, Action, CscConversion, Execution, IndexBase,
    Permutation, SparseMatrixCSC, SparseMatrixCSR, SystemParameters, TransformConfig,
};
pub use utils::{from_sprs_csc, from_sprs_csr, to_sprs_csc, to_sprs_csr};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
