// Matrix data structures and transforms

pub mod config;
pub mod conversion;
pub mod csc;
pub mod csr;
pub mod index;
pub mod permutation;
pub mod reference;
pub mod sort;

pub use config::{Execution, SystemParameters, TransformConfig};
pub use conversion::CscConversion;
pub use csc::SparseMatrixCSC;
pub use csr::SparseMatrixCSR;
pub use index::{Action, IndexBase};
pub use permutation::Permutation;
pub use reference::{reference_csr2csc, reference_csrsort};
