//! Error types for csrkit

use thiserror::Error;

/// Result type alias using csrkit's error
pub type Result<T> = std::result::Result<T, SparseError>;

/// Failure outcomes of the conversion and sorting routines
///
/// Every precondition is checked before any output buffer is written, so
/// an `Err` always means the outputs are untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SparseError {
    /// A size is negative, or sizes contradict each other
    #[error("Invalid size: {reason}")]
    InvalidSize {
        /// What was wrong with the sizes
        reason: String,
    },

    /// An enumerated option had an unrecognized value
    #[error("Invalid value {value} for '{option}'")]
    InvalidValue {
        /// The option name
        option: &'static str,
        /// The rejected raw value
        value: i64,
    },

    /// A required buffer is absent, or too short for the declared size
    #[error("Invalid pointer: '{arg}' {reason}")]
    InvalidPointer {
        /// The buffer name
        arg: &'static str,
        /// Why the buffer was rejected
        reason: String,
    },

    /// A scratch buffer could not be allocated
    #[error("Allocation failure: could not reserve {len} elements for '{buffer}'")]
    AllocationFailure {
        /// The scratch buffer name
        buffer: &'static str,
        /// Requested element count
        len: usize,
    },

    /// Reading or writing a matrix file failed
    #[error("I/O error: {0}")]
    Io(String),

    /// A matrix file was readable but malformed
    #[error("Malformed matrix file: {0}")]
    Format(String),

    /// A matrix cannot be handed to an external sparse library as-is
    #[error("Interop error: {0}")]
    Interop(String),
}

impl SparseError {
    pub(crate) fn size(reason: impl Into<String>) -> Self {
        SparseError::InvalidSize {
            reason: reason.into(),
        }
    }

    pub(crate) fn pointer(arg: &'static str, reason: impl Into<String>) -> Self {
        SparseError::InvalidPointer {
            arg,
            reason: reason.into(),
        }
    }

    /// Short name of the outcome kind, used in sweep reports
    pub fn kind(&self) -> &'static str {
        match self {
            SparseError::InvalidSize { .. } => "InvalidSize",
            SparseError::InvalidValue { .. } => "InvalidValue",
            SparseError::InvalidPointer { .. } => "InvalidPointer",
            SparseError::AllocationFailure { .. } => "AllocationFailure",
            SparseError::Io(_) => "Io",
            SparseError::Format(_) => "Format",
            SparseError::Interop(_) => "Interop",
        }
    }
}

impl From<std::io::Error> for SparseError {
    fn from(err: std::io::Error) -> Self {
        SparseError::Io(err.to_string())
    }
}

/// Allocates a zero-filled scratch vector, reporting allocation failure
/// instead of aborting.
pub(crate) fn try_alloc<T: Clone>(buffer: &'static str, len: usize, fill: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| SparseError::AllocationFailure { buffer, len })?;
    v.resize(len, fill);
    Ok(v)
}
