//! Index base and conversion action enums

use crate::error::SparseError;

/// Offset added to every stored row/column index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexBase {
    /// Indices start at 0
    #[default]
    Zero,
    /// Indices start at 1
    One,
}

impl IndexBase {
    /// The integer offset this base represents
    pub fn offset(self) -> usize {
        match self {
            IndexBase::Zero => 0,
            IndexBase::One => 1,
        }
    }

    /// All supported index bases
    pub const ALL: [IndexBase; 2] = [IndexBase::Zero, IndexBase::One];
}

impl TryFrom<i32> for IndexBase {
    type Error = SparseError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(IndexBase::Zero),
            1 => Ok(IndexBase::One),
            other => Err(SparseError::InvalidValue {
                option: "index_base",
                value: other as i64,
            }),
        }
    }
}

/// Whether a conversion moves values or only computes the structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    /// Structure only; a permutation is produced in place of values
    Symbolic,
    /// Structure and values
    #[default]
    Numeric,
}

impl Action {
    /// All supported actions
    pub const ALL: [Action; 2] = [Action::Numeric, Action::Symbolic];
}

impl TryFrom<i32> for Action {
    type Error = SparseError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Action::Symbolic),
            1 => Ok(Action::Numeric),
            other => Err(SparseError::InvalidValue {
                option: "action",
                value: other as i64,
            }),
        }
    }
}
