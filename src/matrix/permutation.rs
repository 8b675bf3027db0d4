//! Position permutations produced by symbolic conversion and permuted sorting

use crate::error::{Result, SparseError};

/// A bijection from destination position to source position
///
/// `perm[i] = j` means the value at position `j` of the original array ends
/// up at position `i` of the reordered array. Permutations are always
/// zero-based, whatever the index base of the matrix they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    perm: Vec<usize>,
}

impl Permutation {
    /// The identity permutation on `[0, n)`
    pub fn identity(n: usize) -> Self {
        Self {
            perm: (0..n).collect(),
        }
    }

    /// Wraps a raw position array, checking that it is a bijection
    pub fn from_vec(perm: Vec<usize>) -> Result<Self> {
        if !is_bijection(&perm) {
            return Err(SparseError::pointer(
                "perm",
                "is not a permutation of [0, len)",
            ));
        }
        Ok(Self { perm })
    }

    pub(crate) fn from_vec_unchecked(perm: Vec<usize>) -> Self {
        debug_assert!(is_bijection(&perm));
        Self { perm }
    }

    /// Number of positions
    pub fn len(&self) -> usize {
        self.perm.len()
    }

    /// Whether the permutation is empty
    pub fn is_empty(&self) -> bool {
        self.perm.is_empty()
    }

    /// Whether this is the identity
    pub fn is_identity(&self) -> bool {
        self.perm.iter().enumerate().all(|(i, &p)| i == p)
    }

    /// The raw destination-to-source array
    pub fn as_slice(&self) -> &[usize] {
        &self.perm
    }

    /// Consumes the permutation, returning the raw array
    pub fn into_vec(self) -> Vec<usize> {
        self.perm
    }

    /// Reorders `src` into a new vector: `out[i] = src[perm[i]]`
    ///
    /// # Panics
    ///
    /// Panics if `src.len()` differs from the permutation length.
    pub fn gather<T: Copy>(&self, src: &[T]) -> Vec<T> {
        assert_eq!(src.len(), self.perm.len(), "src.len() must equal permutation length");
        self.perm.iter().map(|&p| src[p]).collect()
    }

    /// Reorders `src` into `dst` without allocating
    pub fn gather_into<T: Copy>(&self, src: &[T], dst: &mut [T]) -> Result<()> {
        gather(src, &self.perm, dst)
    }

    /// The inverse permutation (source position to destination position)
    pub fn inverse(&self) -> Self {
        let mut inv = vec![0; self.perm.len()];
        for (dst, &src) in self.perm.iter().enumerate() {
            inv[src] = dst;
        }
        Self { perm: inv }
    }

    /// The permutation that applies `self` first and then `then`
    ///
    /// `a.then(&b).gather(x) == b.gather(&a.gather(x))`
    pub fn then(&self, then: &Permutation) -> Self {
        assert_eq!(self.len(), then.len(), "permutation lengths must match");
        Self {
            perm: then.perm.iter().map(|&p| self.perm[p]).collect(),
        }
    }
}

impl AsRef<[usize]> for Permutation {
    fn as_ref(&self) -> &[usize] {
        &self.perm
    }
}

/// Whether `perm` is a bijection on `[0, perm.len())`
pub fn is_bijection(perm: &[usize]) -> bool {
    let mut seen = vec![false; perm.len()];
    for &p in perm {
        if p >= perm.len() || seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}

/// Gathers `dst[i] = src[perm[i]]`
///
/// Lengths and index ranges are checked before `dst` is written.
pub fn gather<T: Copy>(src: &[T], perm: &[usize], dst: &mut [T]) -> Result<()> {
    if dst.len() < perm.len() {
        return Err(SparseError::pointer(
            "dst",
            format!("has {} elements, {} required", dst.len(), perm.len()),
        ));
    }
    if let Some(&bad) = perm.iter().find(|&&p| p >= src.len()) {
        return Err(SparseError::pointer(
            "perm",
            format!("position {} out of range for source of length {}", bad, src.len()),
        ));
    }

    for (d, &p) in dst.iter_mut().zip(perm) {
        *d = src[p];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let p = Permutation::identity(4);
        assert!(p.is_identity());
        assert_eq!(p.gather(&[1, 2, 3, 4]), vec![1, 2, 3, 4]);
        assert!(Permutation::identity(0).is_empty());
    }

    #[test]
    fn test_from_vec_rejects_non_bijection() {
        assert!(Permutation::from_vec(vec![2, 0, 1]).is_ok());
        assert!(Permutation::from_vec(vec![0, 0, 1]).is_err());
        assert!(Permutation::from_vec(vec![0, 3, 1]).is_err());
    }

    #[test]
    fn test_gather_and_inverse() {
        let p = Permutation::from_vec(vec![2, 0, 1]).unwrap();
        let src = ['a', 'b', 'c'];
        let out = p.gather(&src);
        assert_eq!(out, vec!['c', 'a', 'b']);

        // Inverse undoes the reorder
        assert_eq!(p.inverse().gather(&out), src.to_vec());
    }

    #[test]
    fn test_then() {
        let a = Permutation::from_vec(vec![1, 2, 0]).unwrap();
        let b = Permutation::from_vec(vec![2, 1, 0]).unwrap();
        let x = [10, 20, 30];
        assert_eq!(a.then(&b).gather(&x), b.gather(&a.gather(&x)));
    }

    #[test]
    fn test_gather_checks_before_writing() {
        let mut dst = [0; 3];
        let err = gather(&[1, 2, 3], &[0, 5, 1], &mut dst).unwrap_err();
        assert!(matches!(err, SparseError::InvalidPointer { arg: "perm", .. }));
        assert_eq!(dst, [0, 0, 0]);

        let mut short = [0; 2];
        assert!(gather(&[1, 2, 3], &[0, 1, 2], &mut short).is_err());
    }
}
