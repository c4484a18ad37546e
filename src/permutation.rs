//! Permutations of matrix axes and leaf sets.
//!
//! A [`Permutation`] maps a *position* `0..n` to the *original index* of the
//! element shown at that position:
//!
//! ```text
//! position:        0  1  2  3
//! original index:  2  0  3  1      perm[1] == 0
//! rank (inverse):  1  3  0  2      rank[0] == 1
//! ```
//!
//! It is produced once (by the order solver, by a dendrogram's leaf walk, or
//! by the caller) and never mutated afterwards.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2, Axis};

/// A bijection from positions `0..n` to original indices `0..n`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<usize>")
)]
pub struct Permutation(Vec<usize>);

impl Permutation {
    /// Validate and wrap `indices`, which must contain each of `0..len` once.
    pub fn new(indices: Vec<usize>) -> Result<Self> {
        let n = indices.len();
        let mut seen = vec![false; n];
        for (position, &index) in indices.iter().enumerate() {
            if index >= n {
                return Err(Error::InvalidInput(format!(
                    "permutation entry {index} at position {position} is out of range for length {n}"
                )));
            }
            if seen[index] {
                return Err(Error::InvalidInput(format!(
                    "permutation repeats index {index} (position {position})"
                )));
            }
            seen[index] = true;
        }
        Ok(Self(indices))
    }

    /// The identity permutation of length `n`.
    pub fn identity(n: usize) -> Self {
        Self((0..n).collect())
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the permutation is over zero elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Original indices in position order.
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Consume into the underlying index vector.
    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }

    /// Original index at `position`.
    pub fn get(&self, position: usize) -> Option<usize> {
        self.0.get(position).copied()
    }

    /// Iterate over original indices in position order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Whether every element sits at its own index.
    pub fn is_identity(&self) -> bool {
        self.0.iter().enumerate().all(|(p, &i)| p == i)
    }

    /// Position of each original index: `ranks()[i]` is where `i` is shown.
    pub fn ranks(&self) -> Vec<usize> {
        let mut ranks = vec![0; self.0.len()];
        for (position, &index) in self.0.iter().enumerate() {
            ranks[index] = position;
        }
        ranks
    }

    /// The inverse bijection (original index to position).
    pub fn inverse(&self) -> Self {
        Self(self.ranks())
    }

    /// Express `inner`, a permutation of an already-permuted axis, in terms
    /// of the original indices: `result[p] = self[inner[p]]`.
    pub fn compose(&self, inner: &Permutation) -> Result<Self> {
        if inner.len() != self.len() {
            return Err(Error::DimensionMismatch {
                expected: self.len(),
                found: inner.len(),
            });
        }
        Ok(Self(inner.iter().map(|p| self.0[p]).collect()))
    }

    /// Reorder the rows and columns of `matrix` by `rows` and `cols`.
    pub fn apply(
        rows: &Permutation,
        cols: &Permutation,
        matrix: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>> {
        let (n_rows, n_cols) = matrix.dim();
        if rows.len() != n_rows {
            return Err(Error::DimensionMismatch {
                expected: n_rows,
                found: rows.len(),
            });
        }
        if cols.len() != n_cols {
            return Err(Error::DimensionMismatch {
                expected: n_cols,
                found: cols.len(),
            });
        }
        Ok(matrix
            .select(Axis(0), rows.as_slice())
            .select(Axis(1), cols.as_slice()))
    }
}

impl TryFrom<Vec<usize>> for Permutation {
    type Error = Error;

    fn try_from(indices: Vec<usize>) -> Result<Self> {
        Self::new(indices)
    }
}

impl AsRef<[usize]> for Permutation {
    fn as_ref(&self) -> &[usize] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_rejects_non_bijection() {
        assert!(matches!(
            Permutation::new(vec![0, 0, 1]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            Permutation::new(vec![0, 3, 1]),
            Err(Error::InvalidInput(_))
        ));
        assert!(Permutation::new(vec![]).unwrap().is_empty());
    }

    #[test]
    fn test_ranks_invert_positions() {
        let p = Permutation::new(vec![2, 0, 3, 1]).unwrap();
        assert_eq!(p.ranks(), vec![1, 3, 0, 2]);
        assert_eq!(p.inverse().inverse(), p);
        assert!(!p.is_identity());
        assert!(Permutation::identity(5).is_identity());
    }

    #[test]
    fn test_compose_follows_inner_positions() {
        let outer = Permutation::new(vec![2, 0, 1]).unwrap();
        let inner = Permutation::new(vec![1, 2, 0]).unwrap();
        let composed = outer.compose(&inner).unwrap();
        assert_eq!(composed.as_slice(), &[0, 1, 2]);

        let short = Permutation::identity(2);
        assert!(matches!(
            outer.compose(&short),
            Err(Error::DimensionMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn test_apply_permutes_both_axes() {
        let m = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let rows = Permutation::new(vec![2, 0, 1]).unwrap();
        let cols = Permutation::new(vec![1, 0]).unwrap();
        let out = Permutation::apply(&rows, &cols, m.view()).unwrap();
        assert_eq!(out, array![[6.0, 5.0], [2.0, 1.0], [4.0, 3.0]]);

        assert!(Permutation::apply(&cols, &cols, m.view()).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_validates() {
        let p: Permutation = serde_json::from_str("[2, 0, 1]").unwrap();
        assert_eq!(p.ranks(), vec![1, 2, 0]);
        assert_eq!(serde_json::to_string(&p).unwrap(), "[2,0,1]");

        assert!(serde_json::from_str::<Permutation>("[0, 0, 7]").is_err());
        assert!(serde_json::from_str::<Permutation>("[1]").is_err());
    }
}
