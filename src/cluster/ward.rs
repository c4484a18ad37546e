//! Ward dissimilarity between neighboring clusters of an ordered element set.
//!
//! Distances between the live clusters follow the Lance–Williams update for
//! Ward's method. When clusters `i` and `j` merge, every other live cluster
//! `k` gets
//!
//! ```text
//! d(k, i∪j) = ((nᵢ+nₖ)·d(k,i) + (nⱼ+nₖ)·d(k,j) − nₖ·d(i,j)) / (nᵢ+nⱼ+nₖ)
//! ```
//!
//! Clusters are contiguous runs of the order, so each one is keyed by the
//! position where it starts and the merged cluster keeps the left key. Only
//! adjacent pairs are ever merge candidates, but the whole row is updated:
//! a cluster that is not a neighbor now may become one later.
//!
//! `ward.D2` feeds squared dissimilarities through the recurrence and takes
//! the square root at the end; `ward.D` uses them as given.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};
use crate::permutation::Permutation;
use ndarray::{Array2, ArrayView2};

/// Ward variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WardMethod {
    /// `ward.D`: the recurrence runs on the dissimilarities themselves.
    WardD,
    /// `ward.D2`: the recurrence runs on squared dissimilarities and merge
    /// heights are reported on the original scale.
    #[default]
    WardD2,
}

impl WardMethod {
    /// Whether dissimilarities are squared before merging.
    pub fn squares_input(self) -> bool {
        matches!(self, WardMethod::WardD2)
    }

    /// Conventional name (`"ward.D"` / `"ward.D2"`).
    pub fn name(self) -> &'static str {
        match self {
            WardMethod::WardD => "ward.D",
            WardMethod::WardD2 => "ward.D2",
        }
    }
}

impl fmt::Display for WardMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WardMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ward.D" => Ok(WardMethod::WardD),
            "ward.D2" => Ok(WardMethod::WardD2),
            _ => Err(Error::InvalidParameter {
                name: "method",
                message: "expected \"ward.D\" or \"ward.D2\"",
            }),
        }
    }
}

/// Lance–Williams distances between live clusters, keyed by start position.
#[derive(Debug)]
pub(crate) struct ClusterDistances {
    /// Symmetric; rows of merged-away clusters are stale.
    dist: Array2<f64>,
    size: Vec<usize>,
    method: WardMethod,
}

impl ClusterDistances {
    /// Symmetrize `(d(a,b) + d(b,a)) / 2`, zero the diagonal, square for
    /// `ward.D2`, and lay out in `order`.
    pub(crate) fn new(order: &Permutation, dissimilarity: ArrayView2<'_, f64>, method: WardMethod) -> Self {
        let idx = order.as_slice();
        let n = idx.len();
        let dist = Array2::from_shape_fn((n, n), |(p, q)| {
            if p == q {
                return 0.0;
            }
            let d = 0.5 * (dissimilarity[[idx[p], idx[q]]] + dissimilarity[[idx[q], idx[p]]]);
            if method.squares_input() {
                d * d
            } else {
                d
            }
        });
        Self {
            dist,
            size: vec![1; n],
            method,
        }
    }

    /// Ward merge height of the clusters starting at `a` and `b`.
    ///
    /// Negative values (non-Euclidean input) clamp to 0; anything
    /// non-finite is an error.
    pub(crate) fn height(&self, a: usize, b: usize) -> Result<f64> {
        let w = self.dist[[a, b]];
        if !w.is_finite() {
            return Err(Error::NumericInstability(format!(
                "{} distance between clusters at positions {a} and {b} is {w}",
                self.method
            )));
        }
        if w < 0.0 {
            tracing::warn!(a, b, w, "negative Ward distance clamped to 0");
        }
        let w = w.max(0.0);
        Ok(if self.method.squares_input() { w.sqrt() } else { w })
    }

    /// Fold cluster `b` into cluster `a`. `live[k]` marks the clusters still
    /// standing besides `a` and `b`.
    pub(crate) fn merge(&mut self, a: usize, b: usize, live: &[bool]) {
        let na = self.size[a] as f64;
        let nb = self.size[b] as f64;
        let dab = self.dist[[a, b]];
        for k in (0..live.len()).filter(|&k| live[k] && k != a && k != b) {
            let nk = self.size[k] as f64;
            let v = ((na + nk) * self.dist[[k, a]] + (nb + nk) * self.dist[[k, b]] - nk * dab)
                / (na + nb + nk);
            self.dist[[k, a]] = v;
            self.dist[[a, k]] = v;
        }
        self.size[a] += self.size[b];
    }
}
