//! Order-constrained Ward clustering.
//!
//! Standard agglomerative clustering may merge any two clusters. Here only
//! clusters that are *neighbors* in a fixed element order may merge, so
//! every cluster is a contiguous run of that order and the tree's leaf order
//! is the given order:
//!
//! ```text
//! order:      a   b   c   d   e
//! candidates:   ab  bc  cd  de          (n − 1 pairs, not n(n−1)/2)
//! merge bc:   a  [b c]  d   e
//! candidates:   a·bc  bc·d  de          (only the two new pairs change)
//! ```
//!
//! # Cost
//!
//! Each step takes the adjacent pair with the smallest Ward height (leftmost
//! on ties). Candidates live in a binary heap; entries that went stale when a
//! neighbor merged are discarded as they surface. A run `[lo, hi)` is never
//! formed twice, so a candidate is current iff both of its runs still exist.
//! Each merge updates one row of [`ClusterDistances`] in O(n), so a full
//! build is O(n²) time and memory.
//!
//! # Inversions
//!
//! The adjacency constraint can make a merge cheaper than one below it. Such
//! a merge is lifted to its highest child so heights never decrease towards
//! the root.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::ward::{ClusterDistances, WardMethod};
use crate::error::{Error, Result};
use crate::hierarchy::{Dendrogram, NodeId};
use crate::permutation::Permutation;
use ndarray::ArrayView2;

/// Order-constrained hierarchical clustering with Ward linkage.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderedClustering {
    /// Ward variant.
    method: WardMethod,
}

/// Merge candidate: runs `[start, mid)` and `[mid, end)`.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    height: f64,
    start: usize,
    mid: usize,
    end: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    /// Reversed so the max-heap pops the lowest height, then the leftmost.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .height
            .total_cmp(&self.height)
            .then_with(|| other.start.cmp(&self.start))
    }
}

impl OrderedClustering {
    /// Create a clusterer using the given Ward variant.
    pub fn new(method: WardMethod) -> Self {
        Self { method }
    }

    /// Set the Ward variant.
    pub fn with_method(mut self, method: WardMethod) -> Self {
        self.method = method;
        self
    }

    /// The configured Ward variant.
    pub fn method(&self) -> WardMethod {
        self.method
    }

    /// Build a dendrogram whose clusters are contiguous runs of `order`.
    ///
    /// `dissimilarity` is an `n × n` matrix indexed by original element;
    /// `order[p]` is the element at position `p`.
    pub fn build(&self, order: &Permutation, dissimilarity: ArrayView2<'_, f64>) -> Result<Dendrogram> {
        let (rows, cols) = dissimilarity.dim();
        if rows != cols {
            return Err(Error::InvalidInput(format!(
                "dissimilarity matrix must be square, got {rows}x{cols}"
            )));
        }
        if order.len() != rows {
            return Err(Error::DimensionMismatch {
                expected: rows,
                found: order.len(),
            });
        }
        if let Some(((r, c), v)) = dissimilarity.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "non-finite dissimilarity {v} at ({r}, {c})"
            )));
        }

        let n = order.len();
        if n == 0 {
            return Err(Error::InvalidInput("cannot cluster zero elements".into()));
        }

        let mut dist = ClusterDistances::new(order, dissimilarity, self.method);
        let candidate = |dist: &ClusterDistances, start: usize, mid: usize, end: usize| {
            dist.height(start, mid).map(|height| Candidate {
                height,
                start,
                mid,
                end,
            })
        };

        // Runs are keyed by their start position.
        let mut alive = vec![true; n];
        let mut end_of: Vec<usize> = (1..=n).collect();
        let mut start_of_end: Vec<usize> = (0..=n).map(|e| e.saturating_sub(1)).collect();
        let mut node_of: Vec<NodeId> = order.as_slice().to_vec();
        let mut height_of = vec![0.0f64; n];

        let mut heap = BinaryHeap::with_capacity(2 * n);
        for p in 0..n.saturating_sub(1) {
            heap.push(candidate(&dist, p, p + 1, p + 2)?);
        }

        let mut merges: Vec<(NodeId, NodeId, f64)> = Vec::with_capacity(n - 1);
        let mut lifted = 0usize;
        while merges.len() + 1 < n {
            let Some(next) = heap.pop() else {
                return Err(Error::NumericInstability(
                    "ran out of merge candidates before reaching the root".into(),
                ));
            };
            let Candidate {
                height: cost,
                start,
                mid,
                end,
            } = next;
            let current = alive[start] && end_of[start] == mid && alive[mid] && end_of[mid] == end;
            if !current {
                continue;
            }

            let floor = height_of[start].max(height_of[mid]);
            let height = if cost < floor {
                lifted += 1;
                tracing::warn!(
                    start,
                    end,
                    cost,
                    raised_to = floor,
                    "constrained merge below its children; height raised"
                );
                floor
            } else {
                cost
            };

            let id = n + merges.len();
            merges.push((node_of[start], node_of[mid], height));

            alive[mid] = false;
            dist.merge(start, mid, &alive);
            end_of[start] = end;
            start_of_end[end] = start;
            node_of[start] = id;
            height_of[start] = height;

            if start > 0 {
                heap.push(candidate(&dist, start_of_end[start], start, end)?);
            }
            if end < n {
                heap.push(candidate(&dist, start, end, end_of[end])?);
            }
        }

        tracing::debug!(
            n,
            method = %self.method,
            lifted,
            "ordered clustering complete"
        );
        Dendrogram::assemble(n, &merges)
    }
}

/// Order-constrained Ward clustering of `dissimilarity` along `order`.
pub fn oclust(
    order: &Permutation,
    dissimilarity: ArrayView2<'_, f64>,
    method: WardMethod,
) -> Result<Dendrogram> {
    OrderedClustering::new(method).build(order, dissimilarity)
}
