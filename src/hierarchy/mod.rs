//! Order-compatible merge trees.
//!
//! # The Problem
//!
//! An agglomerative clustering tree says *what* merged and *when*, but not
//! which child goes left. Every merge can be flipped, so one tree has
//! `2^(n-1)` equally valid leaf orders, and drawing an arbitrary one next to
//! a slanted matrix scrambles structure that is really there:
//!
//! ```text
//!   slanted rows:  0 1 2 3 4 5
//!   naive tree:    3 4 5 2 1 0    (valid, but fights the matrix)
//!   compatible:    0 1 2 3 4 5    (same tree, merges flipped)
//! ```
//!
//! A tree is *order-compatible* with a total order when every cluster is a
//! contiguous run of it. Two ways to get one:
//!
//! - build it under the constraint ([`crate::cluster::oclust`]), or
//! - flip an existing tree towards the order ([`reorder_hclust`]).
//!
//! # Representation
//!
//! [`Dendrogram`] stores nodes in an arena: leaves at ids `0..n`, merges at
//! `n..2n-1` in creation order. Each [`Node`] caches its size and the
//! leaf-order positions it covers, so cutting the tree into `k` contiguous
//! groups is a lookup over the last `k - 1` merges.
//!
//! ```text
//!         6 (height=1.0)
//!        / \
//!       4   5 (height=0.7)
//!      / \ / \
//!     0  1 2  3 (leaves)
//! ```

mod dendrogram;
mod node;
mod reorder;
mod validate;

pub use dendrogram::{Dendrogram, Merge};
pub use node::{ClusterNode, Node, NodeId};
pub use reorder::reorder_hclust;
pub use validate::{Severity, ValidationIssue, ValidationReport};
