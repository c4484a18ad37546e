//! # slanter
//!
//! Slanted matrix orders and order-compatible hierarchical clustering, for
//! drawing heatmaps whose rows, columns and dendrograms agree.
//!
//! Three steps, each usable on its own:
//!
//! 1. [`SlantedOrder`] permutes rows and columns of a nonnegative matrix so
//!    its mass concentrates along the diagonal.
//! 2. [`oclust`] clusters elements under the constraint that only neighbors
//!    in a given order may merge, so the tree never contradicts the order.
//! 3. [`reorder_hclust`] flips the merges of an existing tree (for example
//!    from [`kodama`]) so its leaf order follows the slanted order.
//!
//! ```rust
//! use ndarray::array;
//! use slanter::{oclust, SlantedOrder, WardMethod};
//!
//! let similarity = array![
//!     [0.0, 9.0, 0.0, 1.0],
//!     [9.0, 0.0, 1.0, 0.0],
//!     [0.0, 1.0, 0.0, 9.0],
//!     [1.0, 0.0, 9.0, 0.0],
//! ];
//! let orders = SlantedOrder::new()
//!     .with_same_order(true)
//!     .solve(similarity.view())
//!     .unwrap();
//!
//! let dissimilarity = similarity.mapv(|s| 10.0 - s);
//! let tree = oclust(&orders.rows, dissimilarity.view(), WardMethod::WardD2).unwrap();
//! assert_eq!(tree.leaf_order(), &orders.rows);
//! ```

pub mod cluster;
/// Error types used across `slanter`.
pub mod error;
pub mod hierarchy;
pub mod order;
pub mod permutation;

pub use error::{Error, Result};
pub use permutation::Permutation;

pub use order::{
    slanted_orders, slanted_reorder, Convergence, SlantedOrder, SlantedOrders,
    DEFAULT_MAX_ITERATIONS,
};

pub use cluster::{oclust, OrderedClustering, WardMethod};

pub use hierarchy::{
    reorder_hclust, ClusterNode, Dendrogram, Merge, Node, NodeId, Severity, ValidationIssue,
    ValidationReport,
};
