//! Clustering along a fixed element order.
//!
//! ## Why constrain?
//!
//! After slanting, similar rows sit next to each other. Unconstrained
//! agglomerative clustering ignores that and may join row 0 with row 40,
//! producing a dendrogram that cannot be drawn next to the matrix without
//! crossing lines.
//!
//! **Order-constrained** clustering only merges clusters that are adjacent
//! in the order. Every cluster is then a contiguous block of rows, and the
//! dendrogram's leaf order is the slanted order itself:
//!
//! ```text
//! slanted order:   r3 r0 r4 | r1 r2 | r5
//!                  └──┬───┘   └─┬┘    │
//!                     └─────┬───┘     │
//!                           └────┬────┘
//! ```
//!
//! ## Ward linkage
//!
//! | Method | Recurrence runs on | Reported height |
//! |--------|--------------------|-----------------|
//! | `ward.D` | `d` | `W` |
//! | `ward.D2` | `d²` | `√W` |
//!
//! `ward.D2` is the default and matches Ward's variance criterion for
//! Euclidean input.
//!
//! ## Usage
//!
//! ```rust
//! use ndarray::array;
//! use slanter::cluster::{oclust, WardMethod};
//! use slanter::Permutation;
//!
//! let d = array![
//!     [0.0, 0.1, 10.0, 10.0],
//!     [0.1, 0.0, 10.0, 10.0],
//!     [10.0, 10.0, 0.0, 0.2],
//!     [10.0, 10.0, 0.2, 0.0],
//! ];
//! let tree = oclust(&Permutation::identity(4), d.view(), WardMethod::WardD2).unwrap();
//! assert_eq!(tree.cut_boundaries(2).unwrap(), vec![2]);
//! ```

mod oclust;
mod ward;

pub use oclust::{oclust, OrderedClustering};
pub use ward::WardMethod;
