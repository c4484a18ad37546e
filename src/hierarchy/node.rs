//! Dendrogram nodes.

use core::fmt;
use core::ops::Range;

/// Index of a node inside a [`Dendrogram`](super::Dendrogram).
///
/// Leaves use their original element index; internal nodes follow in merge
/// order (`n_leaves + merge_index`).
pub type NodeId = usize;

/// What a node is: an original element or a merge of two subtrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClusterNode {
    /// An original element, by index.
    Leaf(usize),
    /// A merge; `left` is laid out before `right`.
    Internal {
        /// Child laid out first.
        left: NodeId,
        /// Child laid out second.
        right: NodeId,
        /// Dissimilarity at which the merge happened.
        height: f64,
    },
}

/// A node together with its cached layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Node id.
    pub id: NodeId,
    /// Leaf or merge.
    pub content: ClusterNode,
    /// Number of leaves below (1 for a leaf).
    pub size: usize,
    /// Leaf-order positions covered, `[lo, hi)`.
    pub leaf_range: Range<usize>,
}

impl Node {
    /// Whether this is a leaf node.
    pub fn is_leaf(&self) -> bool {
        matches!(self.content, ClusterNode::Leaf(_))
    }

    /// The original element index if this is a leaf.
    pub fn as_leaf(&self) -> Option<usize> {
        match self.content {
            ClusterNode::Leaf(index) => Some(index),
            ClusterNode::Internal { .. } => None,
        }
    }

    /// `(left, right)` if this is a merge.
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self.content {
            ClusterNode::Internal { left, right, .. } => Some((left, right)),
            ClusterNode::Leaf(_) => None,
        }
    }

    /// Merge height; leaves sit at 0.
    pub fn height(&self) -> f64 {
        match self.content {
            ClusterNode::Internal { height, .. } => height,
            ClusterNode::Leaf(_) => 0.0,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.content {
            ClusterNode::Leaf(index) => {
                write!(f, "Leaf[{}] @{}", index, self.leaf_range.start)
            }
            ClusterNode::Internal {
                left,
                right,
                height,
            } => write!(
                f,
                "Node[{}] ({} + {}) h={} [{}, {})",
                self.id, left, right, height, self.leaf_range.start, self.leaf_range.end
            ),
        }
    }
}
