//! Dendrogram: a rooted binary merge tree with a fixed leaf layout.
//!
//! Nodes live in one arena. Leaves take ids `0..n` (the original element
//! index), and merge `i` creates node `n + i`, the SciPy/kodama labelling.
//! Children therefore always have smaller ids than their parent, and the
//! root is the last node.
//!
//! Walking the tree left-child-first gives the *leaf order*; each node
//! caches the run of leaf-order positions it covers:
//!
//! ```text
//!            6  [0, 4)
//!          /   \
//!   [0, 2) 4     5 [2, 4)
//!         / \   / \
//!        2   0 1   3        leaf order: 2 0 1 3
//! ```

use core::ops::Range;

use super::node::{ClusterNode, Node, NodeId};
use crate::error::{Error, Result};
use crate::permutation::Permutation;

/// A single merge in the dendrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Merge {
    /// Id of the node created by this merge.
    pub id: NodeId,
    /// Child laid out first.
    pub left: NodeId,
    /// Child laid out second.
    pub right: NodeId,
    /// Dissimilarity at which the merge occurred.
    pub height: f64,
    /// Size of the resulting cluster.
    pub size: usize,
}

/// A rooted binary tree over `n` leaves with `n - 1` merges.
///
/// With the `serde` feature it serializes as its merge list and is rebuilt
/// through [`Dendrogram::from_merges`] on the way back in.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "MergeList", into = "MergeList")
)]
pub struct Dendrogram {
    /// Leaves first, then merges in creation order.
    nodes: Vec<Node>,
    /// Leaves in left-to-right layout order.
    order: Permutation,
}

impl Dendrogram {
    /// Build a dendrogram from an externally produced merge list.
    ///
    /// `merges[i] = (a, b, height)` joins nodes `a` and `b` into node
    /// `n_leaves + i`; `a` is laid out first. Every node other than the root
    /// must be merged exactly once, always into a later node.
    pub fn from_merges(n_leaves: usize, merges: &[(NodeId, NodeId, f64)]) -> Result<Self> {
        if n_leaves == 0 {
            return Err(Error::InvalidInput("a dendrogram needs at least one leaf".into()));
        }
        if merges.len() != n_leaves - 1 {
            return Err(Error::DimensionMismatch {
                expected: n_leaves - 1,
                found: merges.len(),
            });
        }

        let mut merged = vec![false; 2 * n_leaves - 1];
        for (i, &(a, b, height)) in merges.iter().enumerate() {
            let id = n_leaves + i;
            for child in [a, b] {
                if child >= id {
                    return Err(Error::InvalidInput(format!(
                        "merge {i} refers to node {child}, which does not exist before node {id}"
                    )));
                }
                if merged[child] {
                    return Err(Error::InvalidInput(format!(
                        "node {child} is merged more than once (again in merge {i})"
                    )));
                }
                merged[child] = true;
            }
            if a == b {
                return Err(Error::InvalidInput(format!("merge {i} joins node {a} with itself")));
            }
            if !height.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "merge {i} has non-finite height {height}"
                )));
            }
        }

        Self::assemble(n_leaves, merges)
    }

    /// Lay out an already-consistent merge list.
    pub(crate) fn assemble(n_leaves: usize, merges: &[(NodeId, NodeId, f64)]) -> Result<Self> {
        let n_nodes = n_leaves + merges.len();
        let mut content: Vec<ClusterNode> = (0..n_leaves).map(ClusterNode::Leaf).collect();
        content.extend(
            merges
                .iter()
                .map(|&(left, right, height)| ClusterNode::Internal {
                    left,
                    right,
                    height,
                }),
        );

        // Left-first walk from the root.
        let mut order = Vec::with_capacity(n_leaves);
        let mut stack = vec![n_nodes - 1];
        while let Some(id) = stack.pop() {
            match content[id] {
                ClusterNode::Leaf(index) => order.push(index),
                ClusterNode::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        let order = Permutation::new(order)?;
        let ranks = order.ranks();

        let mut nodes: Vec<Node> = Vec::with_capacity(n_nodes);
        for (id, content) in content.into_iter().enumerate() {
            let (size, leaf_range) = match content {
                ClusterNode::Leaf(index) => (1, ranks[index]..ranks[index] + 1),
                ClusterNode::Internal { left, right, .. } => {
                    let (l, r) = (&nodes[left], &nodes[right]);
                    (l.size + r.size, l.leaf_range.start..r.leaf_range.end)
                }
            };
            nodes.push(Node {
                id,
                content,
                size,
                leaf_range,
            });
        }

        Ok(Self { nodes, order })
    }

    #[cfg(test)]
    pub(crate) fn from_parts_unchecked(nodes: Vec<Node>, order: Permutation) -> Self {
        Self { nodes, order }
    }

    /// Number of original items.
    pub fn n_leaves(&self) -> usize {
        self.order.len()
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.nodes.len() - self.n_leaves()
    }

    /// Total number of nodes (`2n - 1`).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a dendrogram has at least one leaf.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Id of the root node.
    pub fn root(&self) -> NodeId {
        self.nodes.len() - 1
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes, leaves first, then merges in creation order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Iterate over merges in creation order.
    pub fn merges(&self) -> impl Iterator<Item = Merge> + '_ {
        self.nodes[self.n_leaves()..].iter().filter_map(|node| {
            let (left, right) = node.children()?;
            Some(Merge {
                id: node.id,
                left,
                right,
                height: node.height(),
                size: node.size,
            })
        })
    }

    /// The merge heights in creation order.
    pub fn heights(&self) -> Vec<f64> {
        self.merges().map(|m| m.height).collect()
    }

    /// Leaf order: position `p` shows original element `leaf_order()[p]`.
    pub fn leaf_order(&self) -> &Permutation {
        &self.order
    }

    /// Leaf-order positions covered by `id`.
    pub fn leaf_range(&self, id: NodeId) -> Option<Range<usize>> {
        self.nodes.get(id).map(|node| node.leaf_range.clone())
    }

    /// Parent of every node (`None` for the root).
    pub fn parents(&self) -> Vec<Option<NodeId>> {
        let mut parents = vec![None; self.nodes.len()];
        for merge in self.merges() {
            parents[merge.left] = Some(merge.id);
            parents[merge.right] = Some(merge.id);
        }
        parents
    }

    /// Roots of the `k` subtrees left after undoing the last `k - 1` merges,
    /// in leaf order.
    fn cut_roots(&self, k: usize) -> Result<Vec<NodeId>> {
        let n = self.n_leaves();
        if k == 0 || k > n {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be between 1 and the number of leaves",
            });
        }
        let threshold = 2 * n - k;
        let parents = self.parents();
        let mut roots: Vec<NodeId> = (0..threshold)
            .filter(|&id| parents[id].map_or(true, |p| p >= threshold))
            .collect();
        roots.sort_by_key(|&id| self.nodes[id].leaf_range.start);
        Ok(roots)
    }

    /// Get cluster assignments for `k` clusters.
    ///
    /// Undoes the last `k - 1` merges. Every group is a contiguous run of the
    /// leaf order, and labels increase along it: `labels[i]` is the group of
    /// original element `i`.
    pub fn cut_to_k(&self, k: usize) -> Result<Vec<usize>> {
        let roots = self.cut_roots(k)?;
        let mut labels = vec![0; self.n_leaves()];
        for (label, &id) in roots.iter().enumerate() {
            for position in self.nodes[id].leaf_range.clone() {
                labels[self.order.as_slice()[position]] = label;
            }
        }
        Ok(labels)
    }

    /// Leaf-order positions at which a new group starts when cutting into
    /// `k` groups (the first group, at 0, is omitted).
    pub fn cut_boundaries(&self, k: usize) -> Result<Vec<usize>> {
        Ok(self
            .cut_roots(k)?
            .into_iter()
            .skip(1)
            .map(|id| self.nodes[id].leaf_range.start)
            .collect())
    }
}

impl TryFrom<&kodama::Dendrogram<f64>> for Dendrogram {
    type Error = Error;

    /// Adopt a tree from kodama's generic agglomerative clustering.
    fn try_from(dendrogram: &kodama::Dendrogram<f64>) -> Result<Self> {
        let merges: Vec<(NodeId, NodeId, f64)> = dendrogram
            .steps()
            .iter()
            .map(|step| (step.cluster1, step.cluster2, step.dissimilarity))
            .collect();
        Self::from_merges(dendrogram.observations(), &merges)
    }
}

/// Serialized form of a [`Dendrogram`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct MergeList {
    n_leaves: usize,
    merges: Vec<(NodeId, NodeId, f64)>,
}

#[cfg(feature = "serde")]
impl From<Dendrogram> for MergeList {
    fn from(tree: Dendrogram) -> Self {
        Self {
            n_leaves: tree.n_leaves(),
            merges: tree.merges().map(|m| (m.left, m.right, m.height)).collect(),
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<MergeList> for Dendrogram {
    type Error = Error;

    fn try_from(list: MergeList) -> Result<Self> {
        Self::from_merges(list.n_leaves, &list.merges)
    }
}
