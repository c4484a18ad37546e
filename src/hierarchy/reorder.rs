//! Reorient a dendrogram to follow an ideal leaf order.
//!
//! A binary tree over `n` leaves admits `2^(n-1)` layouts: every merge may
//! show either child first. Flipping a merge moves its two subtrees past
//! each other but leaves their insides, and every other subtree, alone. So
//! the orientation of each merge is an independent choice once its children
//! are laid out, and it can be made locally:
//!
//! ```text
//!  ideal ranks:  a=0 b=1 c=2 d=3
//!
//!        *                  *
//!       / \                / \
//!      *   *      ──►     *   *
//!     / \ / \            / \ / \
//!    d  c b  a          a  b c  d
//! ```
//!
//! Put first the child whose leaves have the smaller mean ideal rank, the
//! same center-of-mass comparison the order solver uses for rows. Equal means
//! keep the existing orientation.
//!
//! Topology and heights are untouched; the result is a new tree.

use super::node::{ClusterNode, NodeId};
use super::Dendrogram;
use crate::error::{Error, Result};
use crate::permutation::Permutation;

impl Dendrogram {
    /// Flip merges so the leaf order best matches `ideal`.
    ///
    /// `ideal[p]` is the original element that should appear at position
    /// `p`. Fails with `DimensionMismatch` if `ideal` is not over the same
    /// leaves as the tree.
    pub fn reorder(&self, ideal: &Permutation) -> Result<Dendrogram> {
        let n = self.n_leaves();
        if ideal.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: ideal.len(),
            });
        }
        let ranks = ideal.ranks();

        // Children precede parents, so one forward sweep sees every subtree
        // before the merge that uses it.
        let mut rank_sum = vec![0.0f64; self.len()];
        let mut merges: Vec<(NodeId, NodeId, f64)> = Vec::with_capacity(self.n_merges());
        let mut flipped = 0usize;
        for node in self.nodes() {
            match node.content {
                ClusterNode::Leaf(index) => rank_sum[node.id] = ranks[index] as f64,
                ClusterNode::Internal {
                    left,
                    right,
                    height,
                } => {
                    rank_sum[node.id] = rank_sum[left] + rank_sum[right];
                    let left_mean = rank_sum[left] / self.nodes()[left].size as f64;
                    let right_mean = rank_sum[right] / self.nodes()[right].size as f64;
                    if right_mean < left_mean {
                        flipped += 1;
                        merges.push((right, left, height));
                    } else {
                        merges.push((left, right, height));
                    }
                }
            }
        }

        tracing::debug!(n_leaves = n, flipped, "reoriented dendrogram");
        Dendrogram::assemble(n, &merges)
    }
}

/// Reorient `tree` so its leaf order best approximates `ideal`.
pub fn reorder_hclust(tree: &Dendrogram, ideal: &Permutation) -> Result<Dendrogram> {
    tree.reorder(ideal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// The tree from the module docs: ((d, c), (b, a)) with a..d = 0..3.
    fn reversed_pairs() -> Dendrogram {
        Dendrogram::from_merges(4, &[(3, 2, 1.0), (1, 0, 1.5), (4, 5, 3.0)]).unwrap()
    }

    fn children_sets(tree: &Dendrogram) -> Vec<(usize, [NodeId; 2], f64)> {
        tree.merges()
            .map(|m| {
                let mut pair = [m.left, m.right];
                pair.sort_unstable();
                (m.id, pair, m.height)
            })
            .collect()
    }

    #[test]
    fn test_flips_towards_ideal_order() {
        let tree = reversed_pairs();
        assert_eq!(tree.leaf_order().as_slice(), &[3, 2, 1, 0]);

        let out = reorder_hclust(&tree, &Permutation::identity(4)).unwrap();
        assert_eq!(out.leaf_order().as_slice(), &[0, 1, 2, 3]);
        assert_eq!(out.heights(), tree.heights());
        assert_eq!(children_sets(&out), children_sets(&tree));
        assert!(out.validate().is_clean());
    }

    #[test]
    fn test_matching_order_is_a_no_op() {
        let tree = reversed_pairs();
        let ideal = tree.leaf_order().clone();
        let out = tree.reorder(&ideal).unwrap();
        assert_eq!(out, tree);
    }

    #[test]
    fn test_equal_means_keep_orientation() {
        // Ideal order puts 1 and 2 between 0 and 3: the children {0, 3} and
        // {1, 2} of the root both have mean rank 1.5.
        let tree = Dendrogram::from_merges(4, &[(0, 3, 1.0), (1, 2, 1.0), (4, 5, 2.0)]).unwrap();
        let ideal = Permutation::new(vec![0, 1, 2, 3]).unwrap();
        let out = tree.reorder(&ideal).unwrap();
        assert_eq!(out.leaf_order().as_slice(), &[0, 3, 1, 2]);
    }

    #[test]
    fn test_rejects_other_leaf_count() {
        let tree = reversed_pairs();
        assert!(matches!(
            tree.reorder(&Permutation::identity(5)),
            Err(Error::DimensionMismatch { expected: 4, found: 5 })
        ));
    }

    #[test]
    fn test_reorders_kodama_tree() {
        // Points on a line: 0.0, 10.0, 0.5, 10.5 -> pairs {0, 2} and {1, 3}.
        let xs = [0.0f64, 10.0, 0.5, 10.5];
        let mut condensed = Vec::new();
        for i in 0..xs.len() {
            for j in (i + 1)..xs.len() {
                condensed.push((xs[i] - xs[j]).abs());
            }
        }
        let steps = kodama::linkage(&mut condensed, xs.len(), kodama::Method::Ward);
        let tree = Dendrogram::try_from(&steps).unwrap();

        // The target is compatible with the tree, so it is reached exactly.
        let ideal = Permutation::new(vec![3, 1, 2, 0]).unwrap();
        let out = tree.reorder(&ideal).unwrap();
        assert_eq!(out.leaf_order(), &ideal);
    }

    fn arbitrary_tree(n: usize, picks: &[usize]) -> Dendrogram {
        // Merge random pairs of the currently unmerged nodes.
        let mut active: Vec<NodeId> = (0..n).collect();
        let mut merges = Vec::new();
        for (i, &pick) in picks.iter().take(n - 1).enumerate() {
            let a = active.remove(pick % active.len());
            let b = active.remove((pick / 7) % active.len());
            merges.push((a, b, i as f64));
            active.push(n + i);
        }
        Dendrogram::from_merges(n, &merges).unwrap()
    }

    proptest! {
        #[test]
        fn reorder_preserves_topology_and_heights(
            n in 2usize..24,
            picks in proptest::collection::vec(0usize..10_000, 24),
            shuffle in proptest::collection::vec(0usize..10_000, 24),
        ) {
            let tree = arbitrary_tree(n, &picks);
            let mut ideal: Vec<usize> = (0..n).collect();
            for (i, &s) in shuffle.iter().take(n).enumerate() {
                ideal.swap(i, s % n);
            }
            let ideal = Permutation::new(ideal).unwrap();

            let out = tree.reorder(&ideal).unwrap();
            prop_assert_eq!(out.heights(), tree.heights());
            prop_assert_eq!(children_sets(&out), children_sets(&tree));
            prop_assert!(out.validate().is_clean());

            // Reordering again towards the same target changes nothing.
            let again = out.reorder(&ideal).unwrap();
            prop_assert_eq!(again, out);
        }
    }
}
