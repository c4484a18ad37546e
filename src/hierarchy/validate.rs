//! Dendrogram validation.
//!
//! Checks the structural invariants every order-compatible tree must hold:
//! - every merge references two distinct, earlier nodes, each merged once
//! - an internal node's leaf range is the union of its children's ranges,
//!   which are adjacent (`left.hi == right.lo`)
//! - sizes add up and leaves agree with the leaf order
//! - merge heights are finite and never below a child's height
//!
//! Trees built by this crate always pass; the check exists for trees that
//! arrive from elsewhere (deserialized, hand-assembled) and for tests.
//!
//! # Example
//!
//! ```rust
//! use slanter::Dendrogram;
//!
//! let tree = Dendrogram::from_merges(3, &[(0, 1, 2.0), (3, 2, 1.0)]).unwrap();
//! let report = tree.validate();
//! assert!(report.is_tree());
//! assert!(!report.is_clean()); // height inversion at node 4
//! ```

use std::fmt;

use super::node::{ClusterNode, NodeId};
use super::Dendrogram;

/// How badly an invariant is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Still a binary tree, but not order-compatible or not monotone.
    Error,
    /// Not a binary tree over the leaves at all.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One broken invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Offending node, if the issue is local to one.
    pub node_id: Option<NodeId>,
    /// Which invariant failed.
    pub message: &'static str,
    /// The values that broke it.
    pub detail: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(id) = self.node_id {
            write!(f, " (node {id})")?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Issues found by [`Dendrogram::validate`], in node order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn push(
        &mut self,
        severity: Severity,
        node_id: Option<NodeId>,
        message: &'static str,
        detail: String,
    ) {
        self.issues.push(ValidationIssue {
            severity,
            node_id,
            message,
            detail,
        });
    }

    /// No invariant is broken.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// The nodes still form one binary tree over the leaves, whatever else
    /// is wrong.
    pub fn is_tree(&self) -> bool {
        self.issues.iter().all(|i| i.severity < Severity::Critical)
    }

    /// Issues attached to `id`.
    pub fn at_node(&self, id: NodeId) -> impl Iterator<Item = &ValidationIssue> + '_ {
        self.issues.iter().filter(move |i| i.node_id == Some(id))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "dendrogram is valid");
        }
        let critical = self
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Critical)
            .count();
        writeln!(f, "{} issues ({critical} critical)", self.issues.len())?;
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}

impl Dendrogram {
    /// Check every structural invariant and report what is broken.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        let nodes = self.nodes();
        let n = self.n_leaves();
        let order = self.leaf_order().as_slice();

        if n == 0 || nodes.len() != 2 * n - 1 {
            report.push(
                Severity::Critical,
                None,
                "node count does not match the leaf count",
                format!("{} nodes for {} leaves", nodes.len(), n),
            );
            return report;
        }

        let mut parent_count = vec![0usize; nodes.len()];
        for (id, node) in nodes.iter().enumerate() {
            if node.id != id {
                let ctx = format!("stored id {}", node.id);
                report.push(Severity::Error, Some(id), "node id does not match its slot", ctx);
            }
            match node.content {
                ClusterNode::Leaf(index) => {
                    if id >= n || index != id {
                        let ctx = format!("element {index}");
                        report.push(Severity::Error, Some(id), "leaf outside the leaf slots", ctx);
                    }
                    let range = &node.leaf_range;
                    if node.size != 1 || range.len() != 1 || order.get(range.start) != Some(&index)
                    {
                        let ctx = format!("range {range:?}, size {}", node.size);
                        report.push(
                            Severity::Error,
                            Some(id),
                            "leaf disagrees with the leaf order",
                            ctx,
                        );
                    }
                }
                ClusterNode::Internal {
                    left,
                    right,
                    height,
                } => {
                    if id < n {
                        report.push(Severity::Error, Some(id), "merge in a leaf slot", String::new());
                    }
                    if left >= id || right >= id || left == right {
                        report.push(
                            Severity::Critical,
                            Some(id),
                            "merge children must be distinct earlier nodes",
                            format!("children {left}, {right}"),
                        );
                        continue;
                    }
                    parent_count[left] += 1;
                    parent_count[right] += 1;

                    let (l, r) = (&nodes[left], &nodes[right]);
                    if l.leaf_range.end != r.leaf_range.start {
                        report.push(
                            Severity::Error,
                            Some(id),
                            "children ranges are not adjacent",
                            format!("{:?} then {:?}", l.leaf_range, r.leaf_range),
                        );
                    }
                    if node.leaf_range != (l.leaf_range.start..r.leaf_range.end) {
                        report.push(
                            Severity::Error,
                            Some(id),
                            "range is not the union of its children",
                            format!("{:?}", node.leaf_range),
                        );
                    }
                    if node.size != l.size + r.size || node.size != node.leaf_range.len() {
                        let ctx = format!("size {}", node.size);
                        report.push(Severity::Error, Some(id), "size mismatch", ctx);
                    }

                    let floor = l.height().max(r.height());
                    if !height.is_finite() {
                        let ctx = format!("{height}");
                        report.push(Severity::Error, Some(id), "non-finite height", ctx);
                    } else if height < floor {
                        report.push(
                            Severity::Error,
                            Some(id),
                            "height inversion",
                            format!("height {height} below child height {floor}"),
                        );
                    }
                }
            }
        }

        // Everything but the root hangs from exactly one merge.
        for (id, &count) in parent_count.iter().enumerate() {
            let expected = usize::from(id + 1 != nodes.len());
            if count != expected {
                report.push(
                    Severity::Critical,
                    Some(id),
                    "node does not have exactly one parent",
                    format!("{count} parents"),
                );
            }
        }

        let root_range = &nodes[self.root()].leaf_range;
        if *root_range != (0..n) {
            report.push(
                Severity::Error,
                Some(self.root()),
                "root does not cover every position",
                format!("{root_range:?}, expected 0..{n}"),
            );
        }

        report
    }
}
