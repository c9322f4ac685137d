//! Contract of the branch-and-bound tree manager.

use crate::problem::BoundSide;
use exip_core::CertResult;
use num_rational::BigRational;

/// A bound change attached to a child node.
pub type ChildBound = (usize, BoundSide, BigRational);

/// Node-level services of the surrounding tree search.
pub trait TreeManager {
    /// Depth of the current node; the root has depth zero.
    fn depth(&self) -> usize;

    /// Identifier of the current node, if the tree tracks node identity.
    ///
    /// When this returns `Some`, the node-level entry points switch the
    /// local bounds to [`TreeManager::node_path`] whenever the identifier
    /// changes. Otherwise only the depth is aligned and the caller records
    /// the node's bound changes itself.
    fn node_id(&self) -> Option<u64> {
        None
    }

    /// Bound changes on the path from the root to the current node, one
    /// entry per level below the root.
    fn node_path(&self) -> Vec<Vec<ChildBound>> {
        Vec::new()
    }

    /// Whether the search is in a probing dive.
    fn in_probing(&self) -> bool {
        false
    }

    /// Lower bound of the current node.
    fn node_lower_bound(&self) -> f64;

    /// Raise the lower bound of the current node.
    fn set_node_lower_bound(&mut self, bound: f64);

    /// Prune the current node.
    fn cutoff_node(&mut self);

    /// Report a safe upper bound on the optimum from a certified incumbent.
    ///
    /// Nodes whose lower bound reaches it can be pruned.
    fn set_cutoff_bound(&mut self, bound: f64);

    /// Create a child of the current node with additional bound changes.
    fn create_child(&mut self, bounds: Vec<ChildBound>) -> CertResult<()>;
}

/// Tree manager that records every request, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct RecordingTree {
    /// Reported depth
    pub depth: usize,
    /// Reported node identifier
    pub node: Option<u64>,
    /// Branching bounds from the root, one entry per level
    pub path: Vec<Vec<ChildBound>>,
    /// Reported probing state
    pub probing: bool,
    /// Node lower bound
    pub lower_bound: f64,
    /// Whether the node was cut off
    pub cutoff: bool,
    /// Last cutoff bound reported
    pub cutoff_bound: Option<f64>,
    /// Children created, in order
    pub children: Vec<Vec<ChildBound>>,
}

impl RecordingTree {
    /// Create a root node with lower bound `-inf`.
    pub fn new() -> Self {
        Self {
            lower_bound: f64::NEG_INFINITY,
            ..Self::default()
        }
    }

    /// Create a root node that reports `node` as its identifier.
    pub fn root(node: u64) -> Self {
        Self {
            node: Some(node),
            ..Self::new()
        }
    }

    /// Enter a child of this node with the given branching bounds.
    ///
    /// The child inherits the lower bound and the cutoff bound but none of
    /// the recorded requests.
    pub fn child(&self, node: u64, bounds: Vec<ChildBound>) -> Self {
        let mut path = self.path.clone();
        path.push(bounds);
        Self {
            depth: self.depth + 1,
            node: Some(node),
            path,
            lower_bound: self.lower_bound,
            cutoff_bound: self.cutoff_bound,
            ..Self::default()
        }
    }
}

impl TreeManager for RecordingTree {
    fn depth(&self) -> usize {
        self.depth
    }

    fn node_id(&self) -> Option<u64> {
        self.node
    }

    fn node_path(&self) -> Vec<Vec<ChildBound>> {
        self.path.clone()
    }

    fn in_probing(&self) -> bool {
        self.probing
    }

    fn node_lower_bound(&self) -> f64 {
        self.lower_bound
    }

    fn set_node_lower_bound(&mut self, bound: f64) {
        self.lower_bound = bound;
    }

    fn cutoff_node(&mut self) {
        self.cutoff = true;
    }

    fn set_cutoff_bound(&mut self, bound: f64) {
        self.cutoff_bound = Some(bound);
    }

    fn create_child(&mut self, bounds: Vec<ChildBound>) -> CertResult<()> {
        self.children.push(bounds);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exip_core::rational::rat;

    #[test]
    fn test_child_extends_path() {
        let root = RecordingTree::root(0);
        let down = root.child(1, vec![(0, BoundSide::Upper, rat(1))]);
        let deeper = down.child(3, vec![(1, BoundSide::Lower, rat(2))]);
        assert_eq!(deeper.depth(), 2);
        assert_eq!(deeper.node_id(), Some(3));
        assert_eq!(deeper.node_path().len(), 2);
        assert_eq!(deeper.node_path()[0], vec![(0, BoundSide::Upper, rat(1))]);
        assert!(deeper.children.is_empty());
    }
}
