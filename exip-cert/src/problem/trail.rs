//! Trail of applied local bound changes for backtracking.
//!
//! Every applied change below the root is recorded with the value it
//! replaced. A level marks the trail position at which a node's changes
//! begin; backtracking to a depth undoes the changes of all deeper levels in
//! reverse order.

use super::BoundSide;
use num_rational::BigRational;

/// A recorded local bound change.
#[derive(Debug, Clone)]
pub struct TrailEntry {
    /// Variable index
    pub var: usize,
    /// Side of the bound
    pub side: BoundSide,
    /// Bound value before the change
    pub old: BigRational,
}

/// Backtracking statistics.
#[derive(Debug, Clone, Default)]
pub struct TrailStats {
    /// Levels pushed
    pub levels: u64,
    /// Backtrack operations
    pub backtracks: u64,
    /// Changes undone
    pub undone: u64,
    /// Deepest level reached
    pub max_depth: usize,
}

/// Bound trail with level markers.
#[derive(Debug, Clone, Default)]
pub struct BoundTrail {
    /// Recorded changes
    entries: Vec<TrailEntry>,
    /// Trail position at the start of each level
    levels: Vec<usize>,
    stats: TrailStats,
}

impl BoundTrail {
    /// Create an empty trail at the root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current depth; zero is the root.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Open a new level.
    pub fn push_level(&mut self) {
        self.levels.push(self.entries.len());
        self.stats.levels += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.levels.len());
    }

    /// Record a change; root changes are permanent and not recorded.
    pub fn record(&mut self, var: usize, side: BoundSide, old: BigRational) {
        if !self.levels.is_empty() {
            self.entries.push(TrailEntry { var, side, old });
        }
    }

    /// Pop all levels deeper than `depth`, returning the undone entries in
    /// undo order (most recent first).
    ///
    /// Returns `None` if `depth` exceeds the current depth.
    pub fn unwind(&mut self, depth: usize) -> Option<Vec<TrailEntry>> {
        if depth > self.levels.len() {
            return None;
        }
        let mut undone = Vec::new();
        if self.levels.len() > depth {
            let start = self.levels[depth];
            self.levels.truncate(depth);
            undone.extend(self.entries.drain(start..).rev());
            self.stats.backtracks += 1;
        }
        self.stats.undone += undone.len() as u64;
        Some(undone)
    }

    /// Number of recorded changes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no change is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get statistics.
    pub fn stats(&self) -> &TrailStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exip_core::rational::rat;

    #[test]
    fn test_root_changes_are_not_recorded() {
        let mut trail = BoundTrail::new();
        trail.record(0, BoundSide::Lower, rat(0));
        assert!(trail.is_empty());
        assert_eq!(trail.depth(), 0);
    }

    #[test]
    fn test_unwind_returns_reverse_order() {
        let mut trail = BoundTrail::new();
        trail.push_level();
        trail.record(0, BoundSide::Upper, rat(10));
        trail.push_level();
        trail.record(0, BoundSide::Upper, rat(6));
        trail.record(1, BoundSide::Lower, rat(-1));
        assert_eq!(trail.depth(), 2);

        let undone = trail.unwind(1).unwrap();
        assert_eq!(undone.len(), 2);
        assert_eq!(undone[0].var, 1);
        assert_eq!(undone[1].old, rat(6));
        assert_eq!(trail.depth(), 1);
        assert_eq!(trail.len(), 1);

        assert!(trail.unwind(3).is_none());
        assert_eq!(trail.unwind(0).unwrap().len(), 1);
        assert_eq!(trail.stats().undone, 3);
    }
}
