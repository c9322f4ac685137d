//! Deferred bound changes.
//!
//! Bound changes arrive from the tree manager while a node is being set up
//! and are applied in one batch before anything reads local bounds. Each
//! variable owns at most one pending slot per side; repeated changes
//! overwrite the slot, so draining applies the last value written.

use super::BoundSide;
use num_rational::BigRational;

/// A pending bound change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    /// Variable index
    pub var: usize,
    /// Side of the bound
    pub side: BoundSide,
    /// New bound value
    pub value: BigRational,
}

/// Log of pending bound changes with one slot per variable and side.
#[derive(Debug, Clone, Default)]
pub struct BoundLog {
    /// Slot of the pending lower bound change of each variable
    lower_slot: Vec<Option<usize>>,
    /// Slot of the pending upper bound change of each variable
    upper_slot: Vec<Option<usize>>,
    /// Pending changes in order of first touch
    changes: Vec<PendingChange>,
    /// Total changes recorded, including overwrites
    recorded: u64,
}

impl BoundLog {
    /// Create an empty log for `nvars` variables.
    pub fn new(nvars: usize) -> Self {
        Self {
            lower_slot: vec![None; nvars],
            upper_slot: vec![None; nvars],
            changes: Vec::new(),
            recorded: 0,
        }
    }

    fn slot_mut(&mut self, var: usize, side: BoundSide) -> &mut Option<usize> {
        match side {
            BoundSide::Lower => &mut self.lower_slot[var],
            BoundSide::Upper => &mut self.upper_slot[var],
        }
    }

    /// Record a change, overwriting an earlier pending change of the same side.
    pub fn record(&mut self, var: usize, side: BoundSide, value: BigRational) {
        self.recorded += 1;
        let len = self.changes.len();
        let slot = self.slot_mut(var, side);
        match *slot {
            Some(idx) => self.changes[idx].value = value,
            None => {
                *slot = Some(len);
                self.changes.push(PendingChange { var, side, value });
            }
        }
    }

    /// Pending value for a variable and side.
    pub fn pending(&self, var: usize, side: BoundSide) -> Option<&BigRational> {
        let slot = match side {
            BoundSide::Lower => self.lower_slot.get(var)?,
            BoundSide::Upper => self.upper_slot.get(var)?,
        };
        slot.map(|idx| &self.changes[idx].value)
    }

    /// Number of pending changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether no change is pending.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Total number of recorded changes.
    pub fn num_recorded(&self) -> u64 {
        self.recorded
    }

    /// Pending changes in order of first touch.
    pub fn changes(&self) -> &[PendingChange] {
        &self.changes
    }

    /// Remove and return all pending changes, clearing every slot.
    pub fn take(&mut self) -> Vec<PendingChange> {
        let changes = std::mem::take(&mut self.changes);
        for change in &changes {
            *self.slot_mut(change.var, change.side) = None;
        }
        changes
    }
}
