use crate::formula::Literal;

/// Why a literal is on the trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reason {
    /// Chosen by branching; the only entries that may be flipped on backtrack.
    Decision,
    /// Implied by a unit clause.
    Forced,
}

#[derive(Clone, Copy, Debug)]
pub struct TrailEntry {
    pub literal: Literal,
    pub reason: Reason,
    /// Tracker undo mark taken right before the literal was set.
    pub undo_mark: usize,
}

/// Literals set true, in assignment order.
#[derive(Debug, Default)]
pub struct Trail {
    entries: Vec<TrailEntry>,
}

impl Trail {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, literal: Literal, reason: Reason, undo_mark: usize) {
        self.entries.push(TrailEntry {
            literal,
            reason,
            undo_mark,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.entries.iter().map(|entry| entry.literal)
    }

    pub fn num_decisions(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.reason == Reason::Decision)
            .count()
    }

    /// Drops every entry from `len` on.
    /// Returns the undo mark the tracker has to be reverted to, or `None` if nothing was dropped.
    pub fn truncate(&mut self, len: usize) -> Option<usize> {
        let mark = self.entries.get(len).map(|entry| entry.undo_mark);
        self.entries.truncate(len);
        mark
    }
}
