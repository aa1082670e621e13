use std::{
    collections::BTreeSet,
    ops::{Index, IndexMut},
};

use typed_index_collections::TiVec;

use crate::formula::{Clause, Literal, Variable};

use super::trail::{Reason, Trail};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClauseIdx(usize);

impl From<usize> for ClauseIdx {
    fn from(index: usize) -> Self {
        ClauseIdx(index)
    }
}

impl From<ClauseIdx> for usize {
    fn from(index: ClauseIdx) -> Self {
        index.0
    }
}

use clause_stat::*;
mod clause_stat {
    use crate::formula::Literal;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum ClauseStatus {
        Falsified,
        Satisfied,
        Unit,
        Unresolved,
    }

    impl ClauseStatus {
        pub fn from_state(satisfied: bool, live: usize) -> Self {
            if satisfied {
                ClauseStatus::Satisfied
            } else {
                match live {
                    0 => ClauseStatus::Falsified,
                    1 => ClauseStatus::Unit,
                    _ => ClauseStatus::Unresolved,
                }
            }
        }
    }

    #[derive(Clone, Copy)]
    pub struct ClauseStatusChange {
        pub old: ClauseStatus,
        pub new: ClauseStatus,
    }

    /// A clause as seen by the search: its input literals and the part of them
    /// not yet falsified by the trail.
    #[derive(Clone, Debug)]
    pub struct TrackedClause {
        /// Input literals, duplicates removed.
        literals: Vec<Literal>,
        /// Literals that are not falsified, in input order.
        live: Vec<Literal>,
        satisfied: bool,
    }

    impl TrackedClause {
        pub fn new(literals: Vec<Literal>) -> Self {
            TrackedClause {
                live: literals.clone(),
                literals,
                satisfied: false,
            }
        }

        pub fn literals(&self) -> &[Literal] {
            &self.literals
        }

        pub fn live(&self) -> &[Literal] {
            &self.live
        }

        pub fn is_satisfied(&self) -> bool {
            self.satisfied
        }

        pub fn status(&self) -> ClauseStatus {
            ClauseStatus::from_state(self.satisfied, self.live.len())
        }

        fn update(&mut self, f: impl FnOnce(&mut Self)) -> ClauseStatusChange {
            let old = self.status();
            f(self);
            ClauseStatusChange {
                old,
                new: self.status(),
            }
        }

        /// Marks the clause satisfied and returns the status change.
        pub fn satisfy(&mut self) -> ClauseStatusChange {
            self.update(|clause| clause.satisfied = true)
        }

        pub fn unsatisfy(&mut self) -> ClauseStatusChange {
            self.update(|clause| clause.satisfied = false)
        }

        /// Removes the live literal at `position` and returns the status change.
        pub fn strip(&mut self, position: usize) -> ClauseStatusChange {
            self.update(|clause| {
                clause.live.remove(position);
            })
        }

        pub fn restore(&mut self, position: usize, literal: Literal) -> ClauseStatusChange {
            self.update(|clause| clause.live.insert(position, literal))
        }
    }
}

pub type ClauseSet = BTreeSet<ClauseIdx>;

#[derive(Default)]
struct ClauseStateCache {
    falsified: ClauseSet,
    satisfied: ClauseSet,
    unit: ClauseSet,
    unresolved: ClauseSet,
}

impl Index<ClauseStatus> for ClauseStateCache {
    type Output = ClauseSet;

    fn index(&self, index: ClauseStatus) -> &Self::Output {
        match index {
            ClauseStatus::Falsified => &self.falsified,
            ClauseStatus::Satisfied => &self.satisfied,
            ClauseStatus::Unit => &self.unit,
            ClauseStatus::Unresolved => &self.unresolved,
        }
    }
}

impl IndexMut<ClauseStatus> for ClauseStateCache {
    fn index_mut(&mut self, index: ClauseStatus) -> &mut Self::Output {
        match index {
            ClauseStatus::Falsified => &mut self.falsified,
            ClauseStatus::Satisfied => &mut self.satisfied,
            ClauseStatus::Unit => &mut self.unit,
            ClauseStatus::Unresolved => &mut self.unresolved,
        }
    }
}

impl ClauseStateCache {
    fn new() -> Self {
        Default::default()
    }

    fn handle_change(&mut self, change: ClauseStatusChange, idx: ClauseIdx) {
        if change.old != change.new {
            assert!(self[change.old].remove(&idx));
            assert!(self[change.new].insert(idx));
        }
    }
}

/// Maps each literal to the clauses it occurs in.
struct Watch {
    positive: Vec<Vec<ClauseIdx>>,
    negative: Vec<Vec<ClauseIdx>>,
}

impl Watch {
    pub fn new(num_variables: usize) -> Self {
        Watch {
            positive: vec![Vec::new(); num_variables],
            negative: vec![Vec::new(); num_variables],
        }
    }
}

impl Index<Literal> for Watch {
    type Output = Vec<ClauseIdx>;

    fn index(&self, literal: Literal) -> &Self::Output {
        if literal.positive() {
            &self.positive[literal.variable().as_index()]
        } else {
            &self.negative[literal.variable().as_index()]
        }
    }
}

impl IndexMut<Literal> for Watch {
    fn index_mut(&mut self, literal: Literal) -> &mut Self::Output {
        if literal.positive() {
            &mut self.positive[literal.variable().as_index()]
        } else {
            &mut self.negative[literal.variable().as_index()]
        }
    }
}

/// One reversible step of an assignment.
#[derive(Clone, Copy, Debug)]
enum Undo {
    Assigned(Variable),
    Satisfied(ClauseIdx),
    Stripped {
        clause: ClauseIdx,
        position: usize,
        literal: Literal,
    },
}

/// Outcome of a propagation round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Propagation {
    /// No unit clause is left and no clause is falsified.
    Propagated,
    /// The clause lost its last live literal.
    Contradiction(ClauseIdx),
}

/// The working clause set: every tracked clause simplified under the current
/// assignment, plus an undo log to restore earlier states exactly.
pub struct Tracker {
    /// The current assignments to variables.
    assignments: Vec<Option<bool>>,
    watch: Watch,
    clauses: TiVec<ClauseIdx, TrackedClause>,
    /// Faster lookup table for clauses.
    clause_cache: ClauseStateCache,
    undo_log: Vec<Undo>,
}

impl Tracker {
    pub fn new(num_variables: usize) -> Self {
        Tracker {
            assignments: vec![None; num_variables],
            watch: Watch::new(num_variables),
            clauses: TiVec::new(),
            clause_cache: ClauseStateCache::new(),
            undo_log: Vec::new(),
        }
    }

    pub fn from_clauses(num_variables: usize, clauses: &[Clause]) -> Self {
        let mut tracker = Tracker::new(num_variables);
        for clause in clauses {
            tracker.add_clause(clause);
        }
        tracker
    }

    /// Adds a clause to the working set.
    /// Must be called before any literal is set.
    pub fn add_clause(&mut self, clause: &Clause) -> ClauseIdx {
        assert!(self.undo_log.is_empty());

        let mut literals: Vec<Literal> = Vec::with_capacity(clause.len());
        for literal in clause.iter() {
            if !literals.contains(&literal) {
                literals.push(literal);
            }
        }

        let clause_index = self.clauses.next_key();
        for &literal in &literals {
            self.watch[literal].push(clause_index);
        }

        let tracked = TrackedClause::new(literals);
        self.clause_cache[tracked.status()].insert(clause_index);
        self.clauses.push(tracked);

        clause_index
    }

    /// Number of clauses not yet satisfied.
    pub fn num_remaining(&self) -> usize {
        self.clauses.len() - self.clause_cache.satisfied.len()
    }

    /// True when every tracked clause is satisfied.
    pub fn is_satisfied(&self) -> bool {
        self.num_remaining() == 0
    }

    /// Get a reference to the falsified clause set.
    pub fn falsified_clauses(&self) -> &ClauseSet {
        &self.clause_cache.falsified
    }

    /// Return the input literals of the specified clause.
    pub fn literals(&self, index: ClauseIdx) -> &[Literal] {
        self.clauses[index].literals()
    }

    /// Unsatisfied clauses in input order, with their live literals.
    pub fn remaining(&self) -> impl Iterator<Item = (ClauseIdx, &[Literal])> + '_ {
        self.clauses
            .iter_enumerated()
            .filter(|(_, clause)| !clause.is_satisfied())
            .map(|(idx, clause)| (idx, clause.live()))
    }

    /// Position in the undo log; pass it to `undo_to` to revert everything set after it.
    pub fn undo_mark(&self) -> usize {
        self.undo_log.len()
    }

    /// Set the given literal, satisfying the clauses containing it and stripping
    /// its negation from the others.
    /// Returns the first clause emptied by this assignment, if any.
    /// Panic if the literal is already set.
    pub fn set_literal(&mut self, literal: Literal) -> Option<ClauseIdx> {
        let old_value = self.assignments[literal.variable().as_index()].replace(literal.positive());
        assert!(old_value.is_none());
        self.undo_log.push(Undo::Assigned(literal.variable()));
        trace!("Set {}", literal);

        for &clause_idx in &self.watch[literal] {
            let clause = &mut self.clauses[clause_idx];
            if clause.is_satisfied() {
                continue;
            }

            let change = clause.satisfy();
            self.clause_cache.handle_change(change, clause_idx);
            self.undo_log.push(Undo::Satisfied(clause_idx));
        }

        let mut conflict = None;
        for &clause_idx in &self.watch[!literal] {
            let clause = &mut self.clauses[clause_idx];
            if clause.is_satisfied() {
                continue;
            }

            // An open clause keeps every unassigned literal live
            let position = clause
                .live()
                .iter()
                .position(|&live| live == !literal)
                .unwrap();
            let change = clause.strip(position);
            self.clause_cache.handle_change(change, clause_idx);
            self.undo_log.push(Undo::Stripped {
                clause: clause_idx,
                position,
                literal: !literal,
            });

            if change.new == ClauseStatus::Falsified && conflict.is_none() {
                conflict = Some(clause_idx);
            }
        }

        conflict
    }

    /// Reverts every assignment made after `mark` was taken.
    pub fn undo_to(&mut self, mark: usize) {
        while self.undo_log.len() > mark {
            let (clause_idx, change) = match self.undo_log.pop() {
                Some(Undo::Assigned(variable)) => {
                    trace!("Unset {}", variable);
                    self.assignments[variable.as_index()] = None;
                    continue;
                }
                Some(Undo::Satisfied(clause_idx)) => {
                    (clause_idx, self.clauses[clause_idx].unsatisfy())
                }
                Some(Undo::Stripped {
                    clause,
                    position,
                    literal,
                }) => (clause, self.clauses[clause].restore(position, literal)),
                None => unreachable!(),
            };
            self.clause_cache.handle_change(change, clause_idx);
        }
    }

    /// Forces unit clauses until none is left or a clause is emptied.
    /// Every forced literal is appended to `trail`.
    pub fn propagate(&mut self, trail: &mut Trail) -> Propagation {
        if let Some(&clause_idx) = self.clause_cache.falsified.iter().next() {
            return Propagation::Contradiction(clause_idx);
        }

        while let Some(&clause_idx) = self.clause_cache.unit.iter().next() {
            let literal = self.clauses[clause_idx].live()[0];
            trail.push(literal, Reason::Forced, self.undo_mark());

            if let Some(conflict) = self.set_literal(literal) {
                return Propagation::Contradiction(conflict);
            }
        }

        Propagation::Propagated
    }
}
