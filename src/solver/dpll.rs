use crate::formula::{Cnf, Literal, Model};

use self::{
    branching::{heuristic_for, Heuristic},
    tracker::{ClauseIdx, Propagation, Tracker},
    trail::{Reason, Trail},
};

use super::{preprocess::remove_tautologies, Solver, SolverConfig, Stats};

mod branching;
mod tracker;
mod trail;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Propagating,
    Deciding,
    Backtracking,
    Satisfied,
    Unsatisfiable,
}

/// A decision that can still be undone.
#[derive(Clone, Copy, Debug)]
struct ChoicePoint {
    literal: Literal,
    /// Trail length before the decision was pushed.
    trail_len: usize,
    /// Whether the complement of `literal` is the branch being explored.
    flipped: bool,
}

pub struct DpllSolver {
    /// The formula as given, tautologies included.
    formula: Cnf,
    config: SolverConfig,
    tracker: Tracker,
    trail: Trail,
    choices: Vec<ChoicePoint>,
    heuristic: Box<dyn Heuristic>,
    stats: Stats,
}

impl DpllSolver {
    fn log_step(&self) {
        if self.config.verbose {
            info!(
                "∥clauses∥={},∥trues∥={},{}",
                self.tracker.num_remaining(),
                self.trail.len(),
                self.stats
            );
        }
    }

    fn report_conflict(&mut self, clause_idx: ClauseIdx) {
        let literals = self.tracker.literals(clause_idx);
        debug!(
            "Conflict on clause {:?} at decision level {}",
            literals.iter().map(Literal::to_dimacs).collect::<Vec<_>>(),
            self.choices.len()
        );
        self.heuristic.conflict(literals);
    }

    fn propagate(&mut self) -> State {
        self.stats.solve += 1;
        self.log_step();

        if self.tracker.is_satisfied() {
            return State::Satisfied;
        }

        // Only rounds that actually look for unit clauses count as `unit`
        self.stats.unit += 1;
        let before = self.trail.len();
        let result = self.tracker.propagate(&mut self.trail);
        self.stats.assign += (self.trail.len() - before) as u64;

        match result {
            Propagation::Contradiction(clause_idx) => {
                self.report_conflict(clause_idx);
                State::Backtracking
            }
            Propagation::Propagated if self.tracker.is_satisfied() => State::Satisfied,
            Propagation::Propagated => State::Deciding,
        }
    }

    fn decide(&mut self) -> State {
        let literal = match self.heuristic.pick(&self.tracker) {
            Some(literal) => literal,
            // Propagation left an open clause with at least two live literals
            None => unreachable!(),
        };

        self.choices.push(ChoicePoint {
            literal,
            trail_len: self.trail.len(),
            flipped: false,
        });
        self.assign_decision(literal)
    }

    fn assign_decision(&mut self, literal: Literal) -> State {
        debug!("Decide {} at level {}", literal, self.choices.len());
        self.stats.split += 1;
        self.stats.assign += 1;

        self.trail
            .push(literal, Reason::Decision, self.tracker.undo_mark());
        match self.tracker.set_literal(literal) {
            Some(clause_idx) => {
                self.report_conflict(clause_idx);
                State::Backtracking
            }
            None => State::Propagating,
        }
    }

    /// Reverts the trail and the working clause set to `trail_len` entries.
    fn rollback(&mut self, trail_len: usize) {
        if let Some(mark) = self.trail.truncate(trail_len) {
            self.tracker.undo_to(mark);
        }
    }

    /// Flips the most recent unflipped decision, dropping exhausted ones on the way.
    fn backtrack(&mut self) -> State {
        while let Some(choice) = self.choices.pop() {
            self.stats.backtrack += 1;
            self.rollback(choice.trail_len);

            if !choice.flipped {
                debug!("Backtrack: retry {} as {}", choice.literal, !choice.literal);
                self.choices.push(ChoicePoint {
                    flipped: true,
                    ..choice
                });
                return self.assign_decision(!choice.literal);
            }
        }

        State::Unsatisfiable
    }

    fn run(&mut self) -> bool {
        if !self.tracker.falsified_clauses().is_empty() {
            info!("Formula contains an empty clause");
            return false;
        }

        let mut state = State::Propagating;
        loop {
            state = match state {
                State::Propagating => self.propagate(),
                State::Deciding => self.decide(),
                State::Backtracking => self.backtrack(),
                State::Satisfied => return true,
                State::Unsatisfiable => return false,
            };
        }
    }
}

impl Solver for DpllSolver {
    fn new(formula: Cnf, config: SolverConfig) -> Self {
        let num_variables = formula.num_variables();

        let (clauses, removed) = remove_tautologies(formula.clauses().clone());
        info!(
            "Removed {} tautological clauses, {} remain",
            removed,
            clauses.len()
        );

        let tracker = Tracker::from_clauses(num_variables, &clauses);
        let heuristic = heuristic_for(config.policy, num_variables);
        let stats = Stats {
            tautologies: removed as u64,
            ..Default::default()
        };

        DpllSolver {
            formula,
            config,
            tracker,
            trail: Trail::new(),
            choices: Vec::new(),
            heuristic,
            stats,
        }
    }

    fn solve_with_stats(mut self) -> (Option<Model>, Stats) {
        let satisfiable = self.run();
        let stats = self.stats;

        if satisfiable {
            info!(
                "SAT with policy {}: {} literals on the trail, {} decisions, {}",
                self.config.policy,
                self.trail.len(),
                self.trail.num_decisions(),
                stats
            );
            let trail = self.trail.literals().collect();
            (Some(Model::new(self.formula, trail)), stats)
        } else {
            info!("UNSAT with policy {}: {}", self.config.policy, stats);
            (None, stats)
        }
    }
}
