use crate::formula::{Cnf, Model};

mod config;
mod dpll;
pub mod preprocess;
mod stats;

pub use config::{Policy, PolicyParseError, SolverConfig};
pub use dpll::DpllSolver;
pub use stats::Stats;

pub trait Solver: Sized {
    /// Creates a new solver instance.
    fn new(formula: Cnf, config: SolverConfig) -> Self;

    /// Solves the formula and returns the operation counters of the run.
    fn solve_with_stats(self) -> (Option<Model>, Stats);

    /// Solves a CNF SAT problem with the solver.
    /// Returns `Some(Model)` if satisfiable, `None` otherwise.
    fn solve(self) -> Option<Model> {
        self.solve_with_stats().0
    }
}
