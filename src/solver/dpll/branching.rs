use crate::{
    formula::{Literal, Variable},
    solver::Policy,
};

use super::tracker::Tracker;

/// Chooses the literal to try first when propagation stalls.
pub trait Heuristic {
    /// Picks an unassigned literal from the remaining clauses.
    /// Returns `None` only when no clause remains open.
    fn pick(&self, tracker: &Tracker) -> Option<Literal>;

    /// Called with the input literals of every clause emptied during search.
    fn conflict(&mut self, _literals: &[Literal]) {}
}

/// Creates the heuristic for `policy`. Its state belongs to one solve.
pub fn heuristic_for(policy: Policy, num_variables: usize) -> Box<dyn Heuristic> {
    match policy {
        Policy::Next => Box::new(NextLiteral),
        Policy::Dlis => Box::new(Dlis::new(num_variables)),
        Policy::Vsids => Box::new(ConflictScore::new(num_variables)),
        Policy::JeroslowWang => Box::new(JeroslowWang::new(num_variables)),
    }
}

/// First literal of the first remaining clause.
pub struct NextLiteral;

impl Heuristic for NextLiteral {
    fn pick(&self, tracker: &Tracker) -> Option<Literal> {
        tracker
            .remaining()
            .find_map(|(_, literals)| literals.first().copied())
    }
}

/// Returns the key with the largest weight; the earliest key wins ties.
fn first_max<K: Copy, W: PartialOrd>(candidates: impl IntoIterator<Item = (K, W)>) -> Option<K> {
    let mut best: Option<(K, W)> = None;
    for (key, weight) in candidates {
        let better = match &best {
            Some((_, best_weight)) => weight > *best_weight,
            None => true,
        };
        if better {
            best = Some((key, weight));
        }
    }
    best.map(|(key, _)| key)
}

/// Accumulates a weight per variable and remembers first-seen order.
struct VariableTally {
    weights: Vec<f64>,
    order: Vec<Variable>,
}

impl VariableTally {
    fn new(num_variables: usize) -> Self {
        VariableTally {
            weights: vec![0.0; num_variables],
            order: Vec::new(),
        }
    }

    fn add(&mut self, variable: Variable, weight: f64) {
        let slot = &mut self.weights[variable.as_index()];
        if *slot == 0.0 {
            self.order.push(variable);
        }
        *slot += weight;
    }

    fn best(&self) -> Option<Variable> {
        first_max(
            self.order
                .iter()
                .map(|&variable| (variable, self.weights[variable.as_index()])),
        )
    }
}

/// Variable occurring in the most remaining clauses, either polarity.
pub struct Dlis {
    num_variables: usize,
}

impl Dlis {
    pub fn new(num_variables: usize) -> Self {
        Dlis { num_variables }
    }
}

impl Heuristic for Dlis {
    fn pick(&self, tracker: &Tracker) -> Option<Literal> {
        let mut tally = VariableTally::new(self.num_variables);
        for (_, literals) in tracker.remaining() {
            for literal in literals {
                tally.add(literal.variable(), 1.0);
            }
        }

        tally.best().map(|variable| Literal::new(variable, true))
    }
}

/// Literal scores bumped by every conflict the literal took part in.
pub struct ConflictScore {
    /// Indexed by `Literal::code`.
    scores: Vec<u64>,
}

impl ConflictScore {
    pub fn new(num_variables: usize) -> Self {
        ConflictScore {
            scores: vec![0; num_variables * 2],
        }
    }

    pub fn score(&self, literal: Literal) -> u64 {
        self.scores.get(literal.code()).copied().unwrap_or(0)
    }
}

impl Heuristic for ConflictScore {
    fn pick(&self, tracker: &Tracker) -> Option<Literal> {
        first_max(
            tracker
                .remaining()
                .flat_map(|(_, literals)| literals.iter())
                .map(|&literal| (literal, self.score(literal))),
        )
    }

    fn conflict(&mut self, literals: &[Literal]) {
        for literal in literals {
            if let Some(score) = self.scores.get_mut(literal.code()) {
                *score += 1;
            }
        }
    }
}

/// Positive literal maximizing `Σ 2^-|clause|` over the remaining clauses containing it.
/// Falls back to the first live literal when no positive literal is left.
pub struct JeroslowWang {
    num_variables: usize,
}

impl JeroslowWang {
    pub fn new(num_variables: usize) -> Self {
        JeroslowWang { num_variables }
    }
}

impl Heuristic for JeroslowWang {
    fn pick(&self, tracker: &Tracker) -> Option<Literal> {
        let mut tally = VariableTally::new(self.num_variables);
        for (_, literals) in tracker.remaining() {
            let weight = 2f64.powi(-(literals.len() as i32));
            for literal in literals.iter().filter(|literal| literal.positive()) {
                tally.add(literal.variable(), weight);
            }
        }

        match tally.best() {
            Some(variable) => Some(Literal::new(variable, true)),
            None => NextLiteral.pick(tracker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Cnf;

    fn tracker(raw: Vec<Vec<i64>>) -> Tracker {
        let cnf = Cnf::from_dimacs_clauses(raw).unwrap();
        Tracker::from_clauses(cnf.num_variables(), cnf.clauses())
    }

    fn lit(token: i64) -> Literal {
        Literal::from_dimacs(token).unwrap()
    }

    #[test]
    fn next_takes_first_literal_of_first_open_clause() {
        let mut tracker = tracker(vec![vec![1, 2], vec![-3, 4], vec![3, 5]]);
        assert_eq!(NextLiteral.pick(&tracker), Some(lit(1)));

        tracker.set_literal(lit(2));
        assert_eq!(NextLiteral.pick(&tracker), Some(lit(-3)));
    }

    #[test]
    fn dlis_counts_both_polarities() {
        let tracker = tracker(vec![vec![1, 2], vec![-2, 3], vec![2, -3], vec![3, 1]]);
        // x2 and x3 occur three times; x2 is seen first
        assert_eq!(Dlis::new(3).pick(&tracker), Some(lit(2)));
    }

    #[test]
    fn dlis_ignores_satisfied_clauses() {
        let mut tracker = tracker(vec![vec![1, 2], vec![1, 3], vec![-2, 3], vec![3, 4]]);
        tracker.set_literal(lit(3));
        assert_eq!(Dlis::new(4).pick(&tracker), Some(lit(1)));
    }

    #[test]
    fn conflict_score_prefers_bumped_literal() {
        let tracker = tracker(vec![vec![1, 2], vec![-3, 2]]);
        let mut heuristic = ConflictScore::new(3);
        assert_eq!(heuristic.pick(&tracker), Some(lit(1)));

        heuristic.conflict(&[lit(-3), lit(4)]);
        assert_eq!(heuristic.score(lit(-3)), 1);
        assert_eq!(heuristic.score(lit(3)), 0);
        assert_eq!(heuristic.pick(&tracker), Some(lit(-3)));

        heuristic.conflict(&[lit(2)]);
        heuristic.conflict(&[lit(2)]);
        assert_eq!(heuristic.pick(&tracker), Some(lit(2)));
    }

    #[test]
    fn jeroslow_wang_favors_short_clauses() {
        let tracker = tracker(vec![vec![1, 2, 3], vec![1, 4, 5], vec![2, -6], vec![-1, 6]]);
        // x1: 1/8 + 1/8, x2: 1/8 + 1/4
        assert_eq!(JeroslowWang::new(6).pick(&tracker), Some(lit(2)));
    }

    #[test]
    fn jeroslow_wang_falls_back_without_positive_literals() {
        let tracker = tracker(vec![vec![-1, -2], vec![-2, -3]]);
        assert_eq!(JeroslowWang::new(3).pick(&tracker), Some(lit(-1)));
    }

    #[test]
    fn no_open_clause_means_no_pick() {
        let mut tracker = tracker(vec![vec![1, 2]]);
        tracker.set_literal(lit(1));
        for policy in Policy::ALL.iter().copied() {
            assert_eq!(heuristic_for(policy, 2).pick(&tracker), None);
        }
    }
}
