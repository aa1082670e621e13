use std::collections::HashMap;

use crate::formula::{Clause, Variable};

/// Returns true when a later literal disagrees in polarity with the first
/// occurrence of the same variable.
fn is_tautology(clause: &Clause) -> bool {
    let mut first_seen: HashMap<Variable, bool> = HashMap::new();
    clause.iter().any(|literal| {
        *first_seen
            .entry(literal.variable())
            .or_insert_with(|| literal.positive())
            != literal.positive()
    })
}

/// Removes every tautological clause.
/// Returns the surviving clauses in their original order and the number of discarded clauses.
pub fn remove_tautologies(clauses: Vec<Clause>) -> (Vec<Clause>, usize) {
    let total = clauses.len();
    let kept = clauses
        .into_iter()
        .filter(|clause| {
            let tautology = is_tautology(clause);
            if tautology {
                trace!("Dropping tautology {}", clause);
            }
            !tautology
        })
        .collect::<Vec<_>>();
    let removed = total - kept.len();

    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Cnf;

    fn clauses(raw: Vec<Vec<i64>>) -> Vec<Clause> {
        Cnf::from_dimacs_clauses(raw).unwrap().clauses().clone()
    }

    #[test]
    fn drops_whole_tautological_clause() {
        let (kept, removed) = remove_tautologies(clauses(vec![vec![1, -1, 2], vec![-2]]));
        assert_eq!(removed, 1);
        assert_eq!(kept, clauses(vec![vec![-2]]));
    }

    #[test]
    fn keeps_repeated_literals() {
        let input = clauses(vec![vec![1, 1, 2], vec![3, -4, 3]]);
        let (kept, removed) = remove_tautologies(input.clone());
        assert_eq!(removed, 0);
        assert_eq!(kept, input);
    }

    #[test]
    fn preprocessing_is_idempotent() {
        let input = clauses(vec![vec![1, 2], vec![-3, 4, 3], vec![5, -5], vec![-1, -2]]);
        let (once, removed_once) = remove_tautologies(input);
        let (twice, removed_twice) = remove_tautologies(once.clone());
        assert_eq!(removed_once, 2);
        assert_eq!(removed_twice, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn agrees_with_clause_query() {
        for clause in clauses(vec![vec![1, 2, -1], vec![4, 5], vec![-6, 6], vec![]]) {
            assert_eq!(is_tautology(&clause), clause.is_tautology());
        }
    }
}
