use std::fmt::Display;

/// Operation counters collected during one solve.
/// Purely observational: nothing in the search reads them back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Literals set true, forced or decided.
    pub assign: u64,
    /// Propagation rounds.
    pub unit: u64,
    /// Branching decisions, including retries with the complement.
    pub split: u64,
    /// Controller steps entering propagation.
    pub solve: u64,
    /// Trail rollbacks.
    pub backtrack: u64,
    /// Clauses dropped by preprocessing.
    pub tautologies: u64,
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#Split={},#Assign={},#Unit={},#Solve={},#Backtrack={}",
            self.split, self.assign, self.unit, self.solve, self.backtrack
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let stats = Stats {
            assign: 4,
            unit: 3,
            split: 1,
            solve: 2,
            backtrack: 0,
            tautologies: 9,
        };
        assert_eq!(
            stats.to_string(),
            "#Split=1,#Assign=4,#Unit=3,#Solve=2,#Backtrack=0"
        );
    }
}
