/*!
A module to represent conjunctive normal form formula.
*/

use std::{convert::TryInto, fmt::Display, num::NonZeroU32, str::FromStr};

use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum VariableParseError {
    #[snafu(display("Failed to parse Variable ID"))]
    ParseIntError { source: std::num::ParseIntError },
    #[snafu(display(
        "Variable ID {} is out of range (must be within 1 to {})",
        num,
        Variable::MAX_VARIABLE_ID
    ))]
    RangeError { num: u64 },
    #[snafu(display("0 is a clause terminator and cannot be a literal"))]
    ZeroLiteral,
}

/// Newtype wrapper for variable ID.
/// Invariant: 0 < ID <= MAX_VARIABLE_ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(NonZeroU32);

impl Variable {
    pub const MAX_VARIABLE_ID: usize = std::u32::MAX as usize;
}

impl Variable {
    pub fn as_index(&self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// Creates a variable from a raw index.
    /// Returns `None` if the index is invalid.
    pub fn from_index(index: usize) -> Option<Self> {
        let id = index.checked_add(1)?;
        if id > Variable::MAX_VARIABLE_ID {
            return None;
        }
        Some(Variable(NonZeroU32::new(id.try_into().ok()?)?))
    }

    /// Creates a variable from its DIMACS ID.
    pub fn from_id(id: u64) -> Result<Self, VariableParseError> {
        ensure!(id != 0, ZeroLiteral);
        let index: Option<usize> = (id - 1).try_into().ok();
        index
            .and_then(Variable::from_index)
            .context(RangeError { num: id })
    }

    pub fn id(&self) -> u32 {
        self.0.get()
    }
}

impl FromStr for Variable {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let num = s.parse::<u64>().context(ParseIntError)?;
        Variable::from_id(num)
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    id: Variable,
    positive: bool,
}

impl Literal {
    pub fn new(id: Variable, positive: bool) -> Self {
        Literal { id, positive }
    }

    /// Creates a literal from a signed DIMACS token (`3` or `-3`).
    /// The `0` terminator is rejected.
    pub fn from_dimacs(token: i64) -> Result<Self, VariableParseError> {
        let id = Variable::from_id(token.unsigned_abs())?;
        Ok(Literal::new(id, token > 0))
    }

    pub fn to_dimacs(&self) -> i64 {
        let id = i64::from(self.id.id());
        if self.positive {
            id
        } else {
            -id
        }
    }

    pub fn variable(&self) -> Variable {
        self.id
    }

    pub fn positive(&self) -> bool {
        self.positive
    }

    /// Dense index over both polarities: `2 * variable + (negative as usize)`.
    pub fn code(&self) -> usize {
        self.id.as_index() * 2 + (!self.positive) as usize
    }

    pub fn is_complement_of(&self, other: Literal) -> bool {
        self.id == other.id && self.positive != other.positive
    }

    /// Truth value of the literal under a complete assignment.
    pub fn value(&self, assignment: &[bool]) -> bool {
        assignment[self.id.as_index()] == self.positive
    }

    /// Truth value of the literal under a partial assignment.
    pub fn partial_value(&self, assignment: &[Option<bool>]) -> Option<bool> {
        assignment[self.id.as_index()].map(|val| val == self.positive)
    }
}

impl FromStr for Literal {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (positive, id) = if let Some(stripped) = s.strip_prefix('-') {
            (false, stripped.parse()?)
        } else {
            (true, s.parse()?)
        };

        Ok(Literal { id, positive })
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.positive { "" } else { "¬" }, self.id)
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal {
            id: self.id,
            positive: !self.positive,
        }
    }
}

/// Disjunction of literals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Literal> + '_ {
        self.literals.iter().copied()
    }

    /// A clause is a tautology when some variable occurs in both polarities.
    pub fn is_tautology(&self) -> bool {
        self.literals
            .iter()
            .enumerate()
            .any(|(pos, lit)| self.literals[pos + 1..].iter().any(|l| l.is_complement_of(*lit)))
    }

    pub fn is_satisfied_by(&self, assignment: &[bool]) -> bool {
        self.iter().any(|literal| literal.value(assignment))
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;

        let mut iter = self.literals.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for literal in iter {
            write!(f, " ∨ {}", literal)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Formula representation in Conjunctive Normal Form
#[derive(Debug, Clone)]
pub struct Cnf {
    num_variables: usize,
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new(num_variables: usize) -> Self {
        assert!(num_variables <= Variable::MAX_VARIABLE_ID);

        Cnf {
            num_variables,
            clauses: Vec::new(),
        }
    }

    /// Builds a formula from already tokenised clauses of signed integers.
    pub fn from_dimacs_clauses<I, C>(clauses: I) -> Result<Self, VariableParseError>
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = i64>,
    {
        let mut cnf = Cnf::new(0);
        for tokens in clauses {
            let literals = tokens
                .into_iter()
                .map(Literal::from_dimacs)
                .collect::<Result<Vec<_>, _>>()?;
            cnf.add_clause(Clause::new(literals));
        }
        Ok(cnf)
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn clauses(&self) -> &Vec<Clause> {
        &self.clauses
    }

    /// Adds a clause, growing the variable count to cover its literals.
    pub fn add_clause(&mut self, clause: Clause) {
        if let Some(max) = clause.iter().map(|l| l.variable().as_index() + 1).max() {
            self.num_variables = self.num_variables.max(max);
        }
        self.clauses.push(clause);
    }

    pub fn is_satisfied_by(&self, assignment: &[bool]) -> bool {
        assignment.len() == self.num_variables
            && self
                .clauses
                .iter()
                .all(|clause| clause.is_satisfied_by(assignment))
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CNF with {} variables (", self.num_variables)?;

        let mut iter = self.clauses.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for clause in iter {
            write!(f, " ∧ {}", clause)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Represents a satisfying assignment for a formula.
#[derive(Debug)]
pub struct Model {
    formula: Cnf,
    trail: Vec<Literal>,
    assignment: Vec<bool>,
}

impl Model {
    /// Creates a new model from a formula and the literals set true while solving.
    /// Variables the trail leaves open are reported as positive.
    ///
    /// # Panics
    ///
    /// Panics when `trail` mentions a variable outside the formula, or (in debug
    /// builds) when the completed assignment does not satisfy the formula.
    pub fn new(formula: Cnf, trail: Vec<Literal>) -> Self {
        let mut partial = vec![None; formula.num_variables()];
        for literal in &trail {
            partial[literal.variable().as_index()] = Some(literal.positive());
        }
        let assignment = partial
            .into_iter()
            .map(|value| value.unwrap_or(true))
            .collect::<Vec<_>>();

        debug_assert!(formula.is_satisfied_by(&assignment));

        Model {
            formula,
            trail,
            assignment,
        }
    }

    pub fn formula(&self) -> &Cnf {
        &self.formula
    }

    /// Literals in the order they were decided or forced.
    pub fn trail(&self) -> &[Literal] {
        &self.trail
    }

    pub fn assignment(&self) -> &[bool] {
        &self.assignment
    }

    /// One explicit literal per variable of the formula.
    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.assignment.iter().enumerate().filter_map(|(idx, &val)| {
            Variable::from_index(idx).map(|variable| Literal::new(variable, val))
        })
    }

    /// Value of `variable`, or `None` if the formula does not have it.
    pub fn value(&self, variable: Variable) -> Option<bool> {
        self.assignment.get(variable.as_index()).copied()
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model for {}\nAssignment:", self.formula)?;
        for literal in self.literals() {
            write!(f, "\n  {}: {}", literal.variable(), literal.positive())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(token: i64) -> Literal {
        Literal::from_dimacs(token).unwrap()
    }

    #[test]
    fn literal_from_token() {
        let literal = lit(-7);
        assert_eq!(literal.variable().id(), 7);
        assert_eq!(literal.variable().as_index(), 6);
        assert!(!literal.positive());
        assert_eq!(literal.to_dimacs(), -7);
        assert_eq!("-7".parse::<Literal>().unwrap(), literal);
        assert_eq!("7".parse::<Literal>().unwrap(), !literal);
    }

    #[test]
    fn zero_token_is_rejected() {
        assert!(matches!(
            Literal::from_dimacs(0),
            Err(VariableParseError::ZeroLiteral)
        ));
        assert!("0".parse::<Literal>().is_err());
        assert!("-x".parse::<Literal>().is_err());
    }

    #[test]
    fn negation_and_complement() {
        let a = lit(3);
        assert_eq!(!!a, a);
        assert!(a.is_complement_of(!a));
        assert!(!a.is_complement_of(a));
        assert!(!a.is_complement_of(lit(-4)));
        assert_ne!(a.code(), (!a).code());
        assert_eq!(a.code() / 2, (!a).code() / 2);
    }

    #[test]
    fn tautology_detection() {
        assert!(Clause::new(vec![lit(1), lit(2), lit(-1)]).is_tautology());
        assert!(!Clause::new(vec![lit(1), lit(2), lit(1)]).is_tautology());
        assert!(!Clause::new(vec![]).is_tautology());
    }

    #[test]
    fn cnf_tracks_variable_count() {
        let cnf = Cnf::from_dimacs_clauses(vec![vec![1, -5], vec![2]]).unwrap();
        assert_eq!(cnf.num_variables(), 5);
        assert_eq!(cnf.clauses().len(), 2);
        assert!(Cnf::from_dimacs_clauses(vec![vec![1, 0]]).is_err());
    }

    #[test]
    fn model_fills_open_variables() {
        let cnf = Cnf::from_dimacs_clauses(vec![vec![-2], vec![1, -2]]).unwrap();
        let model = Model::new(cnf, vec![lit(-2)]);
        assert_eq!(model.assignment(), &[true, false]);
        assert_eq!(
            model.literals().map(|l| l.to_dimacs()).collect::<Vec<_>>(),
            vec![1, -2]
        );
        assert_eq!(model.trail(), &[lit(-2)]);
    }

    #[test]
    fn model_value_outside_formula() {
        let cnf = Cnf::from_dimacs_clauses(vec![vec![1, 2]]).unwrap();
        let model = Model::new(cnf, vec![lit(1)]);
        assert_eq!(model.value(lit(2).variable()), Some(true));
        assert_eq!(model.value(lit(3).variable()), None);
    }
}
