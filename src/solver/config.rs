use std::{convert::TryFrom, fmt::Display, str::FromStr};

use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum PolicyParseError {
    #[snafu(display(
        "Unknown branching policy '{}' (expected 1-4, next, dlis, vsids or jw)",
        name
    ))]
    UnknownPolicy { name: String },
}

/// Branching policy used when propagation stalls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// First literal of the first remaining clause.
    Next = 1,
    /// Variable occurring in the most remaining clauses.
    Dlis = 2,
    /// Literal with the highest conflict score.
    Vsids = 3,
    /// Positive literal with the largest `Σ 2^-|clause|` weight.
    JeroslowWang = 4,
}

impl Policy {
    pub const ALL: [Policy; 4] = [
        Policy::Next,
        Policy::Dlis,
        Policy::Vsids,
        Policy::JeroslowWang,
    ];
}

impl Default for Policy {
    fn default() -> Self {
        Policy::Next
    }
}

impl TryFrom<u8> for Policy {
    type Error = PolicyParseError;

    fn try_from(num: u8) -> Result<Self, Self::Error> {
        match num {
            1 => Ok(Policy::Next),
            2 => Ok(Policy::Dlis),
            3 => Ok(Policy::Vsids),
            4 => Ok(Policy::JeroslowWang),
            _ => UnknownPolicy {
                name: num.to_string(),
            }
            .fail(),
        }
    }
}

impl FromStr for Policy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(num) = s.parse::<u8>() {
            return Policy::try_from(num);
        }

        match s.to_ascii_lowercase().as_str() {
            "next" => Ok(Policy::Next),
            "dlis" => Ok(Policy::Dlis),
            "vsids" => Ok(Policy::Vsids),
            "jw" | "jeroslow-wang" => Ok(Policy::JeroslowWang),
            _ => UnknownPolicy { name: s }.fail(),
        }
    }
}

impl Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Policy::Next => "Next",
            Policy::Dlis => "DLIS",
            Policy::Vsids => "VSIDS",
            Policy::JeroslowWang => "Jeroslow-Wang",
        };
        write!(f, "{}", name)
    }
}

/// Per-solve configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolverConfig {
    pub policy: Policy,
    /// Emit per-step statistics through the logger.
    pub verbose: bool,
}

impl SolverConfig {
    pub fn new(policy: Policy) -> Self {
        SolverConfig {
            policy,
            verbose: false,
        }
    }

    pub fn verbose(self, verbose: bool) -> Self {
        SolverConfig { verbose, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_policy() {
        assert_eq!("1".parse::<Policy>().unwrap(), Policy::Next);
        assert_eq!("DLIS".parse::<Policy>().unwrap(), Policy::Dlis);
        assert_eq!("3".parse::<Policy>().unwrap(), Policy::Vsids);
        assert_eq!("jw".parse::<Policy>().unwrap(), Policy::JeroslowWang);
        assert!("5".parse::<Policy>().is_err());
        assert!("random".parse::<Policy>().is_err());
    }

    #[test]
    fn policy_numbers_round_trip() {
        for policy in Policy::ALL.iter().copied() {
            assert_eq!(Policy::try_from(policy as u8).unwrap(), policy);
        }
    }
}
