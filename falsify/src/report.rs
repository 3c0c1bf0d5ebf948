//! Terminal reports produced by a check run.

use std::fmt;

use crate::config::Config;
use crate::coverage::Coverage;

/// Why a test case counted as a counterexample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// The property returned false.
    Falsified,
    /// The property panicked; the payload message is preserved.
    Panicked(String),
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Falsified => write!(f, "property returned false"),
            Reason::Panicked(message) => write!(f, "property panicked: {}", message),
        }
    }
}

/// The simplest falsifying case the shrink search found, together with how it
/// failed. `original_reason` is how the unshrunk case failed; the two can
/// differ when shrinking lands on a differently-failing input.
#[derive(Debug, Clone, PartialEq)]
pub struct Counterexample<A> {
    pub value: A,
    pub reason: Reason,
    pub original_reason: Reason,
    /// Evaluations the shrink search performed; never exceeds the configured
    /// shrink budget.
    pub shrink_count: u64,
}

/// Terminal outcome of a check run.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict<A> {
    /// No counterexample was found.
    Success,
    /// The discard budget was exhausted before enough test cases ran.
    TooManyDiscards,
    /// A required coverage label conclusively missed its minimum.
    CoverageInsufficient,
    /// Coverage could not be confirmed or refuted at the configured
    /// significance level.
    CoverageInsignificant,
    /// A falsifying test case was found.
    Counterexample(Counterexample<A>),
}

/// Immutable summary of a finished check run. Any run is fully reproducible
/// from `seed` alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Report<A> {
    pub seed: u64,
    pub test_count: u64,
    pub discard_count: u64,
    pub coverage: Coverage,
    pub config: Config,
    pub verdict: Verdict<A>,
}

impl<A> Report<A> {
    pub fn is_success(&self) -> bool {
        matches!(self.verdict, Verdict::Success)
    }

    pub fn is_counterexample(&self) -> bool {
        matches!(self.verdict, Verdict::Counterexample(_))
    }

    /// The counterexample, when the verdict carries one.
    pub fn counterexample(&self) -> Option<&Counterexample<A>> {
        match &self.verdict {
            Verdict::Counterexample(counterexample) => Some(counterexample),
            _ => None,
        }
    }
}
