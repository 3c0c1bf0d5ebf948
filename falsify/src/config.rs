//! Configuration for check runs.

use crate::error::Error;

// Significance levels at or below zero are forced up to the smallest
// meaningful alpha instead of breaking the probit.
pub(crate) const MIN_SIGNIFICANCE: f64 = 2.710505431213761e-20;

/// Immutable parameters controlling a check run. All fields are defaulted;
/// `for_domain` derives test and discard budgets from a finite domain size.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Check the property against this many test cases, unless `stop_early`
    /// ends the run sooner with the same outcome.
    pub min_tests: u64,
    /// Discarded test cases tolerated before the run gives up.
    pub max_discards: u64,
    /// Evaluation budget for the search for a minimal counterexample.
    pub max_shrinks: u64,
    /// Times to re-run a passing test case before counting it as passed.
    /// Useful when a property can fail nondeterministically.
    pub min_retries: u64,
    /// Stop as soon as label coverage is conclusively adequate or inadequate.
    pub stop_early: bool,
    /// Seed for the entropy stream; drawn from the operating system when
    /// unset. Either way the seed used is carried in the report for replay.
    pub seed: Option<u64>,
    significance_level: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_tests: 100,
            max_discards: 10,
            max_shrinks: 1000,
            min_retries: 0,
            stop_early: false,
            seed: None,
            significance_level: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Budgets derived from a finite domain of `domain_size` values: test 90%
    /// of the domain and tolerate discards for 10% of it.
    pub fn for_domain(domain_size: u64) -> Self {
        Self {
            min_tests: (domain_size * 9 / 10).max(1),
            max_discards: domain_size / 10,
            ..Self::default()
        }
    }

    pub fn with_min_tests(mut self, min_tests: u64) -> Self {
        self.min_tests = min_tests;
        self
    }

    pub fn with_max_discards(mut self, max_discards: u64) -> Self {
        self.max_discards = max_discards;
        self
    }

    pub fn with_max_shrinks(mut self, max_shrinks: u64) -> Self {
        self.max_shrinks = max_shrinks;
        self
    }

    pub fn with_min_retries(mut self, min_retries: u64) -> Self {
        self.min_retries = min_retries;
        self
    }

    pub fn with_stop_early(mut self, stop_early: bool) -> Self {
        self.stop_early = stop_early;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable statistically significant coverage checking at level `alpha`.
    pub fn with_significance(mut self, alpha: f64) -> Self {
        self.significance_level = Some(alpha);
        self
    }

    /// The effective significance level: non-positive values are floored to
    /// the smallest meaningful alpha.
    pub fn significance_level(&self) -> Option<f64> {
        self.significance_level
            .map(|alpha| if alpha <= 0.0 { MIN_SIGNIFICANCE } else { alpha })
    }

    /// Reject configurations a run cannot start from.
    pub fn validate(&self) -> Result<(), Error> {
        if self.min_tests == 0 {
            return Err(Error::config(
                "min_tests must be positive",
                Some("min_tests"),
            ));
        }
        if let Some(alpha) = self.significance_level {
            if alpha.is_nan() || alpha >= 1.0 {
                return Err(Error::config(
                    "significance level must be below 1.0",
                    Some("significance_level"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.min_tests, 100);
        assert_eq!(config.max_discards, 10);
        assert_eq!(config.max_shrinks, 1000);
        assert_eq!(config.min_retries, 0);
        assert!(!config.stop_early);
        assert!(config.seed.is_none());
        assert!(config.significance_level().is_none());
    }

    #[test]
    fn test_for_domain_scales_budgets() {
        let config = Config::for_domain(200);
        assert_eq!(config.min_tests, 180);
        assert_eq!(config.max_discards, 20);

        // Tiny domains still test at least one case.
        let config = Config::for_domain(1);
        assert_eq!(config.min_tests, 1);
        assert_eq!(config.max_discards, 0);
    }

    #[test]
    fn test_builders_chain() {
        let config = Config::new()
            .with_min_tests(50)
            .with_max_shrinks(10)
            .with_seed(7)
            .with_stop_early(true);
        assert_eq!(config.min_tests, 50);
        assert_eq!(config.max_shrinks, 10);
        assert_eq!(config.seed, Some(7));
        assert!(config.stop_early);
    }

    #[test]
    fn test_non_positive_significance_is_floored() {
        let config = Config::new().with_significance(0.0);
        assert_eq!(config.significance_level(), Some(MIN_SIGNIFICANCE));

        let config = Config::new().with_significance(0.05);
        assert_eq!(config.significance_level(), Some(0.05));
    }

    #[test]
    fn test_validation_rejects_bad_configs() {
        assert!(Config::new().with_min_tests(0).validate().is_err());
        assert!(Config::new().with_significance(1.5).validate().is_err());
        assert!(Config::new().with_significance(f64::NAN).validate().is_err());
        assert!(Config::new().validate().is_ok());
        assert!(Config::new().with_significance(0.05).validate().is_ok());
    }
}
