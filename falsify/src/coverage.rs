//! Label coverage accumulation and statistical significance tests.
//!
//! A property can require that some minimum proportion of sampled test cases
//! carry a label. Because test cases are random, an observed proportion can
//! meet or miss a requirement by chance alone; given a significance level,
//! the checks here use Wilson score intervals so a verdict is only rendered
//! when the data supports it. Three intervals against a required level X:
//!
//! ```text
//!                  *-C-*
//!         *------B------*
//!     *---A---*
//! 0 -------------X----------------------------- 1
//! ```
//!
//! A is confidently insufficient (even its upper bound is below X), C is
//! confidently sufficient (even its lower bound exceeds X), and B is
//! undecided either way until more data arrives.

use std::collections::HashMap;

use crate::control::Control;

/// Accumulated label observations for a whole check run. Grows monotonically;
/// the significance checks only read it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coverage {
    required: HashMap<String, f64>,
    observed: HashMap<String, u64>,
}

impl Coverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the signals a single (non-discarded) test case recorded.
    pub fn update(&mut self, control: &Control) {
        for (label, minimum) in control.required() {
            self.required.insert(label.clone(), *minimum);
        }
        for (label, covered) in control.observed() {
            let count = self.observed.entry(label.clone()).or_insert(0);
            if *covered {
                *count += 1;
            }
        }
    }

    /// Required minimum fraction per label.
    pub fn required(&self) -> &HashMap<String, f64> {
        &self.required
    }

    /// Observed occurrence count per label.
    pub fn observed(&self) -> &HashMap<String, u64> {
        &self.observed
    }

    /// True when every required label has sufficient coverage. Without a
    /// significance level this is the naive proportion test, subject to
    /// sampling noise; with one, every label's lower Wilson bound must clear
    /// its minimum.
    pub fn satisfied(&self, test_count: u64, significance: Option<f64>) -> bool {
        self.satisfied_labels(test_count, significance).len() == self.required.len()
    }

    /// True when any required label confidently misses its minimum. Without a
    /// significance level this is the naive complement of
    /// [`Coverage::satisfied`]; with one, a label counts only when its upper
    /// Wilson bound is below the minimum.
    pub fn unsatisfied(&self, test_count: u64, significance: Option<f64>) -> bool {
        !self.unsatisfied_labels(test_count, significance).is_empty()
    }

    /// Labels with sufficient coverage, sorted for deterministic reporting.
    pub fn satisfied_labels(&self, test_count: u64, significance: Option<f64>) -> Vec<String> {
        self.select_labels(test_count, significance, true)
    }

    /// Labels with confidently insufficient coverage, sorted for
    /// deterministic reporting.
    pub fn unsatisfied_labels(&self, test_count: u64, significance: Option<f64>) -> Vec<String> {
        self.select_labels(test_count, significance, false)
    }

    fn select_labels(
        &self,
        test_count: u64,
        significance: Option<f64>,
        sufficient: bool,
    ) -> Vec<String> {
        let mut labels: Vec<String> = self
            .required
            .iter()
            .filter(|(label, minimum)| {
                let count = self.observed.get(*label).copied().unwrap_or(0);
                match significance {
                    None => {
                        let ratio = if test_count == 0 {
                            0.0
                        } else {
                            count as f64 / test_count as f64
                        };
                        if sufficient {
                            ratio >= **minimum
                        } else {
                            ratio < **minimum
                        }
                    }
                    Some(alpha) => {
                        let z = probit(1.0 - alpha / 2.0);
                        let (lower, upper) = wilson_bounds(count, test_count, z);
                        if sufficient {
                            lower >= **minimum
                        } else {
                            upper < **minimum
                        }
                    }
                }
            })
            .map(|(label, _)| label.clone())
            .collect();
        labels.sort();
        labels
    }
}

/// The continuity-corrected Wilson score interval for `successes` out of
/// `trials`, at critical value `z`. Returns `(lower, upper)` clamped into
/// `[0, 1]`.
pub fn wilson_bounds(successes: u64, trials: u64, z: f64) -> (f64, f64) {
    if trials == 0 {
        return (0.0, 1.0);
    }
    let n = trials as f64;
    let np = successes as f64;
    let p = np / n;
    let zsq = z * z;

    let mid = 2.0 * np + zsq;
    let denom = 2.0 * (n + zsq);

    let lower = if successes == 0 {
        0.0
    } else {
        let arg = (zsq - 1.0 / n + 4.0 * np * (1.0 - p) + (4.0 * p - 2.0)).max(0.0);
        ((mid - (z * arg.sqrt() + 1.0)) / denom).max(0.0)
    };

    let upper = if successes == trials {
        1.0
    } else {
        let arg = (zsq - 1.0 / n + 4.0 * np * (1.0 - p) - (4.0 * p - 2.0)).max(0.0);
        ((mid + (z * arg.sqrt() + 1.0)) / denom).min(1.0)
    };

    (lower, upper)
}

/// The quantile function of the standard normal distribution: the value of a
/// standard normal variable associated with the given cumulative probability.
/// For example `probit(0.025) ≈ -1.96`.
///
/// Uses Peter John Acklam's rational approximation of the inverse normal CDF.
pub fn probit(p: f64) -> f64 {
    if p < 0.0 || p > 1.0 || p.is_nan() {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    const A1: f64 = -3.969683028665376e+01;
    const A2: f64 = 2.209460984245205e+02;
    const A3: f64 = -2.759285104469687e+02;
    const A4: f64 = 1.383577518672690e+02;
    const A5: f64 = -3.066479806614716e+01;
    const A6: f64 = 2.506628277459239e+00;

    const B1: f64 = -5.447609879822406e+01;
    const B2: f64 = 1.615858368580409e+02;
    const B3: f64 = -1.556989798598866e+02;
    const B4: f64 = 6.680131188771972e+01;
    const B5: f64 = -1.328068155288572e+01;

    const C1: f64 = -7.784894002430293e-03;
    const C2: f64 = -3.223964580411365e-01;
    const C3: f64 = -2.400758277161838e+00;
    const C4: f64 = -2.549732539343734e+00;
    const C5: f64 = 4.374664141464968e+00;
    const C6: f64 = 2.938163982698783e+00;

    const D1: f64 = 7.784695709041462e-03;
    const D2: f64 = 3.224671290700398e-01;
    const D3: f64 = 2.445134137142996e+00;
    const D4: f64 = 3.754408661907416e+00;

    const P_LO: f64 = 0.02425;
    const P_HI: f64 = 1.0 - P_LO;

    if p < P_LO {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C1 * q + C2) * q + C3) * q + C4) * q + C5) * q + C6)
            / ((((D1 * q + D2) * q + D3) * q + D4) * q + 1.0)
    } else if p > P_HI {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C1 * q + C2) * q + C3) * q + C4) * q + C5) * q + C6)
            / ((((D1 * q + D2) * q + D3) * q + D4) * q + 1.0)
    } else {
        let q = p - 0.5;
        let r = q * q;
        (((((A1 * r + A2) * r + A3) * r + A4) * r + A5) * r + A6) * q
            / (((((B1 * r + B2) * r + B3) * r + B4) * r + B5) * r + 1.0)
    }
}
