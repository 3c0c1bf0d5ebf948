//! Per-test-case signaling and per-run counters.

use std::collections::HashMap;

/// The surface a property uses to talk back to the engine while it runs:
/// discarding the current case, classifying it, or requiring label coverage.
///
/// One instance exists per check run and is reset between test cases.
#[derive(Debug, Clone, Default)]
pub struct Control {
    required: HashMap<String, f64>,
    observed: HashMap<String, bool>,
    discarded: bool,
}

impl Control {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the current test case; it counts toward the discard budget but
    /// not toward pass/fail totals. The property should return promptly after
    /// calling this.
    pub fn discard(&mut self) {
        self.discarded = true;
    }

    /// True when the current test case has been discarded.
    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    /// Classify the current test case under `label` for end-of-run reporting,
    /// without requiring any minimum frequency.
    pub fn classify(&mut self, label: impl Into<String>, covered: bool) {
        self.cover(label, 0.0, covered);
    }

    /// Require at least `minimum` (a fraction of test cases, `0.0..=1.0`) to
    /// be covered by `label`, and record whether this case is.
    pub fn cover(&mut self, label: impl Into<String>, minimum: f64, covered: bool) {
        let minimum = if minimum.is_finite() {
            minimum.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let label = label.into();
        self.required.insert(label.clone(), minimum);
        self.observed.insert(label, covered);
    }

    /// Required minimum fraction per label, as declared by this test case.
    pub fn required(&self) -> &HashMap<String, f64> {
        &self.required
    }

    /// Observed label membership for this test case.
    pub fn observed(&self) -> &HashMap<String, bool> {
        &self.observed
    }

    /// Clear all signals for the next test case.
    pub fn reset(&mut self) {
        self.required.clear();
        self.observed.clear();
        self.discarded = false;
    }
}

/// Mutable tallies for one check run. Discarded when the run ends; everything
/// a consumer needs survives in the [`Report`](crate::report::Report).
#[derive(Debug, Clone)]
pub struct Counter {
    /// Test cases where the property held.
    pub ok: u64,
    /// Test cases where the property returned false.
    pub no: u64,
    /// Discarded test cases.
    pub skip: u64,
    /// Test cases where the property panicked.
    pub fail: u64,
    /// Evaluations performed, including shrink-search evaluations.
    pub steps: u64,
    /// Classification label tallies.
    pub labels: HashMap<String, u64>,
    shrunk: Option<Box<Counter>>,
}

impl Counter {
    /// A fresh top-level counter with a nested sub-counter for shrink search.
    pub fn new() -> Self {
        Self {
            shrunk: Some(Box::new(Self::sub())),
            ..Self::sub()
        }
    }

    fn sub() -> Self {
        Self {
            ok: 0,
            no: 0,
            skip: 0,
            fail: 0,
            steps: 0,
            labels: HashMap::new(),
            shrunk: None,
        }
    }

    /// Every evaluation outcome tallied so far.
    pub fn total(&self) -> u64 {
        self.ok + self.no + self.skip + self.fail
    }

    /// Completed (non-discarded) test cases.
    pub fn tested(&self) -> u64 {
        self.ok + self.no + self.fail
    }

    /// Record one occurrence of a classification label.
    pub fn label(&mut self, name: &str) {
        *self.labels.entry(name.to_string()).or_insert(0) += 1;
    }

    /// The nested counter tracking shrink-search evaluations, if this is a
    /// top-level counter.
    pub fn shrunk(&self) -> Option<&Counter> {
        self.shrunk.as_deref()
    }

    pub fn shrunk_mut(&mut self) -> Option<&mut Counter> {
        self.shrunk.as_deref_mut()
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discard_flag_round_trip() {
        let mut control = Control::new();
        assert!(!control.is_discarded());
        control.discard();
        assert!(control.is_discarded());
        control.reset();
        assert!(!control.is_discarded());
    }

    #[test]
    fn test_cover_records_requirement_and_observation() {
        let mut control = Control::new();
        control.cover("even", 0.3, true);
        control.cover("small", 0.1, false);

        assert_eq!(control.required()["even"], 0.3);
        assert_eq!(control.required()["small"], 0.1);
        assert!(control.observed()["even"]);
        assert!(!control.observed()["small"]);
    }

    #[test]
    fn test_classify_requires_nothing() {
        let mut control = Control::new();
        control.classify("odd", true);
        assert_eq!(control.required()["odd"], 0.0);
    }

    #[test]
    fn test_cover_clamps_the_minimum() {
        let mut control = Control::new();
        control.cover("a", 7.0, true);
        control.cover("b", -2.0, true);
        control.cover("c", f64::NAN, true);
        assert_eq!(control.required()["a"], 1.0);
        assert_eq!(control.required()["b"], 0.0);
        assert_eq!(control.required()["c"], 0.0);
    }

    #[test]
    fn test_counter_totals() {
        let mut counter = Counter::new();
        counter.ok = 5;
        counter.no = 1;
        counter.skip = 2;
        counter.fail = 1;

        assert_eq!(counter.total(), 9);
        assert_eq!(counter.tested(), 7);

        counter.label("even");
        counter.label("even");
        assert_eq!(counter.labels["even"], 2);
    }

    #[test]
    fn test_only_top_level_counters_nest() {
        let mut counter = Counter::new();
        assert!(counter.shrunk().is_some());
        assert!(counter.shrunk_mut().unwrap().shrunk().is_none());
    }
}
