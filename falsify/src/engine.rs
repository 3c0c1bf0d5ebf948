//! The checking engine: drives sampling, detects falsification, and runs the
//! budgeted best-first shrink search.

use std::any::Any;
use std::cmp::Ordering;
use std::panic::{self, AssertUnwindSafe};

use crate::bounds::Scale;
use crate::config::Config;
use crate::control::{Control, Counter};
use crate::coverage::Coverage;
use crate::entropy::Entropy;
use crate::error::Error;
use crate::generator::{Discarded, Generator};
use crate::report::{Counterexample, Reason, Report, Verdict};
use crate::tree::{LazySeq, Tree};

/// A property under test. Implemented for any `Fn(&A, &mut Control) -> bool`
/// closure; see [`property`] for predicates that ignore the control surface.
pub trait Property<A> {
    /// Evaluate the property against one test case. Returning `false`
    /// falsifies it; panicking is a hard failure tracked with its message.
    fn test(&self, value: &A, control: &mut Control) -> bool;
}

impl<A, F> Property<A> for F
where
    F: Fn(&A, &mut Control) -> bool,
{
    fn test(&self, value: &A, control: &mut Control) -> bool {
        self(value, control)
    }
}

/// Adapt a plain predicate into a [`Property`] that ignores the control
/// surface.
pub fn property<A, F: Fn(&A) -> bool>(predicate: F) -> ValueProperty<F> {
    ValueProperty(predicate)
}

/// A property built from a value-only predicate.
pub struct ValueProperty<F>(F);

impl<A, F: Fn(&A) -> bool> Property<A> for ValueProperty<F> {
    fn test(&self, value: &A, _control: &mut Control) -> bool {
        (self.0)(value)
    }
}

/// Per-test-case evaluation outcome.
enum Outcome {
    Passed,
    Discarded,
    Falsified,
    Panicked(String),
}

/// Runs properties against sampled or exhaustively enumerated inputs and
/// produces a terminal [`Report`].
#[derive(Debug, Clone, Default)]
pub struct Checker {
    config: Config,
}

impl Checker {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check a property against sampled values. Only configuration errors are
    /// returned as `Err`; every run outcome is a [`Report`].
    pub fn check<A, P>(&self, generator: &Generator<A>, property: P) -> Result<Report<A>, Error>
    where
        A: Clone + 'static,
        P: Property<A>,
    {
        self.config.validate()?;
        let entropy = self.entropy();
        let generator = generator.clone();
        let sampler = entropy.clone();
        let mut source = move |scale: Scale| Some(generator.sample(&sampler, scale));
        Ok(self.run(&entropy, &mut source, &property))
    }

    /// Check a property against every value of a finite domain, in order.
    /// Exhausting the domain before `min_tests` is a success; enumerated
    /// values do not shrink.
    pub fn check_exhaustive<A, I, P>(&self, domain: I, property: P) -> Result<Report<A>, Error>
    where
        A: Clone + 'static,
        I: IntoIterator<Item = A>,
        P: Property<A>,
    {
        self.config.validate()?;
        let entropy = self.entropy();
        let mut values = domain.into_iter();
        let mut source = move |_scale: Scale| values.next().map(|value| Ok(Tree::leaf(value)));
        Ok(self.run(&entropy, &mut source, &property))
    }

    fn entropy(&self) -> Entropy {
        match self.config.seed {
            Some(seed) => Entropy::from_seed(seed),
            None => Entropy::from_os(),
        }
    }

    fn run<A, P>(
        &self,
        entropy: &Entropy,
        source: &mut dyn FnMut(Scale) -> Option<Result<Tree<A>, Discarded>>,
        property: &P,
    ) -> Report<A>
    where
        A: Clone + 'static,
        P: Property<A>,
    {
        let significance = self.config.significance_level();
        let mut counter = Counter::new();
        let mut coverage = Coverage::new();
        let mut control = Control::new();
        let mut iteration: u64 = 0;

        loop {
            if counter.skip > self.config.max_discards {
                return self.report(entropy, &counter, coverage, Verdict::TooManyDiscards);
            }

            let test_count = counter.tested();
            if test_count >= self.config.min_tests {
                return self.finish(entropy, &counter, coverage, significance);
            }

            // Checking significance repeatedly increases the chance of
            // finding it compared to a single end-of-run check, at the cost
            // of a higher chance of a wrong determination.
            if self.config.stop_early && test_count > 0 && test_count % 100 == 0 {
                if coverage.satisfied(test_count, significance) {
                    return self.report(entropy, &counter, coverage, Verdict::Success);
                }
                if coverage.unsatisfied(test_count, significance) {
                    return self.report(entropy, &counter, coverage, Verdict::CoverageInsufficient);
                }
            }

            let scale = Scale::new((iteration % 100) as u8);
            iteration += 1;

            let tree = match source(scale) {
                None => return self.report(entropy, &counter, coverage, Verdict::Success),
                Some(Err(Discarded)) => {
                    counter.skip += 1;
                    continue;
                }
                Some(Ok(tree)) => tree,
            };

            counter.steps += 1;
            match evaluate_case(property, tree.value(), &mut control, self.config.min_retries) {
                Outcome::Passed => {
                    counter.ok += 1;
                    for (label, covered) in control.observed() {
                        if *covered {
                            *counter.labels.entry(label.clone()).or_insert(0) += 1;
                        }
                    }
                    coverage.update(&control);
                }
                Outcome::Discarded => {
                    counter.skip += 1;
                }
                Outcome::Falsified => {
                    counter.no += 1;
                    return self.falsify(
                        entropy,
                        &tree,
                        Reason::Falsified,
                        &mut counter,
                        coverage,
                        property,
                        &mut control,
                    );
                }
                Outcome::Panicked(message) => {
                    counter.fail += 1;
                    return self.falsify(
                        entropy,
                        &tree,
                        Reason::Panicked(message),
                        &mut counter,
                        coverage,
                        property,
                        &mut control,
                    );
                }
            }
        }
    }

    fn finish<A>(
        &self,
        entropy: &Entropy,
        counter: &Counter,
        coverage: Coverage,
        significance: Option<f64>,
    ) -> Report<A> {
        let test_count = counter.tested();
        let verdict = match significance {
            None => {
                // Without a significance level no claim of statistical
                // confidence is made either way.
                if coverage.satisfied(test_count, None) {
                    Verdict::Success
                } else {
                    Verdict::CoverageInsufficient
                }
            }
            Some(alpha) => {
                if coverage.satisfied(test_count, Some(alpha)) {
                    Verdict::Success
                } else if coverage.unsatisfied(test_count, Some(alpha)) {
                    Verdict::CoverageInsufficient
                } else {
                    // The data neither confirms nor refutes the requirement.
                    Verdict::CoverageInsignificant
                }
            }
        };
        self.report(entropy, counter, coverage, verdict)
    }

    #[allow(clippy::too_many_arguments)]
    fn falsify<A, P>(
        &self,
        entropy: &Entropy,
        root: &Tree<A>,
        original: Reason,
        counter: &mut Counter,
        coverage: Coverage,
        property: &P,
        control: &mut Control,
    ) -> Report<A>
    where
        A: Clone + 'static,
        P: Property<A>,
    {
        let (value, reason, shrink_count) = shrink_search(
            property,
            root,
            original.clone(),
            counter,
            control,
            self.config.max_shrinks,
            self.config.min_retries,
        );
        let counterexample = Counterexample {
            value,
            reason,
            original_reason: original,
            shrink_count,
        };
        self.report(entropy, counter, coverage, Verdict::Counterexample(counterexample))
    }

    fn report<A>(
        &self,
        entropy: &Entropy,
        counter: &Counter,
        coverage: Coverage,
        verdict: Verdict<A>,
    ) -> Report<A> {
        Report {
            seed: entropy.seed(),
            test_count: counter.tested(),
            discard_count: counter.skip,
            coverage,
            config: self.config.clone(),
            verdict,
        }
    }
}

/// Check a property against sampled values with the default configuration.
pub fn check<A, P>(generator: &Generator<A>, property: P) -> Result<Report<A>, Error>
where
    A: Clone + 'static,
    P: Property<A>,
{
    Checker::new(Config::default()).check(generator, property)
}

/// Check a property against sampled values with an explicit configuration.
pub fn check_with_config<A, P>(
    config: Config,
    generator: &Generator<A>,
    property: P,
) -> Result<Report<A>, Error>
where
    A: Clone + 'static,
    P: Property<A>,
{
    Checker::new(config).check(generator, property)
}

fn evaluate_case<A, P: Property<A>>(
    property: &P,
    value: &A,
    control: &mut Control,
    retries: u64,
) -> Outcome {
    let mut outcome = evaluate_once(property, value, control);
    for _ in 0..retries {
        if !matches!(outcome, Outcome::Passed) {
            break;
        }
        outcome = evaluate_once(property, value, control);
    }
    outcome
}

fn evaluate_once<A, P: Property<A>>(property: &P, value: &A, control: &mut Control) -> Outcome {
    control.reset();
    let verdict = panic::catch_unwind(AssertUnwindSafe(|| property.test(value, control)));
    // An explicit discard wins over whatever the property went on to do.
    if control.is_discarded() {
        return Outcome::Discarded;
    }
    match verdict {
        Ok(true) => Outcome::Passed,
        Ok(false) => Outcome::Falsified,
        Err(payload) => Outcome::Panicked(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// Best-first local search over the failing node's descendants, budgeted by
// `budget` total evaluations. Candidates carry a fitness; a falsifying
// candidate replaces the incumbent when its fitness is higher and enqueues
// its own children above everything shallower, so productive branches are
// explored deeper before unexplored siblings.
fn shrink_search<A, P>(
    property: &P,
    root: &Tree<A>,
    original: Reason,
    counter: &mut Counter,
    control: &mut Control,
    budget: u64,
    retries: u64,
) -> (A, Reason, u64)
where
    A: Clone + 'static,
    P: Property<A>,
{
    let mut best = root.value().clone();
    let mut best_reason = original;
    let mut best_fitness = 0.0_f64;
    let mut steps: u64 = 0;

    let mut frontier: Vec<(f64, Tree<A>)> = Vec::new();
    enqueue(&mut frontier, &root.children(), 0.0, 1.0, budget);

    while !frontier.is_empty() && steps < budget {
        let (fitness, candidate) = frontier.remove(0);
        steps += 1;
        if let Some(shrunk) = counter.shrunk_mut() {
            shrunk.steps += 1;
        }

        let outcome = evaluate_case(property, candidate.value(), control, retries);
        let reason = match outcome {
            Outcome::Passed => {
                // Non-falsifying branches are not explored further.
                if let Some(shrunk) = counter.shrunk_mut() {
                    shrunk.ok += 1;
                }
                continue;
            }
            Outcome::Discarded => {
                // Costs budget but decides nothing.
                if let Some(shrunk) = counter.shrunk_mut() {
                    shrunk.skip += 1;
                }
                continue;
            }
            Outcome::Falsified => {
                if let Some(shrunk) = counter.shrunk_mut() {
                    shrunk.no += 1;
                }
                Reason::Falsified
            }
            Outcome::Panicked(message) => {
                if let Some(shrunk) = counter.shrunk_mut() {
                    shrunk.fail += 1;
                }
                Reason::Panicked(message)
            }
        };

        if fitness > best_fitness {
            best_fitness = fitness;
            best = candidate.value().clone();
            best_reason = reason;
        }

        enqueue(
            &mut frontier,
            &candidate.children(),
            fitness + 0.5,
            0.5,
            budget.saturating_sub(steps),
        );
        frontier.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    }

    (best, best_reason, steps)
}

// Enqueues up to `limit` children with fitness spread descending across
// `[base, base + width)` in yield order, so earlier children outrank later
// ones. The cap keeps lazy child sequences from being realized past what the
// remaining budget could ever evaluate.
fn enqueue<A: Clone + 'static>(
    frontier: &mut Vec<(f64, Tree<A>)>,
    children: &LazySeq<Tree<A>>,
    base: f64,
    width: f64,
    limit: u64,
) {
    let batch: Vec<Tree<A>> = children.iter().take(limit as usize).collect();
    let n = batch.len() as f64;
    for (i, child) in batch.into_iter().enumerate() {
        let fitness = base + width * ((n - i as f64) / (n + 1.0));
        frontier.push((fitness, child));
    }
}
