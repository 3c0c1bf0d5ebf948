//! Composable generators: functions from an entropy source and a scale to a
//! shrink tree.

use std::rc::Rc;

use crate::bounds::Scale;
use crate::entropy::Entropy;
use crate::tree::{LazySeq, Tree};

/// Signal that a generator could not produce a value within its retry budget.
/// The engine counts it against the discard budget; it is never fatal on its
/// own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discarded;

const FILTER_RETRIES: u8 = 100;

type Run<A> = dyn Fn(&Entropy, Scale) -> Result<Tree<A>, Discarded>;

/// A composable description of how to produce one shrinkable value.
///
/// A generator is a plain value wrapping a function; combinators build new
/// generators from old ones. Cloning is cheap and shares the wrapped
/// function.
pub struct Generator<A> {
    run: Rc<Run<A>>,
}

impl<A> Clone for Generator<A> {
    fn clone(&self) -> Self {
        Self {
            run: Rc::clone(&self.run),
        }
    }
}

impl<A: Clone + 'static> Generator<A> {
    /// Create a generator from a sampling function.
    pub fn new(run: impl Fn(&Entropy, Scale) -> Result<Tree<A>, Discarded> + 'static) -> Self {
        Self { run: Rc::new(run) }
    }

    /// A generator that ignores entropy and scale and produces `value` with
    /// no shrinks.
    pub fn pure(value: A) -> Self {
        Generator::new(move |_, _| Ok(Tree::leaf(value.clone())))
    }

    /// Produce one shrink tree.
    pub fn sample(&self, entropy: &Entropy, scale: Scale) -> Result<Tree<A>, Discarded> {
        (*self.run)(entropy, scale)
    }

    /// Transform every generated value (and its shrinks).
    pub fn map<B: Clone + 'static>(&self, f: impl Fn(&A) -> B + 'static) -> Generator<B> {
        let inner = self.clone();
        let f: Rc<dyn Fn(&A) -> B> = Rc::new(f);
        Generator::new(move |entropy, scale| {
            let tree = inner.sample(entropy, scale)?;
            let g = Rc::clone(&f);
            Ok(tree.map(move |a| (*g)(a)))
        })
    }

    /// Sequence a dependent generator. The produced sub-generator is fed the
    /// *same* entropy stream and scale, so a fixed seed reproduces the entire
    /// run including nested choices.
    pub fn flat_map<B: Clone + 'static>(
        &self,
        f: impl Fn(&A) -> Generator<B> + 'static,
    ) -> Generator<B> {
        let inner = self.clone();
        let f: Rc<dyn Fn(&A) -> Generator<B>> = Rc::new(f);
        Generator::new(move |entropy, scale| {
            let outer = inner.sample(entropy, scale)?;
            bind(&outer, &f, entropy, scale)
        })
    }

    /// Pair two generators, combining results with `combine`. Either side can
    /// shrink independently.
    pub fn zip_with<B, C>(
        &self,
        other: &Generator<B>,
        combine: impl Fn(&A, &B) -> C + 'static,
    ) -> Generator<C>
    where
        B: Clone + 'static,
        C: Clone + 'static,
    {
        let left = self.clone();
        let right = other.clone();
        let combine: Rc<dyn Fn(&A, &B) -> C> = Rc::new(combine);
        Generator::new(move |entropy, scale| {
            let lt = left.sample(entropy, scale)?;
            let rt = right.sample(entropy, scale)?;
            let f = Rc::clone(&combine);
            Ok(lt.zip_with(&rt, move |a, b| (*f)(a, b)))
        })
    }

    /// Pair two generators into tuples.
    pub fn zip<B: Clone + 'static>(&self, other: &Generator<B>) -> Generator<(A, B)> {
        self.zip_with(other, |a, b| (a.clone(), b.clone()))
    }

    /// Applicative apply: a generator of functions applied to this generator
    /// of arguments, defined via [`Generator::zip_with`]. The function side is
    /// sampled first.
    pub fn ap<B: Clone + 'static>(&self, functions: &Generator<Rc<dyn Fn(&A) -> B>>) -> Generator<B> {
        functions.zip_with(self, |f, a| (**f)(a))
    }

    /// Keep only values accepted by the predicate. Retries up to 100 times,
    /// advancing the scale offset on each attempt, then signals a discard.
    /// Accepted trees are filtered so every shrink candidate also satisfies
    /// the predicate.
    pub fn filter(&self, pred: impl Fn(&A) -> bool + 'static) -> Generator<A> {
        let inner = self.clone();
        let pred: Rc<dyn Fn(&A) -> bool> = Rc::new(pred);
        Generator::new(move |entropy, scale| {
            for attempt in 0..FILTER_RETRIES {
                let tree = inner.sample(entropy, scale.offset(attempt))?;
                let p = Rc::clone(&pred);
                if let Some(kept) = tree.filter(move |a| (*p)(a)) {
                    return Ok(kept);
                }
            }
            Err(Discarded)
        })
    }

    /// Extend the produced tree's structural shrinking with a user-supplied
    /// rule mapping a value to simpler variants.
    pub fn shrink(&self, rule: impl Fn(&A) -> Vec<A> + 'static) -> Generator<A> {
        let inner = self.clone();
        let rule: Rc<dyn Fn(&A) -> Vec<A>> = Rc::new(rule);
        Generator::new(move |entropy, scale| {
            let tree = inner.sample(entropy, scale)?;
            let r = Rc::clone(&rule);
            Ok(tree.expand(move |a| (*r)(a)))
        })
    }
}

// Substitutes a generator for every node of `outer`, threading one entropy
// stream through the whole traversal. Children are rebuilt lazily; a child
// whose substituted generation discards is dropped rather than invalidating
// the tree that already exists.
fn bind<A, B>(
    outer: &Tree<A>,
    f: &Rc<dyn Fn(&A) -> Generator<B>>,
    entropy: &Entropy,
    scale: Scale,
) -> Result<Tree<B>, Discarded>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    let inner = (**f)(outer.value()).sample(entropy, scale)?;
    let rebound = {
        let f = Rc::clone(f);
        let entropy = entropy.clone();
        outer
            .children()
            .iter()
            .filter_map(move |child| bind(&child, &f, &entropy, scale).ok())
    };
    Ok(inner.prepend_children(LazySeq::new(rebound)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_value<A: Clone + 'static>(generator: &Generator<A>, seed: u64) -> A {
        let entropy = Entropy::from_seed(seed);
        generator
            .sample(&entropy, Scale::MAX)
            .expect("generator discarded")
            .value()
            .clone()
    }

    #[test]
    fn test_pure_ignores_entropy_and_has_no_shrinks() {
        let generator = Generator::pure(42);
        let entropy = Entropy::from_seed(0);
        let tree = generator.sample(&entropy, Scale::new(0)).unwrap();
        assert_eq!(*tree.value(), 42);
        assert!(tree.children().is_empty());
    }

    #[test]
    fn test_map_transforms_the_whole_tree() {
        let entropy = Entropy::from_seed(3);
        let generator = Generator::new(|_, _| {
            Ok(Tree::new(
                2,
                LazySeq::from_vec(vec![Tree::leaf(0), Tree::leaf(1)]),
            ))
        });
        let tree = generator.map(|n| n * 10).sample(&entropy, Scale::MAX).unwrap();
        assert_eq!(tree.values(), vec![20, 0, 10]);
    }

    #[test]
    fn test_flat_map_threads_one_entropy_stream() {
        let draw = Generator::new(|entropy: &Entropy, _| Ok(Tree::leaf(entropy.i64_in(0, 1 << 30))));
        let paired = draw.flat_map(move |first| {
            let first = *first;
            Generator::new(move |entropy: &Entropy, _| {
                Ok(Tree::leaf((first, entropy.i64_in(0, 1 << 30))))
            })
        });

        let (a, b) = sample_value(&paired, 11);
        let replay = Entropy::from_seed(11);
        assert_eq!(a, replay.i64_in(0, 1 << 30));
        assert_eq!(b, replay.i64_in(0, 1 << 30));
    }

    #[test]
    fn test_zip_samples_left_then_right() {
        let draw = Generator::new(|entropy: &Entropy, _| Ok(Tree::leaf(entropy.i64_in(0, 1 << 30))));
        let (a, b) = sample_value(&draw.zip(&draw), 29);

        let replay = Entropy::from_seed(29);
        assert_eq!(a, replay.i64_in(0, 1 << 30));
        assert_eq!(b, replay.i64_in(0, 1 << 30));
    }

    #[test]
    fn test_filter_keeps_matching_trees() {
        let generator = Generator::new(|entropy: &Entropy, _| {
            let n = entropy.i64_in(0, 100);
            Ok(Tree::new(n, LazySeq::from_vec(vec![Tree::leaf(0)])))
        });
        let even = generator.filter(|n| n % 2 == 0);

        let entropy = Entropy::from_seed(5);
        for _ in 0..20 {
            let tree = even.sample(&entropy, Scale::MAX).unwrap();
            assert_eq!(tree.value() % 2, 0);
            // Shrink candidates satisfy the predicate too.
            for child in tree.children().iter() {
                assert_eq!(child.value() % 2, 0);
            }
        }
    }

    #[test]
    fn test_filter_gives_up_with_a_discard() {
        let generator = Generator::pure(1).filter(|n| *n == 0);
        let entropy = Entropy::from_seed(0);
        assert!(matches!(
            generator.sample(&entropy, Scale::new(0)),
            Err(Discarded)
        ));
    }

    #[test]
    fn test_shrink_appends_user_candidates() {
        let generator = Generator::pure(4).shrink(|n| if *n > 0 { vec![n - 1] } else { vec![] });
        let entropy = Entropy::from_seed(0);
        let tree = generator.sample(&entropy, Scale::new(0)).unwrap();

        assert_eq!(*tree.value(), 4);
        let first = tree.children().get(0).unwrap();
        assert_eq!(*first.value(), 3);
        assert_eq!(*first.children().get(0).unwrap().value(), 2);
    }

    #[test]
    fn test_ap_applies_sampled_functions() {
        let values = Generator::pure(5);
        let double: Rc<dyn Fn(&i64) -> i64> = Rc::new(|n| n * 2);
        let functions = Generator::pure(double);
        assert_eq!(sample_value(&values.ap(&functions), 0), 10);
    }
}
