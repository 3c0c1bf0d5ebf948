//! Built-in generators: bounded numerics, collections, characters, selection
//! and probability distributions.

use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;
use std::hash::Hash;
use std::rc::Rc;
use std::time::SystemTime;

use crate::bounds::{Bounds, Coordinate, Numeric, Scale};
use crate::entropy::Entropy;
use crate::error::Error;
use crate::generator::{Discarded, Generator};
use crate::tree::{LazySeq, Tree};

// Extra draws allowed beyond the requested element count before a
// uniqueness-constrained collection gives up.
const UNIQUE_RETRIES: usize = 100;

/// Generator for any bounded coordinate domain: draws uniformly within the
/// bounds at the current scale and shrinks by bisecting toward the origin.
/// The origin is always the very first shrink offered.
pub fn bounded<A: Coordinate>(bounds: Bounds<A>) -> Generator<A> {
    Generator::new(move |entropy, scale| {
        let (lo, hi) = bounds.repr_range(scale);
        let origin = bounds.origin_repr();
        let drawn = <A::Repr as Numeric>::uniform(entropy, lo, hi);
        let tree = Tree::unfold(drawn, move |x| {
            <A::Repr as Numeric>::towards(origin, *x).collect()
        });
        Ok(tree.map(|repr| A::from_repr(*repr)))
    })
}

/// Bounded integer generator.
pub fn integer(bounds: Bounds<i64>) -> Generator<i64> {
    bounded(bounds)
}

/// Bounded float generator.
pub fn float(bounds: Bounds<f64>) -> Generator<f64> {
    bounded(bounds)
}

/// Bounded character generator; scaling, drawing, and shrinking happen on the
/// underlying code points.
pub fn character(bounds: Bounds<char>) -> Generator<char> {
    bounded(bounds)
}

/// Bounded timestamp generator over seconds relative to the Unix epoch.
pub fn timestamp(bounds: Bounds<SystemTime>) -> Generator<SystemTime> {
    bounded(bounds)
}

fn draw_count(size: &Bounds<usize>, entropy: &Entropy, scale: Scale) -> usize {
    let (lo, hi) = size.repr_range(scale);
    entropy.i64_in(lo, hi).max(0) as usize
}

/// Vectors of independently generated elements. The element count is drawn
/// from `size` at the current scale; shrinking drops elements and shrinks
/// them in place, jointly.
pub fn vec_of<A: Clone + 'static>(size: Bounds<usize>, item: Generator<A>) -> Generator<Vec<A>> {
    Generator::new(move |entropy, scale| {
        let count = draw_count(&size, entropy, scale);
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            elements.push(item.sample(entropy, scale)?);
        }
        Ok(Tree::interleave(elements))
    })
}

/// Strings built from a character generator.
pub fn string_of(size: Bounds<usize>, chars: Generator<char>) -> Generator<String> {
    vec_of(size, chars).map(|chars| chars.iter().collect())
}

/// Sets of distinct elements. Draws retry until enough distinct roots are
/// found, up to `count + 100` attempts, then signal a discard.
pub fn set_of<A>(size: Bounds<usize>, item: Generator<A>) -> Generator<HashSet<A>>
where
    A: Clone + Eq + Hash + 'static,
{
    Generator::new(move |entropy, scale| {
        let count = draw_count(&size, entropy, scale);
        let trees = draw_distinct(&item, entropy, scale, count, |value| value.clone())?;
        Ok(Tree::interleave(trees).map(|values| values.iter().cloned().collect()))
    })
}

/// Maps with distinct keys. Entry draws retry until enough distinct keys are
/// found, up to `count + 100` attempts, then signal a discard.
pub fn map_of<K, V>(size: Bounds<usize>, entries: Generator<(K, V)>) -> Generator<HashMap<K, V>>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + 'static,
{
    Generator::new(move |entropy, scale| {
        let count = draw_count(&size, entropy, scale);
        let trees = draw_distinct(&entries, entropy, scale, count, |entry| entry.0.clone())?;
        Ok(Tree::interleave(trees).map(|entries| entries.iter().cloned().collect()))
    })
}

fn draw_distinct<A, K>(
    item: &Generator<A>,
    entropy: &Entropy,
    scale: Scale,
    count: usize,
    key_of: impl Fn(&A) -> K,
) -> Result<Vec<Tree<A>>, Discarded>
where
    A: Clone + 'static,
    K: Eq + Hash,
{
    let mut seen = HashSet::with_capacity(count);
    let mut trees = Vec::with_capacity(count);
    let mut draws = 0;
    while trees.len() < count {
        if draws >= count + UNIQUE_RETRIES {
            return Err(Discarded);
        }
        draws += 1;
        let tree = item.sample(entropy, scale)?;
        if seen.insert(key_of(tree.value())) {
            trees.push(tree);
        }
    }
    Ok(trees)
}

/// Uniform choice from a fixed list. The drawn index shrinks toward the first
/// item.
pub fn choose<A: Clone + 'static>(items: Vec<A>) -> Result<Generator<A>, Error> {
    if items.is_empty() {
        return Err(Error::EmptySelection);
    }
    let last = items.len() as i64 - 1;
    let items = Rc::new(items);
    Ok(bounded::<i64>(Bounds::span(0, last)).map(move |index| items[*index as usize].clone()))
}

/// Weighted choice: each item's score is `U^(1/weight)` for an independent
/// uniform draw `U`, and the highest score wins. Does not shrink.
pub fn weighted<A: Clone + 'static>(items: Vec<A>, weights: Vec<f64>) -> Result<Generator<A>, Error> {
    if items.is_empty() {
        return Err(Error::EmptySelection);
    }
    if items.len() != weights.len() {
        return Err(Error::WeightMismatch {
            items: items.len(),
            weights: weights.len(),
        });
    }
    if let Some(index) = weights.iter().position(|w| !w.is_finite() || *w <= 0.0) {
        return Err(Error::parameter(
            "weighted",
            format!("weight at index {} must be positive and finite", index),
        ));
    }

    let items = Rc::new(items);
    let weights = Rc::new(weights);
    Ok(Generator::new(move |entropy, _scale| {
        let mut winner = 0;
        let mut best = f64::NEG_INFINITY;
        for (index, weight) in weights.iter().enumerate() {
            let score = entropy.unit().powf(1.0 / weight);
            if score > best {
                best = score;
                winner = index;
            }
        }
        Ok(Tree::leaf(items[winner].clone()))
    }))
}

/// Fair boolean generator; `true` offers `false` as its only shrink.
pub fn boolean() -> Generator<bool> {
    bernoulli_unchecked(0.5)
}

/// Boolean generator that is `true` with probability `p`.
pub fn bernoulli(p: f64) -> Result<Generator<bool>, Error> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(Error::parameter("bernoulli", "p must lie within 0.0..=1.0"));
    }
    Ok(bernoulli_unchecked(p))
}

fn bernoulli_unchecked(p: f64) -> Generator<bool> {
    Generator::new(move |entropy, _scale| {
        Ok(if entropy.unit() < p {
            Tree::new(true, LazySeq::from_vec(vec![Tree::leaf(false)]))
        } else {
            Tree::leaf(false)
        })
    })
}

// A uniform draw from (0, 1], safe to take the logarithm of.
fn unit_open(entropy: &Entropy) -> f64 {
    1.0 - entropy.unit()
}

fn standard_normal(entropy: &Entropy) -> f64 {
    let u1 = unit_open(entropy);
    let u2 = entropy.unit();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Geometric distribution: the number of failures before the first success of
/// a Bernoulli trial with probability `p`, via inverse-CDF sampling.
pub fn geometric(p: f64) -> Result<Generator<u64>, Error> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) || p == 0.0 {
        return Err(Error::parameter("geometric", "p must lie within (0, 1]"));
    }
    Ok(Generator::new(move |entropy, _scale| {
        if p >= 1.0 {
            return Ok(Tree::leaf(0));
        }
        let u = unit_open(entropy);
        let failures = (u.ln() / (1.0 - p).ln()).floor();
        Ok(Tree::leaf(failures.max(0.0) as u64))
    }))
}

/// Normal distribution via the Box–Muller transform.
pub fn normal(mean: f64, std_dev: f64) -> Result<Generator<f64>, Error> {
    if !mean.is_finite() {
        return Err(Error::parameter("normal", "mean must be finite"));
    }
    if !std_dev.is_finite() || std_dev < 0.0 {
        return Err(Error::parameter(
            "normal",
            "standard deviation must be finite and non-negative",
        ));
    }
    Ok(Generator::new(move |entropy, _scale| {
        Ok(Tree::leaf(mean + std_dev * standard_normal(entropy)))
    }))
}

/// Exponential distribution with the given rate, via inverse-CDF sampling.
pub fn exponential(rate: f64) -> Result<Generator<f64>, Error> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(Error::parameter("exponential", "rate must be positive"));
    }
    Ok(Generator::new(move |entropy, _scale| {
        Ok(Tree::leaf(-unit_open(entropy).ln() / rate))
    }))
}

/// Gamma distribution with the given shape and rate, via Marsaglia–Tsang
/// rejection sampling.
pub fn gamma(shape: f64, rate: f64) -> Result<Generator<f64>, Error> {
    if !shape.is_finite() || shape <= 0.0 {
        return Err(Error::parameter("gamma", "shape must be positive"));
    }
    if !rate.is_finite() || rate <= 0.0 {
        return Err(Error::parameter("gamma", "rate must be positive"));
    }
    Ok(Generator::new(move |entropy, _scale| {
        Ok(Tree::leaf(draw_gamma(entropy, shape) / rate))
    }))
}

fn draw_gamma(entropy: &Entropy, shape: f64) -> f64 {
    if shape < 1.0 {
        // Boost a draw from the shifted distribution back down.
        let boost = unit_open(entropy).powf(1.0 / shape);
        return draw_gamma(entropy, shape + 1.0) * boost;
    }
    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let x = standard_normal(entropy);
        let v = (1.0 + c * x).powi(3);
        if v <= 0.0 {
            continue;
        }
        let u = unit_open(entropy);
        if u < 1.0 - 0.0331 * x.powi(4) {
            return d * v;
        }
        if u.ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}

/// Beta distribution as a ratio of two gamma draws.
pub fn beta(alpha: f64, beta: f64) -> Result<Generator<f64>, Error> {
    if !alpha.is_finite() || alpha <= 0.0 || !beta.is_finite() || beta <= 0.0 {
        return Err(Error::parameter("beta", "both shape parameters must be positive"));
    }
    Ok(Generator::new(move |entropy, _scale| {
        let x = draw_gamma(entropy, alpha);
        let y = draw_gamma(entropy, beta);
        Ok(Tree::leaf(x / (x + y)))
    }))
}

fn char_range(lo: char, hi: char) -> Generator<char> {
    bounded(Bounds::span(lo, hi))
}

fn char_union(ranges: &'static [(char, char)]) -> Generator<char> {
    let index = bounded::<i64>(Bounds::span(0, ranges.len() as i64 - 1));
    index.flat_map(move |i| {
        let (lo, hi) = ranges[*i as usize];
        char_range(lo, hi)
    })
}

/// Binary digits.
pub fn binit() -> Generator<char> {
    char_range('0', '1')
}

/// Octal digits.
pub fn octit() -> Generator<char> {
    char_range('0', '7')
}

/// Decimal digits.
pub fn digit() -> Generator<char> {
    char_range('0', '9')
}

/// Hexadecimal digits.
pub fn hexit() -> Generator<char> {
    char_union(&[('0', '9'), ('a', 'f')])
}

/// Lowercase ASCII letters.
pub fn lowercase() -> Generator<char> {
    char_range('a', 'z')
}

/// Uppercase ASCII letters.
pub fn uppercase() -> Generator<char> {
    char_range('A', 'Z')
}

/// ASCII letters of either case.
pub fn alpha() -> Generator<char> {
    char_union(&[('a', 'z'), ('A', 'Z')])
}

/// ASCII letters and digits.
pub fn alphanumeric() -> Generator<char> {
    char_union(&[('0', '9'), ('a', 'z'), ('A', 'Z')])
}

/// Printable ASCII characters.
pub fn ascii_printable() -> Generator<char> {
    char_range(' ', '~')
}

/// Arbitrary bytes.
pub fn byte() -> Generator<u8> {
    bounded(Bounds::span(0, 255))
}
