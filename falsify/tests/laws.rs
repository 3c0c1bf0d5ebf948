//! Algebraic laws: tree construction, applicative composition, and numeric
//! shrink behavior.

use std::rc::Rc;

use falsify::{Bounds, Entropy, Generator, Scale, Tree, integer};

type F = Rc<dyn Fn(&i64) -> i64>;

fn root<A: Clone + 'static>(generator: &Generator<A>, seed: u64) -> A {
    let entropy = Entropy::from_seed(seed);
    generator
        .sample(&entropy, Scale::MAX)
        .expect("generator discarded")
        .value()
        .clone()
}

fn small_int() -> Generator<i64> {
    integer(Bounds::linear_around(-100..=100, 0).unwrap())
}

// A generator of functions that consumes entropy, so law tests also pin down
// the order the entropy stream is threaded in.
fn drawn_fn() -> Generator<F> {
    small_int().map(|n| {
        let n = *n;
        let f: F = Rc::new(move |x| x + n);
        f
    })
}

#[test]
fn tree_leaf_laws() {
    let t = Tree::leaf(5).map(|x| x + 1);
    assert_eq!(*t.value(), 6);
    assert!(t.children().is_empty());
}

#[test]
fn tree_unfold_laws() {
    let rule = |x: &i64| if *x > 0 { vec![x - 1] } else { vec![] };
    let t = Tree::unfold(3, rule);

    assert_eq!(*t.value(), 3);
    let child = t.children().get(0).unwrap();
    assert_eq!(child.values(), Tree::unfold(2, rule).values());
}

#[test]
fn applicative_identity() {
    let values = small_int();
    let id: F = Rc::new(|x| *x);
    let applied = values.ap(&Generator::pure(id));

    for seed in 0..10 {
        assert_eq!(root(&applied, seed), root(&values, seed));
    }
}

#[test]
fn applicative_homomorphism() {
    let f: F = Rc::new(|x| x * 3 + 1);
    let lhs = Generator::pure(7).ap(&Generator::pure(Rc::clone(&f)));
    let rhs = Generator::pure((*f)(&7));

    for seed in 0..5 {
        assert_eq!(root(&lhs, seed), root(&rhs, seed));
    }
}

#[test]
fn applicative_interchange() {
    let u = drawn_fn();
    let y = 11_i64;

    let lhs = Generator::pure(y).ap(&u);
    let apply_y: Rc<dyn Fn(&F) -> i64> = Rc::new(move |f| (**f)(&y));
    let rhs = u.ap(&Generator::pure(apply_y));

    for seed in 0..10 {
        assert_eq!(root(&lhs, seed), root(&rhs, seed));
    }
}

#[test]
fn applicative_composition() {
    let u = drawn_fn();
    let v = drawn_fn();
    let w = small_int();

    let compose: Rc<dyn Fn(&F) -> Rc<dyn Fn(&F) -> F>> = Rc::new(|f| {
        let f = Rc::clone(f);
        let partial: Rc<dyn Fn(&F) -> F> = Rc::new(move |g| {
            let f = Rc::clone(&f);
            let g = Rc::clone(g);
            let composed: F = Rc::new(move |x| (*f)(&(*g)(x)));
            composed
        });
        partial
    });

    let lhs = w.ap(&v.ap(&u.ap(&Generator::pure(compose))));
    let rhs = w.ap(&v).ap(&u);

    for seed in 0..10 {
        assert_eq!(root(&lhs, seed), root(&rhs, seed));
    }
}

#[test]
fn numeric_shrink_offers_the_origin_first() {
    let generator = integer(Bounds::linear_around(-500..=500, 7).unwrap());
    for seed in 0..20 {
        let entropy = Entropy::from_seed(seed);
        let tree = generator.sample(&entropy, Scale::MAX).unwrap();
        if *tree.value() == 7 {
            assert!(tree.children().is_empty());
        } else {
            assert_eq!(*tree.children().get(0).unwrap().value(), 7);
        }
    }
}

#[test]
fn numeric_shrink_candidates_lie_between_origin_and_value() {
    let generator = integer(Bounds::linear_around(-500..=500, 0).unwrap());
    for seed in 0..20 {
        let entropy = Entropy::from_seed(seed);
        let tree = generator.sample(&entropy, Scale::MAX).unwrap();
        let value = *tree.value();
        let (lo, hi) = if value < 0 { (value, 0) } else { (0, value) };
        for child in tree.children().iter() {
            let shrunk = *child.value();
            assert!(shrunk >= lo && shrunk <= hi);
            // One level deeper the same invariant holds around each child.
            for grandchild in child.children().iter() {
                let deeper = *grandchild.value();
                assert!(deeper >= lo && deeper <= hi);
            }
        }
    }
}

#[test]
fn numeric_shrink_reaches_the_origin_in_logarithmic_candidates() {
    let generator = integer(Bounds::linear_around(0..=100_000, 0).unwrap());
    let entropy = Entropy::from_seed(3);
    let tree = generator.sample(&entropy, Scale::MAX).unwrap();

    // Each node offers the origin plus one candidate per halving of the
    // remaining delta, so no candidate list outgrows the bit width.
    let mut node = tree.clone();
    for _ in 0..4 {
        let children: Vec<Tree<i64>> = node.children().iter().collect();
        assert!(children.len() <= 65);
        match children.first() {
            None => break,
            Some(first) => {
                // The origin is reachable in a single step from every node.
                assert_eq!(*first.value(), 0);
                // Descend into the candidate closest to the current value.
                node = children.last().unwrap().clone();
            }
        }
    }
}

#[test]
fn same_seed_reproduces_the_sampled_sequence() {
    let generator = integer(Bounds::linear_around(-1000..=1000, 0).unwrap());

    let sample_run = || -> Vec<i64> {
        let entropy = Entropy::from_seed(1234);
        (0..50)
            .map(|k| {
                *generator
                    .sample(&entropy, Scale::new((k % 100) as u8))
                    .unwrap()
                    .value()
            })
            .collect()
    };

    assert_eq!(sample_run(), sample_run());
}
