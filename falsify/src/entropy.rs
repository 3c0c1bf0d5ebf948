//! Seeded entropy source shared across a check run.

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The single pseudorandom stream a check run draws from.
///
/// Cloning an `Entropy` shares the underlying stream rather than forking it:
/// every consumer advances the same sequence, so a run is fully reproduced by
/// its seed as long as draws happen in the same order. Lazily-forced shrink
/// subtrees hold clones of this handle and draw when first traversed.
#[derive(Debug, Clone)]
pub struct Entropy {
    seed: u64,
    rng: Rc<RefCell<StdRng>>,
}

impl Entropy {
    /// Create an entropy source from an explicit seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: Rc::new(RefCell::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Create an entropy source from a fresh operating-system seed. The seed
    /// is drawn first so it can be reported for replay.
    pub fn from_os() -> Self {
        Self::from_seed(rand::random::<u64>())
    }

    /// The seed this stream was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A uniform draw from `[0, 1)`.
    pub fn unit(&self) -> f64 {
        self.rng.borrow_mut().gen_range(0.0..1.0)
    }

    /// A uniform integer draw from `lo..=hi`.
    pub fn i64_in(&self, lo: i64, hi: i64) -> i64 {
        if lo >= hi {
            return lo;
        }
        self.rng.borrow_mut().gen_range(lo..=hi)
    }

    /// A uniform float draw from `[lo, hi]`.
    pub fn f64_in(&self, lo: f64, hi: f64) -> f64 {
        if !(lo < hi) {
            return lo;
        }
        self.rng.borrow_mut().gen_range(lo..=hi)
    }

    /// A uniform index draw from `0..len`. `len` must be nonzero.
    pub fn index(&self, len: usize) -> usize {
        self.rng.borrow_mut().gen_range(0..len)
    }

    /// A fair coin flip.
    pub fn coin(&self) -> bool {
        self.unit() >= 0.5
    }
}
