#![allow(clippy::type_complexity)]

//! # Falsify - Property-Based Testing Engine
//!
//! Falsify checks properties against randomly sampled (or exhaustively
//! enumerated) inputs, searches for counterexamples, and when one is found
//! searches further for a simpler one by walking a lazy rose tree of shrink
//! candidates. It also supports statistical assertions over the distribution
//! of generated inputs via Wilson score intervals.
//!
//! ## Quick Start
//!
//! ```rust
//! use falsify::{Bounds, Checker, Config, integer, property};
//!
//! let numbers = integer(Bounds::linear(0..=1000).unwrap());
//! let config = Config::default().with_seed(42);
//! let report = Checker::new(config)
//!     .check(&numbers, property(|n: &i64| *n >= 0))
//!     .unwrap();
//! assert!(report.is_success());
//! ```
//!
//! A failed check is reported as a [`Report`] value carrying the shrunk
//! counterexample and the seed needed to replay the run; nothing about a
//! failing property is raised as an error. Only malformed configuration is.

pub mod bounds;
pub mod config;
pub mod control;
pub mod coverage;
pub mod engine;
pub mod entropy;
pub mod error;
pub mod generator;
pub mod primitives;
pub mod report;
pub mod tree;

pub use bounds::{Bounds, Coordinate, Numeric, Scale};
pub use config::Config;
pub use control::{Control, Counter};
pub use coverage::{Coverage, probit, wilson_bounds};
pub use engine::{Checker, Property, ValueProperty, check, check_with_config, property};
pub use entropy::Entropy;
pub use error::Error;
pub use generator::{Discarded, Generator};
pub use primitives::*;
pub use report::{Counterexample, Reason, Report, Verdict};
pub use tree::{LazySeq, Tree};
