//! Predstat – statistics over the results of running several solving backends
//! on a database of predicates.
//!
//! Every predicate (a logical formula) in the database is handed to a number
//! of independent solving engines, the *backends*. Each backend produces an
//! [`construct::Answer`] (valid, invalid, unknown, timeout, error) together
//! with the time it took. This crate folds an arbitrarily large stream of such
//! records into one queryable report:
//! * how many predicates ended with which best answer,
//! * which predicates got contradicting answers (valid from one backend, invalid from another),
//! * how often each combination of backends agreed on an answer,
//! * runtime distributions per answer and backend (min, max, mean, median, quartiles),
//! * how often each backend was the fastest.
//!
//! ## Modules
//! * [`construct`] – Value types: [`construct::Answer`], [`construct::Backend`],
//!   [`construct::TimedAnswer`] and [`construct::Sample`].
//! * [`datatype`] – The [`datatype::Numeric`] trait for values a regression can hold.
//! * [`classification`] – Multi-label occurrence counting.
//! * [`regression`] – Streaming min/max/mean with lazily sorted order statistics.
//! * [`analysis`] – [`analysis::PredDbAnalysis`], the report composing the two.
//! * [`interface`] – Sequential and parallel drivers building reports from partitions.
//! * [`config`] – Driver settings from defaults, file and environment.
//!
//! ## Merging
//! Reports built from disjoint partitions of the input can be merged in any
//! order and grouping; the result equals the report over the whole input.
//! Merging is additive, so merging a partition twice counts it twice.
//!
//! ## Quick Start
//! ```
//! use std::time::Duration;
//! use predstat::construct::{Answer, Backend, Sample, TimedAnswer};
//! use predstat::interface::analyse;
//!
//! let z3 = Backend::new("z3");
//! let cvc5 = Backend::new("cvc5");
//! let sample = Sample::new("(forall ((x Int)) (>= (* x x) 0))")
//!     .with_result(z3.clone(), TimedAnswer::new(Answer::Valid, Duration::from_nanos(100)))
//!     .with_result(cvc5.clone(), TimedAnswer::new(Answer::Unknown, Duration::from_nanos(200)));
//! let report = analyse(vec![sample]);
//! assert_eq!(report.get_pred_count_with(Answer::Valid), 1);
//! assert_eq!(report.get_fastest_answer_count(&z3), 1);
//! ```
//!
//! Reading samples from any on-disk format, and formatting reports, is left to
//! the caller.

pub mod analysis;
pub mod classification;
pub mod config;
pub mod construct;
pub mod datatype;
pub mod error;
pub mod interface;
pub mod regression;

pub use analysis::PredDbAnalysis;
pub use config::AnalysisConfig;
pub use error::{PredstatError, Result};
