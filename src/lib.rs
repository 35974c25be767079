#![forbid(unsafe_code)]

//! # `tidy_draws`
//!
//! Turns raw posterior draws keyed by flat parameter names such as `b[1,2]`
//! into tidy tables: one row per draw and index combination, with bracketed
//! indices recovered as named key columns.
//!
//! On top of those tables the crate computes grouped point estimates with
//! quantile or highest-density intervals, and per-draw comparisons between
//! the levels of a factor.
//!
//! ```
//! use tidy_draws::{ParamSpec, ParseOptions, RawDraws, SummaryOptions, spread_draws, summarize};
//!
//! let raw = RawDraws::new()
//!     .with_parameter("b[1]", vec![0.1, 0.2, 0.3])
//!     .with_parameter("b[2]", vec![1.1, 1.2, 1.3])
//!     .with_parameter("sigma", vec![1.0, 1.0, 1.0]);
//! let specs = ParamSpec::parse_all(&["b[group]", "sigma"]).unwrap();
//! let table = spread_draws(&raw, &specs, &ParseOptions::default()).unwrap();
//! assert_eq!(table.len(), 6);
//!
//! let summary = summarize(&table, &[], &["group"], &SummaryOptions::median_qi()).unwrap();
//! assert_eq!(summary.len(), 2);
//! ```

pub mod assemble;
pub mod compare;
pub mod error;
pub mod extract;
pub mod input;
pub mod parse;
pub mod summary;
pub mod table;
pub mod utils;

pub use assemble::{AssembleOptions, JoinPolicy, Layout, assemble, gather_draws, spread_draws};
pub use compare::{CompareOptions, Comparison, PairGenerator, compare_levels};
pub use error::TidyError;
pub use extract::{Extraction, extract};
pub use input::{DrawId, InputError, NewData, PredictiveSource, RawDraws, add_predictive_draws};
pub use parse::{IndexBinding, ParamSpec, ParseOptions};
pub use summary::{
    Bandwidth, DensityOptions, ErrorMode, Estimator, IntervalKind, PointInterval, SummaryOptions,
    SummaryRow, SummaryTable, Target, summarize, summarize_draws,
};
pub use table::{DrawTable, Row, render_table};
