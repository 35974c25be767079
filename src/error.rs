//! Error taxonomy shared by the parsing, assembly, summary, and comparison steps.

use thiserror::Error;

use crate::input::InputError;

/// Errors returned by every fallible operation in the crate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TidyError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("invalid parameter specification `{spec}`: {reason}")]
    InvalidSpecification { spec: String, reason: &'static str },
    #[error("specification `{spec}` matched no parameter")]
    NoMatchingParameter { spec: String },
    #[error(
        "parameter `{name}` carries {found} indices but specification `{spec}` declares {expected}"
    )]
    IndexArityMismatch {
        spec: String,
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("parameter `{name}` has an empty index value at position {position}")]
    EmptyIndexValue { name: String, position: usize },
    #[error("mismatched index domain on `{column}`: {detail}")]
    MismatchedIndexDomain { column: String, detail: String },
    #[error(
        "`{target}` in group [{group}] has {found} usable draws; at least {minimum} are required"
    )]
    InsufficientSamples {
        target: String,
        group: String,
        found: usize,
        minimum: usize,
    },
    #[error("draw {draw} is present for level `{present}` but missing for level `{missing}`")]
    UnmatchedDraw {
        draw: usize,
        present: String,
        missing: String,
    },
    #[error("probability level {0} must lie in (0, 1]")]
    InvalidProbabilityLevel(f64),
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    #[error("level `{level}` does not occur in factor `{factor}`")]
    UnknownLevel { factor: String, level: String },
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("predictive draw source failed: {0}")]
    Source(String),
}
