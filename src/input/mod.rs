//! # Raw draw inputs
//!
//! Defines the container for sampler output: flat parameter names mapped to
//! one value per retained draw, optionally partitioned into chains.
//!
//! # Examples
//!
//! ```
//! use tidy_draws::RawDraws;
//!
//! let draws = RawDraws::new()
//!     .with_parameter("sigma", vec![1.0, 1.1, 0.9, 1.2])
//!     .with_parameter("b[1]", vec![0.1, 0.2, 0.3, 0.4])
//!     .with_chains(2);
//!
//! assert!(draws.validate().is_ok());
//! assert_eq!(draws.draw_count(), 4);
//! ```
//!
//! ```
//! use tidy_draws::RawDraws;
//!
//! let draws = RawDraws::new()
//!     .with_parameter("sigma", vec![1.0, 1.1, 0.9])
//!     .with_parameter("b[1]", vec![0.1, 0.2]);
//!
//! assert!(draws.validate().is_err());
//! ```

use std::collections::HashSet;

use faer::Mat;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use serde::Serialize;
use thiserror::Error;

pub mod predictive;

pub use predictive::{NewData, PredictiveSource, add_predictive_draws};

/// Errors returned when validating raw draw inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("parameter names must be non-empty")]
    EmptyName,
    #[error("parameter `{0}` appears more than once")]
    DuplicateName(String),
    #[error("parameter `{name}` has {found} draws; expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("chain count must be positive")]
    InvalidChainCount,
    #[error("{draws} draws cannot be split evenly into {chains} chains")]
    UnevenChains { draws: usize, chains: usize },
    #[error("{found} draw ids were supplied for {expected} draws")]
    DrawIdCountMismatch { expected: usize, found: usize },
    #[error("draw number {0} appears more than once")]
    DuplicateDrawId(usize),
    #[error("draw matrix has {cols} columns but {names} parameter names were supplied")]
    MatrixShape { names: usize, cols: usize },
    #[error("a subsample must keep at least one draw")]
    EmptySubsample,
    #[error("column `{name}` has {found} rows; expected {expected}")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Identity of one retained draw.
///
/// `chain` and `iteration` are 1-based and `iteration` restarts in every chain.
/// `draw` is 1-based and unique across chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DrawId {
    pub chain: usize,
    pub iteration: usize,
    pub draw: usize,
}

impl DrawId {
    #[must_use]
    pub const fn new(chain: usize, iteration: usize, draw: usize) -> Self {
        Self {
            chain,
            iteration,
            draw,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum DrawLayout {
    #[default]
    SingleChain,
    EvenChains(usize),
    Explicit(Vec<DrawId>),
}

/// Flat parameter names mapped to their draws.
///
/// Values are stored chain by chain: with `with_chains(2)` and 1000 draws, the
/// first 500 positions belong to chain 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDraws {
    names: Vec<String>,
    values: Vec<Vec<f64>>,
    layout: DrawLayout,
}

impl RawDraws {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.push(name, values);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.names.push(name.into());
        self.values.push(values);
    }

    /// Split the draws evenly into `chains` consecutive chains.
    #[must_use]
    pub fn with_chains(self, chains: usize) -> Self {
        Self {
            layout: DrawLayout::EvenChains(chains),
            ..self
        }
    }

    /// Attach explicit draw identities, one per position.
    #[must_use]
    pub fn with_draw_ids(self, draw_ids: Vec<DrawId>) -> Self {
        Self {
            layout: DrawLayout::Explicit(draw_ids),
            ..self
        }
    }

    /// Build from a draws-by-parameters matrix (one row per draw).
    ///
    /// # Errors
    ///
    /// Returns `InputError::MatrixShape` if the name count differs from the column count.
    pub fn from_matrix<S: AsRef<str>>(names: &[S], draws: &Mat<f64>) -> Result<Self, InputError> {
        if names.len() != draws.ncols() {
            return Err(InputError::MatrixShape {
                names: names.len(),
                cols: draws.ncols(),
            });
        }
        let mut raw = Self::new();
        for (col, name) in names.iter().enumerate() {
            raw.push(
                name.as_ref(),
                (0..draws.nrows()).map(|row| draws[(row, col)]).collect(),
            );
        }
        Ok(raw)
    }

    /// Number of parameters.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of draws per parameter.
    #[must_use]
    pub fn draw_count(&self) -> usize {
        match (&self.layout, self.values.first()) {
            (_, Some(values)) => values.len(),
            (DrawLayout::Explicit(ids), None) => ids.len(),
            (_, None) => 0,
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|idx| self.values[idx].as_slice())
    }

    /// Parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    /// Validate names, draw counts, and chain layout.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if parameters or draw identities are inconsistent.
    pub fn validate(&self) -> Result<(), InputError> {
        let expected = self.draw_count();
        let mut seen = HashSet::with_capacity(self.names.len());
        for (name, values) in self.iter() {
            if name.is_empty() {
                return Err(InputError::EmptyName);
            }
            if !seen.insert(name) {
                return Err(InputError::DuplicateName(name.to_string()));
            }
            if values.len() != expected {
                return Err(InputError::LengthMismatch {
                    name: name.to_string(),
                    expected,
                    found: values.len(),
                });
            }
        }

        match &self.layout {
            DrawLayout::SingleChain => {}
            DrawLayout::EvenChains(0) => return Err(InputError::InvalidChainCount),
            DrawLayout::EvenChains(chains) => {
                if expected % chains != 0 {
                    return Err(InputError::UnevenChains {
                        draws: expected,
                        chains: *chains,
                    });
                }
            }
            DrawLayout::Explicit(ids) => {
                if ids.len() != expected {
                    return Err(InputError::DrawIdCountMismatch {
                        expected,
                        found: ids.len(),
                    });
                }
                let mut numbers = HashSet::with_capacity(ids.len());
                if let Some(id) = ids.iter().find(|id| !numbers.insert(id.draw)) {
                    return Err(InputError::DuplicateDrawId(id.draw));
                }
            }
        }
        Ok(())
    }

    /// Draw identities for every position.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if the input fails validation.
    pub fn draw_ids(&self) -> Result<Vec<DrawId>, InputError> {
        self.validate()?;
        let count = self.draw_count();
        let ids = match &self.layout {
            DrawLayout::SingleChain => (0..count)
                .map(|idx| DrawId::new(1, idx + 1, idx + 1))
                .collect(),
            DrawLayout::EvenChains(chains) => {
                let per_chain = count / chains;
                (0..count)
                    .map(|idx| DrawId::new(idx / per_chain + 1, idx % per_chain + 1, idx + 1))
                    .collect()
            }
            DrawLayout::Explicit(ids) => ids.clone(),
        };
        Ok(ids)
    }

    /// Keep a seeded random subset of `ndraws` draws without replacement.
    ///
    /// Retained draws keep their original identities and relative order. Asking
    /// for at least as many draws as exist returns every draw.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if the input is invalid or `ndraws` is zero.
    pub fn subsample(&self, ndraws: usize, seed: u64) -> Result<Self, InputError> {
        if ndraws == 0 {
            return Err(InputError::EmptySubsample);
        }
        let ids = self.draw_ids()?;
        let total = ids.len();
        if ndraws >= total {
            return Ok(self.clone());
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut positions: Vec<usize> = (0..total).collect();
        for idx in 0..ndraws {
            let pick = rng.random_range(idx..total);
            positions.swap(idx, pick);
        }
        positions.truncate(ndraws);
        positions.sort_unstable();

        Ok(Self {
            names: self.names.clone(),
            values: self
                .values
                .iter()
                .map(|values| positions.iter().map(|&pos| values[pos]).collect())
                .collect(),
            layout: DrawLayout::Explicit(positions.iter().map(|&pos| ids[pos]).collect()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx_to_f64(idx: usize) -> f64 {
        f64::from(u32::try_from(idx).unwrap_or(u32::MAX))
    }

    fn sample_draws() -> RawDraws {
        RawDraws::new()
            .with_parameter("mu", vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])
            .with_parameter("sigma", vec![1.0, 1.5, 2.0, 2.5, 3.0, 3.5])
    }

    #[test]
    fn validate_rejects_length_mismatch() {
        let draws = sample_draws().with_parameter("tau", vec![1.0]);
        let err = draws.validate().expect_err("short parameter should fail");
        assert_eq!(
            err,
            InputError::LengthMismatch {
                name: "tau".to_string(),
                expected: 6,
                found: 1,
            }
        );
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let draws = sample_draws().with_parameter("mu", vec![0.0; 6]);
        let err = draws.validate().expect_err("duplicate name should fail");
        assert_eq!(err, InputError::DuplicateName("mu".to_string()));
    }

    #[test]
    fn validate_rejects_empty_name() {
        let draws = sample_draws().with_parameter("", vec![0.0; 6]);
        assert_eq!(draws.validate(), Err(InputError::EmptyName));
    }

    #[test]
    fn validate_rejects_uneven_chains() {
        let draws = sample_draws().with_chains(4);
        let err = draws.validate().expect_err("uneven chains should fail");
        assert_eq!(err, InputError::UnevenChains { draws: 6, chains: 4 });
        assert_eq!(
            sample_draws().with_chains(0).validate(),
            Err(InputError::InvalidChainCount)
        );
    }

    #[test]
    fn validate_rejects_duplicate_draw_numbers() {
        let ids = (0..6).map(|idx| DrawId::new(1, idx + 1, idx.min(4) + 1)).collect();
        let err = sample_draws()
            .with_draw_ids(ids)
            .validate()
            .expect_err("repeated draw number should fail");
        assert_eq!(err, InputError::DuplicateDrawId(5));
    }

    #[test]
    fn draw_ids_split_chains_consecutively() {
        let ids = sample_draws().with_chains(2).draw_ids().expect("valid draws");
        assert_eq!(ids[0], DrawId::new(1, 1, 1));
        assert_eq!(ids[2], DrawId::new(1, 3, 3));
        assert_eq!(ids[3], DrawId::new(2, 1, 4));
        assert_eq!(ids[5], DrawId::new(2, 3, 6));
    }

    #[test]
    fn from_matrix_reads_one_parameter_per_column() {
        let matrix = Mat::from_fn(3, 2, |row, col| {
            let sign = if col == 0 { 1.0 } else { -1.0 };
            sign * idx_to_f64(row)
        });
        let draws = RawDraws::from_matrix(&["a", "b[1]"], &matrix).expect("shape matches");
        assert_eq!(draws.len(), 2);
        assert_eq!(draws.get("b[1]"), Some(&[0.0, -1.0, -2.0][..]));

        let err = RawDraws::from_matrix(&["a"], &matrix).expect_err("shape mismatch");
        assert_eq!(err, InputError::MatrixShape { names: 1, cols: 2 });
    }

    #[test]
    fn subsample_is_seeded_and_keeps_draw_identity() {
        let draws = sample_draws().with_chains(2);
        let first = draws.subsample(3, 7).expect("subsample");
        let second = draws.subsample(3, 7).expect("subsample");
        assert_eq!(first, second);
        assert_eq!(first.draw_count(), 3);

        let ids = first.draw_ids().expect("valid ids");
        let mu = first.get("mu").expect("mu kept");
        for (id, value) in ids.iter().zip(mu) {
            assert!((*value - (idx_to_f64(id.draw) - 1.0)).abs() < 1e-12);
        }
        assert!(ids.windows(2).all(|pair| pair[0].draw < pair[1].draw));
    }

    #[test]
    fn subsample_returns_everything_when_asking_for_more() {
        let draws = sample_draws();
        assert_eq!(draws.subsample(100, 1).expect("subsample"), draws);
        assert_eq!(draws.subsample(0, 1), Err(InputError::EmptySubsample));
    }
}
