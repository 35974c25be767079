//! Point estimates and interval bounds over sorted draws.

use super::density::{DensityOptions, density_mode};
use super::{Estimator, IntervalKind};
use crate::error::TidyError;
use crate::utils::{quantile, usize_to_f64, window_len};

/// Central tendency of `sorted` draws.
///
/// # Errors
///
/// Returns `TidyError::InsufficientSamples` for an empty slice.
pub fn point_estimate(
    sorted: &[f64],
    estimator: Estimator,
    density: &DensityOptions,
) -> Result<f64, TidyError> {
    if sorted.is_empty() {
        return Err(TidyError::InsufficientSamples {
            target: estimator.name().to_string(),
            group: String::new(),
            found: 0,
            minimum: 1,
        });
    }
    match estimator {
        Estimator::Mean => Ok(sorted.iter().sum::<f64>() / usize_to_f64(sorted.len())),
        Estimator::Median => Ok(quantile(sorted, 0.5)),
        Estimator::Mode => density_mode(sorted, density),
    }
}

/// Lower and upper bound covering probability mass `width`.
#[must_use]
pub fn interval_bounds(sorted: &[f64], kind: IntervalKind, width: f64) -> (f64, f64) {
    match kind {
        IntervalKind::Quantile => quantile_interval(sorted, width),
        IntervalKind::HighestDensity => highest_density_interval(sorted, width),
    }
}

/// Bounds at the `(1 - width) / 2` and `(1 + width) / 2` empirical quantiles.
#[must_use]
pub fn quantile_interval(sorted: &[f64], width: f64) -> (f64, f64) {
    (
        quantile(sorted, (1.0 - width) / 2.0),
        quantile(sorted, (1.0 + width) / 2.0),
    )
}

/// Narrowest window of `ceil(width * n)` consecutive sorted draws.
///
/// Ties go to the leftmost window. Multimodal draws still yield one contiguous interval.
#[must_use]
pub fn highest_density_interval(sorted: &[f64], width: f64) -> (f64, f64) {
    if sorted.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let window = window_len(width, sorted.len());
    let mut best = 0;
    let mut best_span = f64::INFINITY;
    for start in 0..=(sorted.len() - window) {
        let span = sorted[start + window - 1] - sorted[start];
        if span < best_span {
            best = start;
            best_span = span;
        }
    }
    (sorted[best], sorted[best + window - 1])
}
