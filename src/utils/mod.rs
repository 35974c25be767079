//! # Utilities
//!
//! Numeric conversions and order-statistic helpers shared by the summary code.

use num_traits::ToPrimitive;

#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    f64::from(u32::try_from(value).unwrap_or(u32::MAX))
}

/// Finite values of `values` in ascending order, plus the count of non-finite values dropped.
#[must_use]
pub fn sorted_finite(values: impl IntoIterator<Item = f64>) -> (Vec<f64>, usize) {
    let mut dropped = 0usize;
    let mut sorted: Vec<f64> = values
        .into_iter()
        .filter(|value| {
            let keep = value.is_finite();
            if !keep {
                dropped += 1;
            }
            keep
        })
        .collect();
    sorted.sort_by(f64::total_cmp);
    (sorted, dropped)
}

/// Empirical quantile with linear interpolation between order statistics.
///
/// Returns `NaN` for an empty slice.
#[must_use]
pub fn quantile(sorted_values: &[f64], probability: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }

    let clamped = probability.clamp(0.0, 1.0);
    let last = sorted_values.len() - 1;
    let position = clamped * usize_to_f64(last);
    let lower = position.floor().to_usize().unwrap_or(0).min(last);
    let upper = position.ceil().to_usize().unwrap_or(last).min(last);

    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = position - usize_to_f64(lower);
        (1.0 - weight).mul_add(sorted_values[lower], weight * sorted_values[upper])
    }
}

/// Number of sorted draws a window must hold to cover probability mass `width`.
#[must_use]
pub fn window_len(width: f64, n: usize) -> usize {
    // Guards 0.95 * 1000 from rounding up to 951.
    let raw = width.mul_add(usize_to_f64(n), -1.0e-9).ceil();
    raw.to_usize().unwrap_or(n).clamp(1, n.max(1))
}
