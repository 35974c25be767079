//! Gaussian kernel density estimate used to locate the posterior mode.

use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

use crate::error::TidyError;
use crate::utils::{quantile, usize_to_f64};

/// Kernels farther than this many bandwidths from a grid point are ignored.
const KERNEL_REACH: f64 = 8.0;

/// Bandwidth selection for the kernel density estimate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Bandwidth {
    /// `0.9 * min(sd, IQR / 1.34) * n^(-1/5)`.
    #[default]
    Silverman,
    /// `1.06 * sd * n^(-1/5)`.
    Scott,
    /// A fixed bandwidth on the scale of the draws.
    Fixed(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityOptions {
    pub bandwidth: Bandwidth,
    /// Number of evenly spaced points between the smallest and largest draw.
    pub grid_points: usize,
}

impl Default for DensityOptions {
    fn default() -> Self {
        Self {
            bandwidth: Bandwidth::Silverman,
            grid_points: 512,
        }
    }
}

impl DensityOptions {
    /// # Errors
    ///
    /// Returns `TidyError::InvalidOptions` for a non-positive fixed bandwidth or
    /// fewer than two grid points.
    pub fn validate(&self) -> Result<(), TidyError> {
        if self.grid_points < 2 {
            return Err(TidyError::InvalidOptions(
                "density grid needs at least two points".to_string(),
            ));
        }
        if let Bandwidth::Fixed(width) = self.bandwidth
            && !(width.is_finite() && width > 0.0)
        {
            return Err(TidyError::InvalidOptions(format!(
                "fixed bandwidth must be positive and finite; got {width}"
            )));
        }
        Ok(())
    }
}

/// Bandwidth for `sorted` under `rule`.
#[must_use]
pub fn bandwidth(sorted: &[f64], rule: Bandwidth) -> f64 {
    let scale = usize_to_f64(sorted.len()).powf(-0.2);
    match rule {
        Bandwidth::Fixed(width) => width,
        Bandwidth::Scott => 1.06 * sorted.iter().std_dev() * scale,
        Bandwidth::Silverman => {
            let sd = sorted.iter().std_dev();
            let iqr = (quantile(sorted, 0.75) - quantile(sorted, 0.25)) / 1.34;
            let spread = if iqr > 0.0 { sd.min(iqr) } else { sd };
            0.9 * spread * scale
        }
    }
}

/// Location of the highest point of the kernel density estimate over `sorted` draws.
///
/// Draws without spread return their common value.
///
/// # Errors
///
/// Returns `TidyError::InsufficientSamples` for an empty slice.
pub fn density_mode(sorted: &[f64], options: &DensityOptions) -> Result<f64, TidyError> {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Err(TidyError::InsufficientSamples {
            target: "mode".to_string(),
            group: String::new(),
            found: 0,
            minimum: 1,
        });
    };
    if max <= min {
        return Ok(min);
    }

    let width = bandwidth(sorted, options.bandwidth);
    if !(width.is_finite() && width > 0.0) {
        return Ok(quantile(sorted, 0.5));
    }
    let kernel = Normal::new(0.0, 1.0).map_err(|err| TidyError::InvalidOptions(err.to_string()))?;

    let steps = options.grid_points - 1;
    let step = (max - min) / usize_to_f64(steps);
    let mut best = (min, f64::NEG_INFINITY);
    for idx in 0..=steps {
        let x = usize_to_f64(idx).mul_add(step, min);
        let start = sorted.partition_point(|value| *value < KERNEL_REACH.mul_add(-width, x));
        let end = sorted.partition_point(|value| *value <= KERNEL_REACH.mul_add(width, x));
        let density: f64 = sorted[start..end]
            .iter()
            .map(|value| kernel.pdf((x - value) / width))
            .sum();
        if density > best.1 {
            best = (x, density);
        }
    }
    Ok(best.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use statrs::distribution::ContinuousCDF;

    fn skewed_draws() -> Vec<f64> {
        let mut draws: Vec<f64> = (0..400)
            .map(|idx| {
                let u = (usize_to_f64(idx) + 0.5) / 400.0;
                -(1.0 - u).ln()
            })
            .collect();
        draws.sort_by(f64::total_cmp);
        draws
    }

    #[test]
    fn mode_of_exponential_draws_is_near_zero() {
        let draws = skewed_draws();
        let mode = density_mode(&draws, &DensityOptions::default()).expect("mode");
        let mean = draws.iter().sum::<f64>() / usize_to_f64(draws.len());
        assert!(mode < 0.5, "mode {mode}");
        assert!(mode < mean);
    }

    #[test]
    fn mode_of_symmetric_draws_is_central() {
        let normal = Normal::new(0.0, 1.0).expect("standard normal");
        let draws: Vec<f64> = (0..401)
            .map(|idx| normal.inverse_cdf((usize_to_f64(idx) + 0.5) / 401.0))
            .collect();
        let mode = density_mode(&draws, &DensityOptions::default()).expect("mode");
        assert!(mode.abs() < 0.1, "mode {mode}");
    }

    #[test]
    fn constant_draws_return_their_value() {
        let mode = density_mode(&[2.5, 2.5, 2.5], &DensityOptions::default()).expect("mode");
        assert_relative_eq!(mode, 2.5);
        assert!(density_mode(&[], &DensityOptions::default()).is_err());
    }

    #[test]
    fn bandwidth_rules_scale_with_spread() {
        let draws: Vec<f64> = (0..100).map(usize_to_f64).collect();
        let silverman = bandwidth(&draws, Bandwidth::Silverman);
        let scott = bandwidth(&draws, Bandwidth::Scott);
        assert!(silverman > 0.0 && scott > silverman);
        assert_relative_eq!(bandwidth(&draws, Bandwidth::Fixed(0.3)), 0.3);
    }

    #[test]
    fn validate_rejects_bad_density_options() {
        let bad_width = DensityOptions {
            bandwidth: Bandwidth::Fixed(0.0),
            ..DensityOptions::default()
        };
        assert!(bad_width.validate().is_err());
        let bad_grid = DensityOptions {
            grid_points: 1,
            ..DensityOptions::default()
        };
        assert!(bad_grid.validate().is_err());
        assert!(DensityOptions::default().validate().is_ok());
    }
}
