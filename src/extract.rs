//! Selection of raw parameters matching a set of specifications.

use crate::error::TidyError;
use crate::input::{DrawId, RawDraws};
use crate::parse::{IndexBinding, ParamSpec, ParseOptions};

/// One raw parameter bound to a specification, borrowing its draws.
#[derive(Debug, Clone)]
pub struct ParameterMatch<'a> {
    pub binding: IndexBinding,
    pub values: &'a [f64],
}

/// Every raw parameter matched by one specification, in raw-name order.
#[derive(Debug, Clone)]
pub struct SpecMatches<'a> {
    pub spec: ParamSpec,
    pub matches: Vec<ParameterMatch<'a>>,
}

/// Result of matching all specifications against one set of raw draws.
#[derive(Debug, Clone)]
pub struct Extraction<'a> {
    pub draw_ids: Vec<DrawId>,
    pub specs: Vec<SpecMatches<'a>>,
}

impl Extraction<'_> {
    /// Distinct index-column names in order of first introduction, left to right.
    #[must_use]
    pub fn index_universe(&self) -> Vec<String> {
        let mut universe: Vec<String> = Vec::new();
        for spec in &self.specs {
            for column in spec.spec.index_columns() {
                if !universe.iter().any(|seen| seen == column) {
                    universe.push(column.to_string());
                }
            }
        }
        universe
    }
}

/// Match every specification against every raw parameter name.
///
/// # Errors
///
/// Returns `TidyError::NoMatchingParameter` if any specification matches nothing,
/// `TidyError::IndexArityMismatch` if a matching name has the wrong number of
/// indices, `TidyError::EmptyIndexValue` if one of its index values is empty, or
/// an input error if the draws are malformed.
pub fn extract<'a>(
    raw: &'a RawDraws,
    specs: &[ParamSpec],
    options: &ParseOptions,
) -> Result<Extraction<'a>, TidyError> {
    options.validate()?;
    let draw_ids = raw.draw_ids()?;

    let specs = specs
        .iter()
        .map(|spec| {
            let mut matches = Vec::new();
            for (name, values) in raw.iter() {
                if let Some(binding) = spec.bind(name, options)? {
                    matches.push(ParameterMatch { binding, values });
                }
            }
            if matches.is_empty() {
                return Err(TidyError::NoMatchingParameter {
                    spec: spec.to_string(),
                });
            }
            log::debug!("specification `{spec}` matched {} parameters", matches.len());
            Ok(SpecMatches {
                spec: spec.clone(),
                matches,
            })
        })
        .collect::<Result<Vec<_>, TidyError>>()?;

    Ok(Extraction { draw_ids, specs })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draws() -> RawDraws {
        RawDraws::new()
            .with_parameter("b_Intercept", vec![0.1, 0.2])
            .with_parameter("r_condition[A,Intercept]", vec![1.0, 1.1])
            .with_parameter("r_condition[B,Intercept]", vec![2.0, 2.1])
            .with_parameter("sigma", vec![0.5, 0.6])
    }

    #[test]
    fn extract_keeps_matches_in_raw_order() {
        let raw = sample_draws();
        let specs = ParamSpec::parse_all(&["r_condition[condition,term]", "sigma"]).expect("specs");
        let extraction = extract(&raw, &specs, &ParseOptions::default()).expect("extract");

        assert_eq!(extraction.draw_ids.len(), 2);
        assert_eq!(extraction.specs.len(), 2);
        let conditions: Vec<_> = extraction.specs[0]
            .matches
            .iter()
            .map(|m| m.binding.get("condition").unwrap_or_default())
            .collect();
        assert_eq!(conditions, vec!["A", "B"]);
        assert_eq!(extraction.specs[1].matches[0].values, &[0.5, 0.6]);
        assert_eq!(extraction.index_universe(), vec!["condition", "term"]);
    }

    #[test]
    fn extract_rejects_specification_without_match() {
        let raw = sample_draws();
        let specs = ParamSpec::parse_all(&["sigma", "sgima"]).expect("specs");
        let err = extract(&raw, &specs, &ParseOptions::default()).expect_err("typo");
        assert_eq!(
            err,
            TidyError::NoMatchingParameter {
                spec: "sgima".to_string()
            }
        );
    }

    #[test]
    fn extract_propagates_arity_errors() {
        let raw = sample_draws();
        let specs = ParamSpec::parse_all(&["r_condition[condition]"]).expect("specs");
        let err = extract(&raw, &specs, &ParseOptions::default()).expect_err("arity");
        assert!(matches!(err, TidyError::IndexArityMismatch { .. }));
    }

    #[test]
    fn extract_rejects_invalid_draws() {
        let raw = sample_draws().with_parameter("tau", vec![1.0]);
        let specs = ParamSpec::parse_all(&["sigma"]).expect("specs");
        let err = extract(&raw, &specs, &ParseOptions::default()).expect_err("bad input");
        assert!(matches!(err, TidyError::Input(_)));
    }
}
