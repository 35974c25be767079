//! Draws of derived quantities at new covariate values.
//!
//! A [`PredictiveSource`] stands in for a fitted model: given new data it
//! returns raw draws named `variable[i]`, one parameter per new-data row
//! (1-based). [`add_predictive_draws`] turns those into a tidy table keyed by
//! the new-data columns and `.row`.

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::{InputError, RawDraws};
use crate::assemble::spread_draws;
use crate::error::TidyError;
use crate::parse::{ParamSpec, ParseOptions};
use crate::table::{DrawTable, KeyColumn, ValueColumn};

/// Key column holding the 1-based new-data row of each prediction.
pub const ROW: &str = ".row";

/// Covariate values at which predictions are requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewData {
    columns: Vec<KeyColumn>,
}

impl NewData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_column<S: ToString>(mut self, name: impl Into<String>, values: &[S]) -> Self {
        self.columns.push(KeyColumn {
            name: name.into(),
            values: values.iter().map(ToString::to_string).collect(),
        });
        self
    }

    /// Number of rows (zero without columns).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, |column| column.values.len())
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.values.as_slice())
    }

    /// # Errors
    ///
    /// Returns `InputError` for empty or repeated column names and ragged columns.
    pub fn validate(&self) -> Result<(), InputError> {
        let expected = self.rows();
        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if column.name.is_empty() {
                return Err(InputError::EmptyName);
            }
            if !seen.insert(column.name.as_str()) {
                return Err(InputError::DuplicateName(column.name.clone()));
            }
            if column.values.len() != expected {
                return Err(InputError::ColumnLength {
                    name: column.name.clone(),
                    expected,
                    found: column.values.len(),
                });
            }
        }
        Ok(())
    }
}

/// Produces predictive draws for new data.
pub trait PredictiveSource {
    type Error: fmt::Display;

    /// Draws named `variable[i]` for each 1-based row `i` of `new_data`.
    ///
    /// `ndraws` requests a number of draws; sources may ignore it.
    ///
    /// # Errors
    ///
    /// Returns the source's own error type.
    fn draws(&self, new_data: &NewData, ndraws: Option<usize>) -> Result<RawDraws, Self::Error>;
}

impl<F, E> PredictiveSource for F
where
    F: Fn(&NewData, Option<usize>) -> Result<RawDraws, E>,
    E: fmt::Display,
{
    type Error = E;

    fn draws(&self, new_data: &NewData, ndraws: Option<usize>) -> Result<RawDraws, E> {
        self(new_data, ndraws)
    }
}

/// Ask `source` for draws of `variable` at `new_data` and tidy them.
///
/// Key columns are the new-data columns followed by `.row`; the single value
/// column is named `variable`.
///
/// # Errors
///
/// Returns `TidyError::Input` for invalid new data, `TidyError::Source` when the
/// source fails, `TidyError::NoMatchingParameter` when a new-data row has no
/// draws, and `TidyError::MismatchedIndexDomain` when the source returns rows
/// that do not exist in `new_data`.
pub fn add_predictive_draws<P: PredictiveSource + ?Sized>(
    new_data: &NewData,
    source: &P,
    variable: &str,
    ndraws: Option<usize>,
    options: &ParseOptions,
) -> Result<DrawTable, TidyError> {
    new_data.validate()?;
    if let Some(name) = new_data
        .column_names()
        .into_iter()
        .find(|name| *name == ROW || *name == variable)
    {
        return Err(TidyError::InvalidOptions(format!(
            "new data column `{name}` collides with an output column"
        )));
    }

    let raw = source
        .draws(new_data, ndraws)
        .map_err(|err| TidyError::Source(err.to_string()))?;
    let spec = ParamSpec::indexed(variable, [ROW]);
    let table = spread_draws(&raw, std::slice::from_ref(&spec), options)?;
    let (Some(row_labels), Some(values)) = (table.key(ROW), table.value(variable)) else {
        return Err(TidyError::UnknownColumn(ROW.to_string()));
    };

    let mut row_numbers = Vec::with_capacity(row_labels.len());
    let mut label_of_row: HashMap<usize, &str> = HashMap::with_capacity(new_data.rows());
    for label in row_labels {
        let row = label
            .parse::<usize>()
            .ok()
            .filter(|row| (1..=new_data.rows()).contains(row))
            .ok_or_else(|| TidyError::MismatchedIndexDomain {
                column: ROW.to_string(),
                detail: format!(
                    "`{variable}[{label}]` does not name one of the {} new data rows",
                    new_data.rows()
                ),
            })?;
        let seen = *label_of_row.entry(row).or_insert(label.as_str());
        if seen != label.as_str() {
            return Err(TidyError::MismatchedIndexDomain {
                column: ROW.to_string(),
                detail: format!(
                    "`{variable}[{seen}]` and `{variable}[{label}]` both name row {row}"
                ),
            });
        }
        row_numbers.push(row);
    }
    if let Some(missing) = (1..=new_data.rows()).find(|row| !label_of_row.contains_key(row)) {
        return Err(TidyError::NoMatchingParameter {
            spec: format!("{variable}[{missing}]"),
        });
    }
    log::debug!(
        "predictive draws for `{variable}`: {} rows x {} draws",
        new_data.rows(),
        raw.draw_count()
    );

    let mut keys: Vec<KeyColumn> = new_data
        .columns
        .iter()
        .map(|column| KeyColumn {
            name: column.name.clone(),
            values: row_numbers
                .iter()
                .map(|&row| column.values[row - 1].clone())
                .collect(),
        })
        .collect();
    keys.push(KeyColumn {
        name: ROW.to_string(),
        values: row_labels.to_vec(),
    });
    Ok(DrawTable::from_parts(
        table.draws().to_vec(),
        keys,
        vec![ValueColumn {
            name: variable.to_string(),
            values: values.to_vec(),
        }],
    ))
}
