//! # Point-interval summaries
//!
//! Reduces each group of draws to a point estimate plus one interval per probability level.
//!
//! ```
//! use tidy_draws::input::RawDraws;
//! use tidy_draws::parse::{ParamSpec, ParseOptions};
//! use tidy_draws::summary::{SummaryOptions, Target, summarize};
//! use tidy_draws::assemble::spread_draws;
//!
//! let raw = RawDraws::new().with_parameter("mu", vec![0.5, 1.0, 1.5, 2.0]);
//! let specs = [ParamSpec::scalar("mu")];
//! let table = spread_draws(&raw, &specs, &ParseOptions::default()).unwrap();
//! let targets = [Target::column("mu")];
//! let summary = summarize(&table, &targets, &[], &SummaryOptions::mean_qi()).unwrap();
//! assert_eq!(summary.len(), 1);
//! assert!((summary.numeric("estimate").unwrap()[0] - 1.25).abs() < 1e-12);
//! ```

use std::fmt;
use std::sync::Arc;

use comfy_table::Cell;
use rayon::prelude::*;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::TidyError;
use crate::table::render::{make_table, number_cell, value_cell};
use crate::table::{DrawTable, Row, RowGroup};
use crate::utils::{sorted_finite, usize_to_f64};

pub mod density;
pub mod interval;

pub use density::{Bandwidth, DensityOptions};
pub use interval::{highest_density_interval, interval_bounds, point_estimate, quantile_interval};

pub const ESTIMATE: &str = "estimate";
pub const LOWER: &str = ".lower";
pub const UPPER: &str = ".upper";
pub const WIDTH: &str = ".width";
pub const POINT: &str = ".point";
pub const INTERVAL: &str = ".interval";
pub const DROPPED: &str = ".dropped";

const MIN_DRAWS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Estimator {
    #[default]
    Mean,
    Median,
    Mode,
}

impl Estimator {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum IntervalKind {
    /// Central interval between symmetric empirical quantiles.
    #[default]
    #[serde(rename = "qi")]
    Quantile,
    /// Narrowest interval holding the requested mass.
    #[serde(rename = "hdi")]
    HighestDensity,
}

impl IntervalKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Quantile => "qi",
            Self::HighestDensity => "hdi",
        }
    }
}

/// What happens when one group cannot be summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// The first failing group (in group order) fails the whole call.
    #[default]
    AllOrNothing,
    /// Failing groups are left out and listed in [`SummaryTable::skipped`].
    SkipFailedGroups,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOptions {
    pub estimator: Estimator,
    pub interval: IntervalKind,
    /// Interval widths, one output row per level in this order.
    pub probability_levels: Vec<f64>,
    pub density: DensityOptions,
    pub error_mode: ErrorMode,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            estimator: Estimator::Mean,
            interval: IntervalKind::Quantile,
            probability_levels: vec![0.95],
            density: DensityOptions::default(),
            error_mode: ErrorMode::AllOrNothing,
        }
    }
}

impl SummaryOptions {
    fn with_kinds(estimator: Estimator, interval: IntervalKind) -> Self {
        Self {
            estimator,
            interval,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn mean_qi() -> Self {
        Self::with_kinds(Estimator::Mean, IntervalKind::Quantile)
    }

    #[must_use]
    pub fn median_qi() -> Self {
        Self::with_kinds(Estimator::Median, IntervalKind::Quantile)
    }

    #[must_use]
    pub fn mode_qi() -> Self {
        Self::with_kinds(Estimator::Mode, IntervalKind::Quantile)
    }

    #[must_use]
    pub fn mean_hdi() -> Self {
        Self::with_kinds(Estimator::Mean, IntervalKind::HighestDensity)
    }

    #[must_use]
    pub fn median_hdi() -> Self {
        Self::with_kinds(Estimator::Median, IntervalKind::HighestDensity)
    }

    #[must_use]
    pub fn mode_hdi() -> Self {
        Self::with_kinds(Estimator::Mode, IntervalKind::HighestDensity)
    }

    #[must_use]
    pub fn with_levels(mut self, levels: impl Into<Vec<f64>>) -> Self {
        self.probability_levels = levels.into();
        self
    }

    #[must_use]
    pub const fn with_error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.error_mode = error_mode;
        self
    }

    /// # Errors
    ///
    /// Returns `TidyError::InvalidProbabilityLevel` for a level outside `(0, 1]`,
    /// or `TidyError::InvalidOptions` for an empty level list or bad density options.
    pub fn validate(&self) -> Result<(), TidyError> {
        if self.probability_levels.is_empty() {
            return Err(TidyError::InvalidOptions(
                "at least one probability level is required".to_string(),
            ));
        }
        if let Some(&level) = self
            .probability_levels
            .iter()
            .find(|level| !(level.is_finite() && **level > 0.0 && **level <= 1.0))
        {
            return Err(TidyError::InvalidProbabilityLevel(level));
        }
        self.density.validate()
    }
}

type RowExpression = Arc<dyn Fn(&Row<'_>) -> f64 + Send + Sync>;

#[derive(Clone)]
enum TargetSource {
    Column(String),
    Expression(RowExpression),
}

/// A quantity to summarize: a value column or an expression over each row.
#[derive(Clone)]
pub struct Target {
    name: String,
    source: TargetSource,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            TargetSource::Column(column) => column.as_str(),
            TargetSource::Expression(_) => "<expression>",
        };
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("source", &source)
            .finish()
    }
}

impl Target {
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source: TargetSource::Column(name.clone()),
            name,
        }
    }

    /// A derived quantity computed per row, e.g. `b + sigma`.
    #[must_use]
    pub fn expression(
        name: impl Into<String>,
        expression: impl Fn(&Row<'_>) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            source: TargetSource::Expression(Arc::new(expression)),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_column(&self) -> bool {
        matches!(self.source, TargetSource::Column(_))
    }

    fn check(&self, table: &DrawTable) -> Result<(), TidyError> {
        match &self.source {
            TargetSource::Column(column) if table.value(column).is_none() => {
                Err(TidyError::UnknownColumn(column.clone()))
            }
            _ => Ok(()),
        }
    }

    fn values(&self, table: &DrawTable, rows: &[usize]) -> Vec<f64> {
        match &self.source {
            TargetSource::Column(column) => table
                .value(column)
                .map(|values| rows.iter().map(|&idx| values[idx]).collect())
                .unwrap_or_default(),
            TargetSource::Expression(expression) => rows
                .iter()
                .filter_map(|&idx| table.row(idx))
                .map(|row| expression(&row))
                .collect(),
        }
    }
}

/// Estimate and bounds of one target at one probability level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointInterval {
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
    /// Non-finite draws excluded before summarizing.
    pub dropped: usize,
}

/// One group at one probability level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub group: Vec<String>,
    pub width: f64,
    pub point: Estimator,
    pub interval: IntervalKind,
    /// One entry per target, in target order.
    pub values: Vec<PointInterval>,
}

impl SummaryRow {
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.values.iter().map(|value| value.dropped).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedGroup {
    pub group: Vec<String>,
    pub error: TidyError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    group_columns: Vec<String>,
    targets: Vec<String>,
    /// A lone column target is reported under `estimate`, `.lower` and `.upper`.
    canonical: bool,
    rows: Vec<SummaryRow>,
    skipped: Vec<SkippedGroup>,
}

impl SummaryTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    #[must_use]
    pub fn skipped(&self) -> &[SkippedGroup] {
        &self.skipped
    }

    #[must_use]
    pub fn group_columns(&self) -> &[String] {
        &self.group_columns
    }

    #[must_use]
    pub fn target_names(&self) -> &[String] {
        &self.targets
    }

    /// Output column names in order: group columns, target columns, then metadata.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.group_columns.clone();
        for target in &self.targets {
            names.extend(self.target_columns(target));
        }
        names.extend([WIDTH, POINT, INTERVAL, DROPPED].map(str::to_string));
        names
    }

    /// A numeric output column by name (`estimate`, `.lower`, `.width`, `mu.upper`, ...).
    #[must_use]
    pub fn numeric(&self, name: &str) -> Option<Vec<f64>> {
        match name {
            WIDTH => return Some(self.rows.iter().map(|row| row.width).collect()),
            DROPPED => {
                return Some(
                    self.rows
                        .iter()
                        .map(|row| usize_to_f64(row.dropped()))
                        .collect(),
                );
            }
            _ => {}
        }
        for (position, target) in self.targets.iter().enumerate() {
            let [estimate, lower, upper] = self.target_columns(target);
            let pick: fn(&PointInterval) -> f64 = if name == estimate {
                |value| value.estimate
            } else if name == lower {
                |value| value.lower
            } else if name == upper {
                |value| value.upper
            } else {
                continue;
            };
            return Some(
                self.rows
                    .iter()
                    .map(|row| pick(&row.values[position]))
                    .collect(),
            );
        }
        None
    }

    /// A text output column by name: a group column, `.point`, or `.interval`.
    #[must_use]
    pub fn key(&self, name: &str) -> Option<Vec<&str>> {
        match name {
            POINT => Some(self.rows.iter().map(|row| row.point.name()).collect()),
            INTERVAL => Some(self.rows.iter().map(|row| row.interval.name()).collect()),
            _ => {
                let position = self.group_columns.iter().position(|column| column == name)?;
                Some(
                    self.rows
                        .iter()
                        .map(|row| row.group[position].as_str())
                        .collect(),
                )
            }
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut table = make_table(&self.column_names());
        for row in &self.rows {
            let mut cells: Vec<Cell> = row.group.iter().map(Cell::new).collect();
            for value in &row.values {
                cells.push(value_cell(value.estimate, 4));
                cells.push(value_cell(value.lower, 4));
                cells.push(value_cell(value.upper, 4));
            }
            cells.push(number_cell(row.width.to_string()));
            cells.push(Cell::new(row.point.name()));
            cells.push(Cell::new(row.interval.name()));
            cells.push(number_cell(row.dropped().to_string()));
            table.add_row(cells);
        }
        table.to_string()
    }

    fn target_columns(&self, target: &str) -> [String; 3] {
        if self.canonical {
            [ESTIMATE, LOWER, UPPER].map(str::to_string)
        } else {
            [
                target.to_string(),
                format!("{target}{LOWER}"),
                format!("{target}{UPPER}"),
            ]
        }
    }
}

struct RowRecord<'a> {
    table: &'a SummaryTable,
    row: &'a SummaryRow,
}

impl Serialize for RowRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let row = self.row;
        let mut map = serializer.serialize_map(Some(self.table.column_names().len()))?;
        for (column, value) in self.table.group_columns.iter().zip(&row.group) {
            map.serialize_entry(column, value)?;
        }
        for (target, value) in self.table.targets.iter().zip(&row.values) {
            let [estimate, lower, upper] = self.table.target_columns(target);
            map.serialize_entry(&estimate, &value.estimate)?;
            map.serialize_entry(&lower, &value.lower)?;
            map.serialize_entry(&upper, &value.upper)?;
        }
        map.serialize_entry(WIDTH, &row.width)?;
        map.serialize_entry(POINT, &row.point)?;
        map.serialize_entry(INTERVAL, &row.interval)?;
        map.serialize_entry(DROPPED, &row.dropped())?;
        map.end()
    }
}

/// Serializes as a sequence of flat records keyed by output column name.
impl Serialize for SummaryTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&RowRecord { table: self, row })?;
        }
        seq.end()
    }
}

/// Summarize `targets` within each group of `group_columns`.
///
/// An empty `targets` slice summarizes every value column. Output rows are ordered by
/// group (first-seen) and then by probability level.
///
/// # Errors
///
/// Returns `TidyError::UnknownColumn` for unknown group or target columns,
/// `TidyError::InvalidProbabilityLevel` for bad levels, and
/// `TidyError::InsufficientSamples` for a group with fewer than two finite draws
/// unless `options.error_mode` skips failed groups.
pub fn summarize(
    table: &DrawTable,
    targets: &[Target],
    group_columns: &[&str],
    options: &SummaryOptions,
) -> Result<SummaryTable, TidyError> {
    options.validate()?;
    let defaults: Vec<Target>;
    let targets = if targets.is_empty() {
        defaults = table.value_names().into_iter().map(Target::column).collect();
        defaults.as_slice()
    } else {
        targets
    };
    if targets.is_empty() {
        return Err(TidyError::InvalidOptions(
            "table has no value columns to summarize".to_string(),
        ));
    }
    for target in targets {
        target.check(table)?;
    }
    let groups = table.group_rows(group_columns)?;
    log::debug!(
        "summarizing {} targets over {} groups at {} levels",
        targets.len(),
        groups.len(),
        options.probability_levels.len()
    );

    let results: Vec<Result<Vec<SummaryRow>, TidyError>> = groups
        .par_iter()
        .map(|group| summarize_group(table, targets, group, options))
        .collect();

    let mut rows = Vec::with_capacity(groups.len() * options.probability_levels.len());
    let mut skipped = Vec::new();
    for (group, result) in groups.into_iter().zip(results) {
        match result {
            Ok(group_rows) => rows.extend(group_rows),
            Err(error) if options.error_mode == ErrorMode::SkipFailedGroups => {
                log::warn!("skipping group [{}]: {error}", group.key.join(", "));
                skipped.push(SkippedGroup {
                    group: group.key,
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    Ok(SummaryTable {
        group_columns: group_columns.iter().map(|name| (*name).to_string()).collect(),
        targets: targets.iter().map(|target| target.name.clone()).collect(),
        canonical: matches!(targets, [target] if target.is_column()),
        rows,
        skipped,
    })
}

/// Summaries of a bare slice of draws, one per probability level.
///
/// # Errors
///
/// Same conditions as [`summarize`] for a single group.
pub fn summarize_draws(
    draws: &[f64],
    options: &SummaryOptions,
) -> Result<Vec<PointInterval>, TidyError> {
    options.validate()?;
    point_intervals("draws", "", draws.iter().copied(), options)
}

fn summarize_group(
    table: &DrawTable,
    targets: &[Target],
    group: &RowGroup,
    options: &SummaryOptions,
) -> Result<Vec<SummaryRow>, TidyError> {
    let label = group.key.join(", ");
    let per_target = targets
        .iter()
        .map(|target| {
            point_intervals(
                &target.name,
                &label,
                target.values(table, &group.rows),
                options,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(options
        .probability_levels
        .iter()
        .enumerate()
        .map(|(level_idx, &width)| SummaryRow {
            group: group.key.clone(),
            width,
            point: options.estimator,
            interval: options.interval,
            values: per_target.iter().map(|levels| levels[level_idx]).collect(),
        })
        .collect())
}

fn point_intervals(
    target: &str,
    group: &str,
    values: impl IntoIterator<Item = f64>,
    options: &SummaryOptions,
) -> Result<Vec<PointInterval>, TidyError> {
    let (sorted, dropped) = sorted_finite(values);
    if sorted.len() < MIN_DRAWS {
        return Err(TidyError::InsufficientSamples {
            target: target.to_string(),
            group: group.to_string(),
            found: sorted.len(),
            minimum: MIN_DRAWS,
        });
    }
    if dropped > 0 {
        log::warn!("`{target}` in group [{group}]: dropped {dropped} non-finite draws");
    }
    let estimate = point_estimate(&sorted, options.estimator, &options.density)?;
    Ok(options
        .probability_levels
        .iter()
        .map(|&width| {
            let (lower, upper) = interval_bounds(&sorted, options.interval, width);
            PointInterval {
                estimate,
                lower,
                upper,
                dropped,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::DrawId;
    use crate::table::{KeyColumn, ValueColumn};
    use approx::assert_relative_eq;

    fn grouped_table() -> DrawTable {
        let per_group = 100;
        let mut draws = Vec::new();
        let mut condition = Vec::new();
        let mut mu = Vec::new();
        let mut sigma = Vec::new();
        for (offset, level) in [(0.0, "A"), (10.0, "B")] {
            for idx in 0..per_group {
                draws.push(DrawId::new(1, idx + 1, idx + 1));
                condition.push(level.to_string());
                mu.push(offset + usize_to_f64(idx) / 10.0);
                sigma.push(1.0 + usize_to_f64(idx % 2));
            }
        }
        DrawTable::from_parts(
            draws,
            vec![KeyColumn {
                name: "condition".to_string(),
                values: condition,
            }],
            vec![
                ValueColumn {
                    name: "mu".to_string(),
                    values: mu,
                },
                ValueColumn {
                    name: "sigma".to_string(),
                    values: sigma,
                },
            ],
        )
    }

    #[test]
    fn one_row_per_group_and_level() {
        let options = SummaryOptions::median_qi().with_levels(vec![0.5, 0.9]);
        let summary = summarize(
            &grouped_table(),
            &[Target::column("mu")],
            &["condition"],
            &options,
        )
        .expect("summary");
        assert_eq!(summary.len(), 4);
        assert_eq!(summary.key("condition"), Some(vec!["A", "A", "B", "B"]));
        assert_eq!(summary.numeric(WIDTH), Some(vec![0.5, 0.9, 0.5, 0.9]));
        assert_eq!(summary.key(POINT), Some(vec!["median"; 4]));
        assert_eq!(summary.key(INTERVAL), Some(vec!["qi"; 4]));

        let estimate = summary.numeric(ESTIMATE).expect("estimate");
        assert_relative_eq!(estimate[0], 4.95, epsilon = 1e-9);
        assert_relative_eq!(estimate[2], 14.95, epsilon = 1e-9);
        let lower = summary.numeric(LOWER).expect("lower");
        let upper = summary.numeric(UPPER).expect("upper");
        assert!(lower[1] < lower[0] && upper[1] > upper[0]);
    }

    #[test]
    fn several_targets_use_prefixed_columns() {
        let summary = summarize(
            &grouped_table(),
            &[],
            &["condition"],
            &SummaryOptions::mean_qi(),
        )
        .expect("summary");
        assert_eq!(
            summary.column_names(),
            vec![
                "condition",
                "mu",
                "mu.lower",
                "mu.upper",
                "sigma",
                "sigma.lower",
                "sigma.upper",
                WIDTH,
                POINT,
                INTERVAL,
                DROPPED
            ]
        );
        assert_relative_eq!(summary.numeric("sigma").expect("sigma")[0], 1.5);
        assert!(summary.numeric(ESTIMATE).is_none());
    }

    #[test]
    fn expression_targets_see_every_row() {
        let target = Target::expression("spread", |row| {
            row.value("mu").unwrap_or(f64::NAN) + row.value("sigma").unwrap_or(f64::NAN)
        });
        let summary = summarize(&grouped_table(), &[target], &[], &SummaryOptions::mean_qi())
            .expect("summary");
        assert_eq!(summary.len(), 1);
        assert_eq!(
            summary.column_names(),
            vec![
                "spread",
                "spread.lower",
                "spread.upper",
                WIDTH,
                POINT,
                INTERVAL,
                DROPPED
            ]
        );
        assert_relative_eq!(summary.numeric("spread").expect("spread")[0], 11.45, epsilon = 1e-9);
        assert!(summary.numeric("spread.lower").is_some());
        assert!(summary.numeric("spread.upper").is_some());
        assert!(summary.numeric(ESTIMATE).is_none());
    }

    #[test]
    fn lone_column_target_keeps_canonical_names() {
        let summary = summarize(
            &grouped_table(),
            &[Target::column("sigma")],
            &[],
            &SummaryOptions::mean_qi(),
        )
        .expect("summary");
        assert_eq!(
            summary.column_names(),
            vec![ESTIMATE, LOWER, UPPER, WIDTH, POINT, INTERVAL, DROPPED]
        );
        assert!(summary.numeric("sigma").is_none());
        let json = serde_json::to_value(&summary).expect("json");
        assert_relative_eq!(json[0][ESTIMATE].as_f64().expect("estimate"), 1.5);
    }

    #[test]
    fn non_finite_draws_are_counted() {
        let table = grouped_table()
            .with_value("mu", |row| {
                if row.index() == 0 {
                    f64::NAN
                } else {
                    row.value("mu").unwrap_or(f64::NAN)
                }
            })
            .expect("replace mu");
        let summary = summarize(
            &table,
            &[Target::column("mu")],
            &["condition"],
            &SummaryOptions::mean_qi(),
        )
        .expect("summary");
        assert_eq!(summary.numeric(DROPPED), Some(vec![1.0, 0.0]));
        assert_eq!(summary.rows()[0].dropped(), 1);
    }

    #[test]
    fn small_groups_fail_or_are_skipped() {
        let table = grouped_table().take_rows(&[0, 1, 100]);
        let err = summarize(
            &table,
            &[Target::column("mu")],
            &["condition"],
            &SummaryOptions::mean_qi(),
        )
        .expect_err("group B has one draw");
        assert_eq!(
            err,
            TidyError::InsufficientSamples {
                target: "mu".to_string(),
                group: "B".to_string(),
                found: 1,
                minimum: 2,
            }
        );

        let options = SummaryOptions::mean_qi().with_error_mode(ErrorMode::SkipFailedGroups);
        let summary = summarize(&table, &[Target::column("mu")], &["condition"], &options)
            .expect("skip mode");
        assert_eq!(summary.len(), 1);
        assert_eq!(summary.skipped().len(), 1);
        assert_eq!(summary.skipped()[0].group, vec!["B"]);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let table = grouped_table();
        let bad_level = SummaryOptions::mean_qi().with_levels(vec![0.5, 1.5]);
        assert_eq!(
            summarize(&table, &[], &[], &bad_level).expect_err("level above one"),
            TidyError::InvalidProbabilityLevel(1.5)
        );
        let zero = SummaryOptions::mean_qi().with_levels(vec![0.0]);
        assert!(zero.validate().is_err());
        assert!(SummaryOptions::mean_qi().with_levels(vec![1.0]).validate().is_ok());
        assert_eq!(
            summarize(&table, &[Target::column("tau")], &[], &SummaryOptions::default())
                .expect_err("unknown target"),
            TidyError::UnknownColumn("tau".to_string())
        );
        assert_eq!(
            summarize(&table, &[], &["term"], &SummaryOptions::default())
                .expect_err("unknown group"),
            TidyError::UnknownColumn("term".to_string())
        );
    }

    #[test]
    fn full_width_spans_min_to_max() {
        let draws: Vec<f64> = (0..50).map(usize_to_f64).collect();
        for options in [SummaryOptions::mean_qi(), SummaryOptions::mode_hdi()] {
            let summary =
                summarize_draws(&draws, &options.with_levels(vec![1.0])).expect("summary");
            assert_relative_eq!(summary[0].lower, 0.0);
            assert_relative_eq!(summary[0].upper, 49.0);
        }
    }

    #[test]
    fn render_lists_summary_columns() {
        let summary = summarize(
            &grouped_table(),
            &[Target::column("mu")],
            &["condition"],
            &SummaryOptions::median_hdi(),
        )
        .expect("summary");
        let text = summary.render();
        assert!(text.contains("estimate"));
        assert!(text.contains("hdi"));
        assert!(text.contains("median"));
    }
}
