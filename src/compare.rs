//! # Level comparisons
//!
//! Per-draw contrasts between levels of one key column. Draws are aligned by
//! draw identity within each combination of the remaining key columns, and the
//! result is an ordinary [`DrawTable`] whose factor column holds pair labels
//! such as `B - A`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::TidyError;
use crate::input::DrawId;
use crate::table::{DrawTable, KeyColumn, ValueColumn};

type CompareFn = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;
type PairFn = Arc<dyn Fn(&[String]) -> Vec<(String, String)> + Send + Sync>;

/// How the value of the first level is combined with the second.
#[derive(Clone, Default)]
pub enum Comparison {
    #[default]
    Difference,
    Ratio,
    Custom { symbol: String, function: CompareFn },
}

impl fmt::Debug for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Difference => f.write_str("Difference"),
            Self::Ratio => f.write_str("Ratio"),
            Self::Custom { symbol, .. } => {
                f.debug_struct("Custom").field("symbol", symbol).finish()
            }
        }
    }
}

impl Comparison {
    /// A comparison labelled `"{first}{symbol}{second}"`.
    #[must_use]
    pub fn custom(
        symbol: impl Into<String>,
        function: impl Fn(f64, f64) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self::Custom {
            symbol: symbol.into(),
            function: Arc::new(function),
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Difference => " - ",
            Self::Ratio => " / ",
            Self::Custom { symbol, .. } => symbol.as_str(),
        }
    }

    #[must_use]
    pub fn apply(&self, first: f64, second: f64) -> f64 {
        match self {
            Self::Difference => first - second,
            Self::Ratio => first / second,
            Self::Custom { function, .. } => function(first, second),
        }
    }

    #[must_use]
    pub fn label(&self, first: &str, second: &str) -> String {
        format!("{first}{}{second}", self.symbol())
    }
}

/// Which `(first, second)` level pairs to compare, given the sorted levels.
#[derive(Clone, Default)]
pub enum PairGenerator {
    /// Every unordered pair: `l1 vs l0`, `l2 vs l0`, ..., `l2 vs l1`, ...
    #[default]
    Pairwise,
    /// Consecutive levels: `l1 vs l0`, `l2 vs l1`, ...
    Ordered,
    /// Every other level against the named control level.
    Control(String),
    Explicit(Vec<(String, String)>),
    Custom(PairFn),
}

impl fmt::Debug for PairGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pairwise => f.write_str("Pairwise"),
            Self::Ordered => f.write_str("Ordered"),
            Self::Control(level) => f.debug_tuple("Control").field(level).finish(),
            Self::Explicit(pairs) => f.debug_tuple("Explicit").field(pairs).finish(),
            Self::Custom(_) => f.write_str("Custom(<function>)"),
        }
    }
}

impl PairGenerator {
    #[must_use]
    pub fn custom(
        generator: impl Fn(&[String]) -> Vec<(String, String)> + Send + Sync + 'static,
    ) -> Self {
        Self::Custom(Arc::new(generator))
    }

    /// Pairs for `levels`, which must be sorted.
    #[must_use]
    pub fn pairs(&self, levels: &[String]) -> Vec<(String, String)> {
        match self {
            Self::Pairwise => {
                let mut pairs = Vec::new();
                for (low, second) in levels.iter().enumerate() {
                    for first in &levels[low + 1..] {
                        pairs.push((first.clone(), second.clone()));
                    }
                }
                pairs
            }
            Self::Ordered => levels
                .windows(2)
                .map(|pair| (pair[1].clone(), pair[0].clone()))
                .collect(),
            Self::Control(control) => levels
                .iter()
                .filter(|level| *level != control)
                .map(|level| (level.clone(), control.clone()))
                .collect(),
            Self::Explicit(pairs) => pairs.clone(),
            Self::Custom(generator) => generator(levels),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    pub comparison: Comparison,
    pub pairs: PairGenerator,
}

impl CompareOptions {
    #[must_use]
    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = comparison;
        self
    }

    #[must_use]
    pub fn with_pairs(mut self, pairs: PairGenerator) -> Self {
        self.pairs = pairs;
        self
    }

    /// # Errors
    ///
    /// Returns `TidyError::InvalidOptions` for an empty custom symbol or explicit pair list.
    pub fn validate(&self) -> Result<(), TidyError> {
        if let Comparison::Custom { symbol, .. } = &self.comparison
            && symbol.is_empty()
        {
            return Err(TidyError::InvalidOptions(
                "custom comparison needs a non-empty symbol".to_string(),
            ));
        }
        if let PairGenerator::Explicit(pairs) = &self.pairs
            && pairs.is_empty()
        {
            return Err(TidyError::InvalidOptions(
                "explicit pair list is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Compare the levels of `factor` on the draws of `value`.
///
/// Rows are grouped by every key column other than `factor`, and each group
/// compares only the levels it contains. Output rows are ordered by group, then
/// by pair, then by the draw order of the first level. Other value columns are
/// not carried over.
///
/// # Errors
///
/// Returns `TidyError::UnknownColumn` if `factor` is not a key column or `value`
/// is not a value column, `TidyError::UnknownLevel` if a pair names a level that
/// never occurs, `TidyError::UnmatchedDraw` if a draw of one level has no
/// counterpart in the other within a group, and
/// `TidyError::MismatchedIndexDomain` if a level repeats a draw within a group.
pub fn compare_levels(
    table: &DrawTable,
    value: &str,
    factor: &str,
    options: &CompareOptions,
) -> Result<DrawTable, TidyError> {
    options.validate()?;
    let values = table
        .value(value)
        .ok_or_else(|| TidyError::UnknownColumn(value.to_string()))?;
    let factor_values = table
        .key(factor)
        .ok_or_else(|| TidyError::UnknownColumn(factor.to_string()))?;

    let levels: Vec<String> = factor_values
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let pairs = options.pairs.pairs(&levels);
    for level in pairs.iter().flat_map(|(first, second)| [first, second]) {
        if levels.binary_search(level).is_err() {
            return Err(TidyError::UnknownLevel {
                factor: factor.to_string(),
                level: level.clone(),
            });
        }
    }

    let other_keys: Vec<&str> = table
        .key_names()
        .into_iter()
        .filter(|name| *name != factor)
        .collect();
    let groups = table.group_rows(&other_keys)?;
    log::debug!(
        "comparing {} pairs of `{factor}` across {} groups",
        pairs.len(),
        groups.len()
    );

    let mut out = ComparisonRows::new(table.keys());
    for group in &groups {
        let mut by_level: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for &idx in &group.rows {
            by_level
                .entry(factor_values[idx].as_str())
                .or_default()
                .push(idx);
        }
        let present: Vec<String> = by_level.keys().map(|level| (*level).to_string()).collect();
        for (first, second) in options.pairs.pairs(&present) {
            let (Some(first_rows), Some(second_rows)) =
                (by_level.get(first.as_str()), by_level.get(second.as_str()))
            else {
                continue;
            };
            let label = options.comparison.label(&first, &second);
            let first_by_draw = index_by_draw(table, first_rows, factor, &first)?;
            let second_by_draw = index_by_draw(table, second_rows, factor, &second)?;

            for &idx in first_rows {
                let draw = table.draws()[idx];
                let Some(&partner) = second_by_draw.get(&draw) else {
                    return Err(TidyError::UnmatchedDraw {
                        draw: draw.draw,
                        present: first,
                        missing: second,
                    });
                };
                out.push(
                    table,
                    idx,
                    factor,
                    &label,
                    options.comparison.apply(values[idx], values[partner]),
                );
            }
            if let Some(&orphan) = second_rows
                .iter()
                .find(|&&idx| !first_by_draw.contains_key(&table.draws()[idx]))
            {
                return Err(TidyError::UnmatchedDraw {
                    draw: table.draws()[orphan].draw,
                    present: second,
                    missing: first,
                });
            }
        }
    }

    Ok(out.finish(value))
}

fn index_by_draw(
    table: &DrawTable,
    rows: &[usize],
    factor: &str,
    level: &str,
) -> Result<HashMap<DrawId, usize>, TidyError> {
    let mut by_draw = HashMap::with_capacity(rows.len());
    for &idx in rows {
        let draw = table.draws()[idx];
        if by_draw.insert(draw, idx).is_some() {
            return Err(TidyError::MismatchedIndexDomain {
                column: factor.to_string(),
                detail: format!("level `{level}` repeats draw {} within a group", draw.draw),
            });
        }
    }
    Ok(by_draw)
}

struct ComparisonRows {
    draws: Vec<DrawId>,
    keys: Vec<KeyColumn>,
    values: Vec<f64>,
}

impl ComparisonRows {
    fn new(template: &[KeyColumn]) -> Self {
        Self {
            draws: Vec::new(),
            keys: template
                .iter()
                .map(|column| KeyColumn {
                    name: column.name.clone(),
                    values: Vec::new(),
                })
                .collect(),
            values: Vec::new(),
        }
    }

    fn push(&mut self, table: &DrawTable, idx: usize, factor: &str, label: &str, value: f64) {
        self.draws.push(table.draws()[idx]);
        for (target, source) in self.keys.iter_mut().zip(table.keys()) {
            let cell = if source.name == factor {
                label.to_string()
            } else {
                source.values[idx].clone()
            };
            target.values.push(cell);
        }
        self.values.push(value);
    }

    fn finish(self, value: &str) -> DrawTable {
        DrawTable::from_parts(
            self.draws,
            self.keys,
            vec![ValueColumn {
                name: value.to_string(),
                values: self.values,
            }],
        )
    }
}
