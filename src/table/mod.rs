//! # Draw tables
//!
//! Column-oriented tidy tables: one row per draw and index combination.
//! Every row carries its [`DrawId`]; key columns hold index values as strings
//! and value columns hold draws.
//!
//! Tables never store grouping state. Engines receive group columns explicitly.

use std::collections::HashMap;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::TidyError;
use crate::input::DrawId;

pub mod render;

pub use render::render_table;

pub const CHAIN: &str = ".chain";
pub const ITERATION: &str = ".iteration";
pub const DRAW: &str = ".draw";
pub const VARIABLE: &str = ".variable";
pub const VALUE: &str = ".value";

/// A named column of index values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumn {
    pub name: String,
    pub values: Vec<String>,
}

/// A named column of draws.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// Rows that share the same values in a set of group columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroup {
    pub key: Vec<String>,
    pub rows: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawTable {
    draws: Vec<DrawId>,
    keys: Vec<KeyColumn>,
    values: Vec<ValueColumn>,
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a DrawTable,
    index: usize,
}

impl Row<'_> {
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn draw_id(&self) -> DrawId {
        self.table.draws[self.index]
    }

    #[must_use]
    pub fn key(&self, name: &str) -> Option<&str> {
        self.table
            .key(name)
            .map(|column| column[self.index].as_str())
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<f64> {
        self.table.value(name).map(|column| column[self.index])
    }
}

impl DrawTable {
    pub(crate) fn from_parts(
        draws: Vec<DrawId>,
        keys: Vec<KeyColumn>,
        values: Vec<ValueColumn>,
    ) -> Self {
        debug_assert!(keys.iter().all(|column| column.values.len() == draws.len()));
        debug_assert!(values.iter().all(|column| column.values.len() == draws.len()));
        Self {
            draws,
            keys,
            values,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    #[must_use]
    pub fn draws(&self) -> &[DrawId] {
        &self.draws
    }

    /// Key column names in table order; pass these as group columns downstream.
    #[must_use]
    pub fn key_names(&self) -> Vec<&str> {
        self.keys.iter().map(|column| column.name.as_str()).collect()
    }

    #[must_use]
    pub fn value_names(&self) -> Vec<&str> {
        self.values.iter().map(|column| column.name.as_str()).collect()
    }

    #[must_use]
    pub fn key(&self, name: &str) -> Option<&[String]> {
        self.keys
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.values.as_slice())
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&[f64]> {
        self.values
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.values.as_slice())
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.len()).then_some(Row { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.len()).map(|index| Row { table: self, index })
    }

    /// Rows satisfying `predicate`, in order.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&Row<'_>) -> bool) -> Self {
        let kept: Vec<usize> = self
            .rows()
            .filter(|row| predicate(row))
            .map(|row| row.index)
            .collect();
        self.take_rows(&kept)
    }

    /// Add (or replace) a value column computed from each row.
    ///
    /// # Errors
    ///
    /// Returns `TidyError::InvalidOptions` if `name` is already a key column.
    pub fn with_value(
        &self,
        name: impl Into<String>,
        expression: impl Fn(&Row<'_>) -> f64,
    ) -> Result<Self, TidyError> {
        let name = name.into();
        if self.key(&name).is_some() {
            return Err(TidyError::InvalidOptions(format!(
                "`{name}` is already a key column"
            )));
        }
        let column: Vec<f64> = self.rows().map(|row| expression(&row)).collect();
        let mut table = self.clone();
        if let Some(existing) = table.values.iter_mut().find(|column| column.name == name) {
            existing.values = column;
        } else {
            table.values.push(ValueColumn {
                name,
                values: column,
            });
        }
        Ok(table)
    }

    /// Stack every value column into `.variable` / `.value` pairs (wide to long).
    ///
    /// # Errors
    ///
    /// Returns `TidyError::InvalidOptions` if the table already has a `.variable` column.
    pub fn gather(&self) -> Result<Self, TidyError> {
        if self.key(VARIABLE).is_some() {
            return Err(TidyError::InvalidOptions(
                "table is already in long layout".to_string(),
            ));
        }
        let total = self.len() * self.values.len();
        let mut draws = Vec::with_capacity(total);
        let mut keys: Vec<KeyColumn> = self
            .keys
            .iter()
            .map(|column| KeyColumn {
                name: column.name.clone(),
                values: Vec::with_capacity(total),
            })
            .collect();
        let mut variable = Vec::with_capacity(total);
        let mut value = Vec::with_capacity(total);

        for column in &self.values {
            draws.extend_from_slice(&self.draws);
            for (target, source) in keys.iter_mut().zip(&self.keys) {
                target.values.extend_from_slice(&source.values);
            }
            variable.extend(std::iter::repeat_n(column.name.clone(), self.len()));
            value.extend_from_slice(&column.values);
        }

        keys.push(KeyColumn {
            name: VARIABLE.to_string(),
            values: variable,
        });
        Ok(Self::from_parts(
            draws,
            keys,
            vec![ValueColumn {
                name: VALUE.to_string(),
                values: value,
            }],
        ))
    }

    /// Turn `.variable` / `.value` pairs back into one column per variable (long to wide).
    ///
    /// # Errors
    ///
    /// Returns `TidyError::UnknownColumn` if the table is not in long layout and
    /// `TidyError::MismatchedIndexDomain` if a cell is missing or duplicated.
    pub fn spread(&self) -> Result<Self, TidyError> {
        let variables = self
            .key(VARIABLE)
            .ok_or_else(|| TidyError::UnknownColumn(VARIABLE.to_string()))?;
        let value = self
            .value(VALUE)
            .ok_or_else(|| TidyError::UnknownColumn(VALUE.to_string()))?;
        let other_keys: Vec<&KeyColumn> =
            self.keys.iter().filter(|column| column.name != VARIABLE).collect();

        let mut names: Vec<&str> = Vec::new();
        let mut row_of: HashMap<(DrawId, Vec<&str>), usize> = HashMap::new();
        let mut first_rows: Vec<usize> = Vec::new();
        let mut cells: Vec<Vec<Option<f64>>> = Vec::new();

        for idx in 0..self.len() {
            let name = variables[idx].as_str();
            let col = if let Some(pos) = names.iter().position(|seen| *seen == name) {
                pos
            } else {
                names.push(name);
                for row in &mut cells {
                    row.push(None);
                }
                names.len() - 1
            };
            let key = (
                self.draws[idx],
                other_keys
                    .iter()
                    .map(|column| column.values[idx].as_str())
                    .collect::<Vec<_>>(),
            );
            let out_row = *row_of.entry(key).or_insert_with(|| {
                first_rows.push(idx);
                cells.push(vec![None; names.len()]);
                first_rows.len() - 1
            });
            if cells[out_row][col].replace(value[idx]).is_some() {
                return Err(TidyError::MismatchedIndexDomain {
                    column: VARIABLE.to_string(),
                    detail: format!(
                        "`{name}` has more than one value for draw {}",
                        self.draws[idx].draw
                    ),
                });
            }
        }

        let mut columns: Vec<ValueColumn> = names
            .iter()
            .map(|name| ValueColumn {
                name: (*name).to_string(),
                values: Vec::with_capacity(first_rows.len()),
            })
            .collect();
        for (out_row, row_cells) in cells.iter().enumerate() {
            for (col, cell) in row_cells.iter().enumerate() {
                let Some(value) = cell else {
                    return Err(TidyError::MismatchedIndexDomain {
                        column: VARIABLE.to_string(),
                        detail: format!(
                            "`{}` has no value for draw {}",
                            names[col],
                            self.draws[first_rows[out_row]].draw
                        ),
                    });
                };
                columns[col].values.push(*value);
            }
        }

        let draws = first_rows.iter().map(|&idx| self.draws[idx]).collect();
        let keys = other_keys
            .iter()
            .map(|column| KeyColumn {
                name: column.name.clone(),
                values: first_rows
                    .iter()
                    .map(|&idx| column.values[idx].clone())
                    .collect(),
            })
            .collect();
        Ok(Self::from_parts(draws, keys, columns))
    }

    /// Check that draw identity plus key columns identify every row uniquely.
    ///
    /// # Errors
    ///
    /// Returns `TidyError::MismatchedIndexDomain` naming the first repeated row.
    pub fn verify_key(&self) -> Result<(), TidyError> {
        let mut seen = HashMap::with_capacity(self.len());
        for idx in 0..self.len() {
            let key = (
                self.draws[idx].draw,
                self.keys
                    .iter()
                    .map(|column| column.values[idx].as_str())
                    .collect::<Vec<_>>(),
            );
            if let Some(previous) = seen.insert(key, idx) {
                return Err(TidyError::MismatchedIndexDomain {
                    column: self.key_names().join(","),
                    detail: format!("rows {previous} and {idx} share draw and index values"),
                });
            }
        }
        Ok(())
    }

    /// Partition rows by the values of `columns`, groups in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns `TidyError::UnknownColumn` if a group column is not a key column.
    pub fn group_rows(&self, columns: &[&str]) -> Result<Vec<RowGroup>, TidyError> {
        let key_columns = columns
            .iter()
            .map(|name| {
                self.key(name)
                    .ok_or_else(|| TidyError::UnknownColumn((*name).to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut position: HashMap<Vec<&str>, usize> = HashMap::new();
        let mut groups: Vec<RowGroup> = Vec::new();
        for idx in 0..self.len() {
            let key: Vec<&str> = key_columns.iter().map(|column| column[idx].as_str()).collect();
            let group = *position.entry(key).or_insert_with_key(|key| {
                groups.push(RowGroup {
                    key: key.iter().map(|value| (*value).to_string()).collect(),
                    rows: Vec::new(),
                });
                groups.len() - 1
            });
            groups[group].rows.push(idx);
        }
        Ok(groups)
    }

    pub(crate) fn take_rows(&self, rows: &[usize]) -> Self {
        Self::from_parts(
            rows.iter().map(|&idx| self.draws[idx]).collect(),
            self.keys
                .iter()
                .map(|column| KeyColumn {
                    name: column.name.clone(),
                    values: rows.iter().map(|&idx| column.values[idx].clone()).collect(),
                })
                .collect(),
            self.values
                .iter()
                .map(|column| ValueColumn {
                    name: column.name.clone(),
                    values: rows.iter().map(|&idx| column.values[idx]).collect(),
                })
                .collect(),
        )
    }

    pub(crate) fn keys(&self) -> &[KeyColumn] {
        &self.keys
    }
}

/// One flat record: draw columns, then key columns, then value columns.
impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let table = self.table;
        let id = self.draw_id();
        let mut map = serializer.serialize_map(Some(3 + table.keys.len() + table.values.len()))?;
        map.serialize_entry(CHAIN, &id.chain)?;
        map.serialize_entry(ITERATION, &id.iteration)?;
        map.serialize_entry(DRAW, &id.draw)?;
        for column in &table.keys {
            map.serialize_entry(&column.name, &column.values[self.index])?;
        }
        for column in &table.values {
            map.serialize_entry(&column.name, &column.values[self.index])?;
        }
        map.end()
    }
}

/// Serializes as a sequence of row records keyed by column name.
impl Serialize for DrawTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for row in self.rows() {
            seq.serialize_element(&row)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> DrawTable {
        let draws = vec![
            DrawId::new(1, 1, 1),
            DrawId::new(1, 2, 2),
            DrawId::new(1, 1, 1),
            DrawId::new(1, 2, 2),
        ];
        DrawTable::from_parts(
            draws,
            vec![KeyColumn {
                name: "condition".to_string(),
                values: vec!["A".into(), "A".into(), "B".into(), "B".into()],
            }],
            vec![
                ValueColumn {
                    name: "mu".to_string(),
                    values: vec![1.0, 2.0, 3.0, 4.0],
                },
                ValueColumn {
                    name: "sigma".to_string(),
                    values: vec![0.1, 0.2, 0.3, 0.4],
                },
            ],
        )
    }

    #[test]
    fn row_accessors_read_columns() {
        let table = sample_table();
        let row = table.row(2).expect("row exists");
        assert_eq!(row.key("condition"), Some("B"));
        assert_eq!(row.value("mu"), Some(3.0));
        assert_eq!(row.draw_id().draw, 1);
        assert!(row.value("missing").is_none());
        assert!(table.row(4).is_none());
    }

    #[test]
    fn filter_keeps_matching_rows() {
        let table = sample_table().filter(|row| row.key("condition") == Some("B"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.value("mu"), Some(&[3.0, 4.0][..]));
    }

    #[test]
    fn with_value_adds_derived_column() {
        let table = sample_table()
            .with_value("ratio", |row| {
                row.value("mu").unwrap_or(f64::NAN) / row.value("sigma").unwrap_or(f64::NAN)
            })
            .expect("new column");
        assert_eq!(table.value_names(), vec!["mu", "sigma", "ratio"]);
        assert!((table.value("ratio").expect("ratio")[0] - 10.0).abs() < 1e-12);
        assert!(sample_table().with_value("condition", |_| 0.0).is_err());
    }

    #[test]
    fn gather_then_spread_restores_wide_table() {
        let wide = sample_table();
        let long = wide.gather().expect("gather");
        assert_eq!(long.len(), 8);
        assert_eq!(long.key_names(), vec!["condition", VARIABLE]);
        assert_eq!(long.value_names(), vec![VALUE]);
        assert_eq!(long.spread().expect("spread"), wide);
        assert!(long.gather().is_err());
    }

    #[test]
    fn spread_rejects_missing_cells() {
        let long = sample_table().gather().expect("gather");
        let partial = long.filter(|row| !(row.key(VARIABLE) == Some("sigma") && row.index() == 7));
        let err = partial.spread().expect_err("missing sigma cell");
        assert!(matches!(err, TidyError::MismatchedIndexDomain { .. }));
        assert!(matches!(
            sample_table().spread(),
            Err(TidyError::UnknownColumn(_))
        ));
    }

    #[test]
    fn group_rows_preserves_first_seen_order() {
        let groups = sample_table().group_rows(&["condition"]).expect("groups");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, vec!["A"]);
        assert_eq!(groups[1].rows, vec![2, 3]);

        let all = sample_table().group_rows(&[]).expect("single group");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rows.len(), 4);

        assert!(sample_table().group_rows(&["mu"]).is_err());
    }

    #[test]
    fn rows_serialize_as_flat_records() {
        let json = serde_json::to_value(sample_table()).expect("json");
        assert_eq!(json.as_array().map(Vec::len), Some(4));
        let last = &json[3];
        assert_eq!(last[DRAW], 2);
        assert_eq!(last[CHAIN], 1);
        assert_eq!(last["condition"], "B");
        assert_eq!(last["sigma"], 0.4);
    }

    #[test]
    fn verify_key_detects_duplicate_rows() {
        assert!(sample_table().verify_key().is_ok());
        let duplicated = sample_table().take_rows(&[0, 1, 0]);
        assert!(duplicated.verify_key().is_err());
    }
}
