//! # Tidy assembly
//!
//! Joins the parameters matched by several specifications into one table.
//! Specifications sharing an index column are joined on it; a specification
//! lacking a column is broadcast across every value that column takes
//! elsewhere. Draw identity is always part of the join, so draws never mix.
//!
//! All parameters share the same draws, so the join is computed once over
//! index combinations and then expanded across draws.

use std::collections::{HashMap, HashSet};

use crate::error::TidyError;
use crate::extract::{Extraction, SpecMatches, extract};
use crate::input::RawDraws;
use crate::parse::{ParamSpec, ParseOptions};
use crate::table::{DrawTable, KeyColumn, VALUE, VARIABLE, ValueColumn};

/// Output layout of an assembled table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// One value column per specification.
    #[default]
    Wide,
    /// Specifications stacked, identified by `.variable`, with one `.value` column.
    Long,
}

/// How specifications with unrelated index columns are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinPolicy {
    /// Indexed specifications that share no column are crossed.
    #[default]
    Broadcast,
    /// Indexed specifications must share a column with those before them, and
    /// a shared key may not repeat on both sides of the join.
    Strict,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleOptions {
    pub layout: Layout,
    pub join_policy: JoinPolicy,
}

impl AssembleOptions {
    /// # Errors
    ///
    /// Returns `TidyError::InvalidOptions` for the strict join policy in long
    /// layout, which stacks specifications without joining them.
    pub fn validate(&self) -> Result<(), TidyError> {
        if self.layout == Layout::Long && self.join_policy == JoinPolicy::Strict {
            return Err(TidyError::InvalidOptions(
                "strict join policy applies only to the wide layout".to_string(),
            ));
        }
        Ok(())
    }
}

/// Join extracted parameters into a tidy table.
///
/// Key columns appear in order of first introduction by the specifications.
///
/// # Errors
///
/// Returns `TidyError::MismatchedIndexDomain` when index values of a shared
/// column do not line up between specifications (the join would drop rows),
/// when a specification repeats an index combination, or when the strict join
/// policy is violated. Returns `TidyError::InvalidSpecification` when two
/// specifications produce the same value column, and
/// `TidyError::InvalidOptions` when `options` fail [`AssembleOptions::validate`].
pub fn assemble(
    extraction: &Extraction<'_>,
    options: AssembleOptions,
) -> Result<DrawTable, TidyError> {
    options.validate()?;
    check_column_names(extraction)?;
    let frames = extraction
        .specs
        .iter()
        .map(SpecFrame::new)
        .collect::<Result<Vec<_>, _>>()?;

    let table = match options.layout {
        Layout::Wide => {
            let joined = join_frames(&frames, options.join_policy)?;
            build_wide(extraction, &joined)
        }
        Layout::Long => build_long(extraction, &frames),
    };
    log::debug!(
        "assembled {} rows from {} specifications ({:?} layout)",
        table.len(),
        extraction.specs.len(),
        options.layout
    );
    debug_assert!(table.verify_key().is_ok());
    Ok(table)
}

/// Extract `specs` from `raw` and assemble them in wide layout.
///
/// # Errors
///
/// Returns any extraction or assembly error.
pub fn spread_draws(
    raw: &RawDraws,
    specs: &[ParamSpec],
    options: &ParseOptions,
) -> Result<DrawTable, TidyError> {
    let extraction = extract(raw, specs, options)?;
    assemble(&extraction, AssembleOptions::default())
}

/// Extract `specs` from `raw` and assemble them in long layout.
///
/// # Errors
///
/// Returns any extraction or assembly error.
pub fn gather_draws(
    raw: &RawDraws,
    specs: &[ParamSpec],
    options: &ParseOptions,
) -> Result<DrawTable, TidyError> {
    let extraction = extract(raw, specs, options)?;
    assemble(
        &extraction,
        AssembleOptions {
            layout: Layout::Long,
            ..AssembleOptions::default()
        },
    )
}

/// Index combinations of one specification, one per matched parameter.
struct SpecFrame {
    columns: Vec<String>,
    combos: Vec<Vec<String>>,
}

impl SpecFrame {
    fn new(spec: &SpecMatches<'_>) -> Result<Self, TidyError> {
        let columns: Vec<String> = spec.spec.index_columns().map(str::to_string).collect();
        let combos: Vec<Vec<String>> = spec
            .matches
            .iter()
            .map(|m| m.binding.indices.iter().map(|(_, value)| value.clone()).collect())
            .collect();

        let mut seen = HashSet::with_capacity(combos.len());
        for (combo, m) in combos.iter().zip(&spec.matches) {
            if !seen.insert(combo) {
                return Err(TidyError::MismatchedIndexDomain {
                    column: columns.join(","),
                    detail: format!(
                        "`{}` repeats index values [{}] of `{}`",
                        m.binding.raw_name,
                        combo.join(","),
                        spec.spec
                    ),
                });
            }
        }
        Ok(Self { columns, combos })
    }
}

/// Natural join over index combinations.
struct JoinedCombos {
    columns: Vec<String>,
    /// Key values per joined row, aligned with `columns`.
    keys: Vec<Vec<String>>,
    /// Matched parameter per specification, per joined row.
    matches: Vec<Vec<usize>>,
}

fn join_frames(frames: &[SpecFrame], policy: JoinPolicy) -> Result<JoinedCombos, TidyError> {
    let mut joined = JoinedCombos {
        columns: Vec::new(),
        keys: vec![Vec::new()],
        matches: vec![Vec::new()],
    };

    for frame in frames {
        let shared: Vec<(usize, usize)> = frame
            .columns
            .iter()
            .enumerate()
            .filter_map(|(frame_pos, column)| {
                joined
                    .columns
                    .iter()
                    .position(|existing| existing == column)
                    .map(|joined_pos| (joined_pos, frame_pos))
            })
            .collect();
        let added: Vec<usize> = (0..frame.columns.len())
            .filter(|pos| !shared.iter().any(|(_, frame_pos)| frame_pos == pos))
            .collect();

        if policy == JoinPolicy::Strict
            && shared.is_empty()
            && !frame.columns.is_empty()
            && !joined.columns.is_empty()
        {
            return Err(TidyError::MismatchedIndexDomain {
                column: frame.columns.join(","),
                detail: format!(
                    "shares no index column with [{}] under the strict join policy",
                    joined.columns.join(",")
                ),
            });
        }

        let (keys, matches) = join_frame(&joined, frame, &shared, &added, policy)?;
        joined
            .columns
            .extend(added.iter().map(|&pos| frame.columns[pos].clone()));
        joined.keys = keys;
        joined.matches = matches;
    }

    Ok(joined)
}

type JoinedRows = (Vec<Vec<String>>, Vec<Vec<usize>>);

/// Join one specification onto the rows joined so far.
///
/// `shared` pairs positions of common columns as `(joined, frame)`; `added`
/// lists frame positions of columns new to the join.
fn join_frame(
    joined: &JoinedCombos,
    frame: &SpecFrame,
    shared: &[(usize, usize)],
    added: &[usize],
    policy: JoinPolicy,
) -> Result<JoinedRows, TidyError> {
    let mut partners: HashMap<Vec<&str>, Vec<usize>> = HashMap::new();
    for (idx, combo) in frame.combos.iter().enumerate() {
        let key = shared
            .iter()
            .map(|&(_, frame_pos)| combo[frame_pos].as_str())
            .collect();
        partners.entry(key).or_default().push(idx);
    }

    let mut used = vec![false; frame.combos.len()];
    let mut keys = Vec::new();
    let mut matches = Vec::new();
    let mut left_multiplicity: HashMap<Vec<&str>, usize> = HashMap::new();

    for (row_keys, row_matches) in joined.keys.iter().zip(&joined.matches) {
        let key: Vec<&str> = shared
            .iter()
            .map(|&(joined_pos, _)| row_keys[joined_pos].as_str())
            .collect();
        let Some(found) = partners.get(&key) else {
            return Err(unmatched_combo(&joined.columns, shared, &key, frame));
        };
        *left_multiplicity.entry(key).or_default() += 1;
        for &idx in found {
            used[idx] = true;
            let mut next_keys = row_keys.clone();
            next_keys.extend(added.iter().map(|&pos| frame.combos[idx][pos].clone()));
            let mut next_matches = row_matches.clone();
            next_matches.push(idx);
            keys.push(next_keys);
            matches.push(next_matches);
        }
    }

    if let Some(idx) = used.iter().position(|was_used| !was_used) {
        return Err(TidyError::MismatchedIndexDomain {
            column: shared_names(&joined.columns, shared),
            detail: format!(
                "index values [{}] have no counterpart in earlier specifications",
                frame.combos[idx].join(",")
            ),
        });
    }

    if policy == JoinPolicy::Strict
        && !shared.is_empty()
        && let Some((key, _)) = left_multiplicity.iter().find(|(key, count)| {
            **count > 1 && partners.get(*key).is_some_and(|found| found.len() > 1)
        })
    {
        return Err(TidyError::MismatchedIndexDomain {
            column: shared_names(&joined.columns, shared),
            detail: format!(
                "index values [{}] repeat on both sides of the join",
                key.join(",")
            ),
        });
    }

    Ok((keys, matches))
}

fn shared_names(columns: &[String], shared: &[(usize, usize)]) -> String {
    shared
        .iter()
        .map(|&(joined_pos, _)| columns[joined_pos].as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn unmatched_combo(
    columns: &[String],
    shared: &[(usize, usize)],
    key: &[&str],
    frame: &SpecFrame,
) -> TidyError {
    TidyError::MismatchedIndexDomain {
        column: shared_names(columns, shared),
        detail: format!(
            "index values [{}] have no counterpart among [{}]",
            key.join(","),
            frame.columns.join(",")
        ),
    }
}

fn check_column_names(extraction: &Extraction<'_>) -> Result<(), TidyError> {
    let universe = extraction.index_universe();
    let mut names = HashSet::new();
    for spec in &extraction.specs {
        let name = spec.spec.column_name();
        if !names.insert(name) || universe.iter().any(|column| column == name) {
            return Err(TidyError::InvalidSpecification {
                spec: spec.spec.to_string(),
                reason: "value column name collides with another column",
            });
        }
    }
    Ok(())
}

fn build_wide(extraction: &Extraction<'_>, joined: &JoinedCombos) -> DrawTable {
    let draw_count = extraction.draw_ids.len();
    let total = joined.keys.len() * draw_count;

    let mut draws = Vec::with_capacity(total);
    let mut keys: Vec<KeyColumn> = joined
        .columns
        .iter()
        .map(|name| KeyColumn {
            name: name.clone(),
            values: Vec::with_capacity(total),
        })
        .collect();
    let mut values: Vec<ValueColumn> = extraction
        .specs
        .iter()
        .map(|spec| ValueColumn {
            name: spec.spec.column_name().to_string(),
            values: Vec::with_capacity(total),
        })
        .collect();

    for (row_keys, row_matches) in joined.keys.iter().zip(&joined.matches) {
        draws.extend_from_slice(&extraction.draw_ids);
        for (column, value) in keys.iter_mut().zip(row_keys) {
            column
                .values
                .extend(std::iter::repeat_n(value.clone(), draw_count));
        }
        for ((column, spec), &idx) in values.iter_mut().zip(&extraction.specs).zip(row_matches) {
            column.values.extend_from_slice(spec.matches[idx].values);
        }
    }

    DrawTable::from_parts(draws, keys, values)
}

fn build_long(extraction: &Extraction<'_>, frames: &[SpecFrame]) -> DrawTable {
    let universe = extraction.index_universe();
    let draw_count = extraction.draw_ids.len();
    let total: usize = extraction
        .specs
        .iter()
        .map(|spec| spec.matches.len() * draw_count)
        .sum();

    let mut draws = Vec::with_capacity(total);
    let mut keys: Vec<KeyColumn> = universe
        .iter()
        .chain(std::iter::once(&VARIABLE.to_string()))
        .map(|name| KeyColumn {
            name: name.clone(),
            values: Vec::with_capacity(total),
        })
        .collect();
    let mut value = Vec::with_capacity(total);

    for (spec, frame) in extraction.specs.iter().zip(frames) {
        let positions: Vec<Option<usize>> = universe
            .iter()
            .map(|column| frame.columns.iter().position(|own| own == column))
            .collect();
        for (m, combo) in spec.matches.iter().zip(&frame.combos) {
            draws.extend_from_slice(&extraction.draw_ids);
            for (column, position) in keys.iter_mut().zip(&positions) {
                let cell = position.map_or_else(String::new, |pos| combo[pos].clone());
                column.values.extend(std::iter::repeat_n(cell, draw_count));
            }
            if let Some(variable) = keys.last_mut() {
                variable.values.extend(std::iter::repeat_n(
                    spec.spec.column_name().to_string(),
                    draw_count,
                ));
            }
            value.extend_from_slice(m.values);
        }
    }

    DrawTable::from_parts(
        draws,
        keys,
        vec![ValueColumn {
            name: VALUE.to_string(),
            values: value,
        }],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draws_for(names: &[&str], draw_count: usize) -> RawDraws {
        let mut raw = RawDraws::new();
        for (offset, name) in names.iter().enumerate() {
            raw.push(
                *name,
                (0..draw_count)
                    .map(|draw| f64::from(u32::try_from(offset * 100 + draw).unwrap_or(u32::MAX)))
                    .collect(),
            );
        }
        raw
    }

    fn spread(raw: &RawDraws, specs: &[&str], policy: JoinPolicy) -> Result<DrawTable, TidyError> {
        let specs = ParamSpec::parse_all(specs).expect("valid specs");
        let extraction = extract(raw, &specs, &ParseOptions::default())?;
        assemble(
            &extraction,
            AssembleOptions {
                join_policy: policy,
                ..AssembleOptions::default()
            },
        )
    }

    #[test]
    fn scalar_is_broadcast_across_indexed_levels() {
        let raw = draws_for(&["sigma", "mu[a]", "mu[b]", "mu[c]"], 4);
        let table = spread(&raw, &["sigma", "mu[group]"], JoinPolicy::Broadcast).expect("assemble");

        assert_eq!(table.len(), 12);
        assert_eq!(table.key_names(), vec!["group"]);
        assert_eq!(table.value_names(), vec!["sigma", "mu"]);
        for row in table.rows() {
            let draw = row.draw_id().draw;
            let sigma = row.value("sigma").expect("sigma");
            assert!((sigma - f64::from(u32::try_from(draw - 1).unwrap_or(0))).abs() < 1e-12);
        }
        assert!(table.verify_key().is_ok());
    }

    #[test]
    fn shared_columns_join_instead_of_crossing() {
        let raw = draws_for(&["a[1]", "a[2]", "b[1,x]", "b[1,y]", "b[2,x]", "b[2,y]"], 3);
        let table = spread(&raw, &["a[i]", "b[i,j]"], JoinPolicy::Strict).expect("assemble");

        assert_eq!(table.len(), 4 * 3);
        assert_eq!(table.key_names(), vec!["i", "j"]);
        let rows: Vec<_> = table
            .rows()
            .filter(|row| row.key("i") == Some("2") && row.draw_id().draw == 1)
            .map(|row| row.value("a").expect("a"))
            .collect();
        assert_eq!(rows, vec![100.0, 100.0]);
    }

    #[test]
    fn disjoint_indexed_specs_cross_under_broadcast_policy() {
        let raw = draws_for(&["a[1]", "a[2]", "b[x]", "b[y]", "b[z]"], 2);
        let table = spread(&raw, &["a[i]", "b[j]"], JoinPolicy::Broadcast).expect("assemble");
        assert_eq!(table.len(), 2 * 3 * 2);

        let err = spread(&raw, &["a[i]", "b[j]"], JoinPolicy::Strict).expect_err("strict");
        assert!(matches!(err, TidyError::MismatchedIndexDomain { .. }));
    }

    #[test]
    fn mismatched_shared_domains_are_rejected() {
        let raw = draws_for(&["a[1]", "a[2]", "b[1]", "b[3]"], 2);
        let err =
            spread(&raw, &["a[i]", "b[i]"], JoinPolicy::Broadcast).expect_err("domains differ");
        assert!(
            matches!(err, TidyError::MismatchedIndexDomain { ref column, .. } if column == "i")
        );
    }

    #[test]
    fn strict_policy_rejects_many_to_many_joins() {
        let raw = draws_for(&["a[1,p]", "a[1,q]", "b[1,x]", "b[1,y]"], 2);
        let broadcast = spread(&raw, &["a[i,k]", "b[i,j]"], JoinPolicy::Broadcast).expect("cross");
        assert_eq!(broadcast.len(), 4 * 2);

        let err = spread(&raw, &["a[i,k]", "b[i,j]"], JoinPolicy::Strict).expect_err("many:many");
        assert!(matches!(err, TidyError::MismatchedIndexDomain { .. }));
    }

    #[test]
    fn dropped_slots_that_repeat_combinations_are_rejected() {
        let raw = draws_for(&["a[1,1]", "a[1,2]"], 2);
        let err = spread(&raw, &["a[i,]"], JoinPolicy::Broadcast).expect_err("repeat");
        assert!(matches!(err, TidyError::MismatchedIndexDomain { .. }));
    }

    #[test]
    fn duplicate_value_columns_need_an_alias() {
        let raw = draws_for(&["a[1]", "a[2]"], 2);
        let err = spread(&raw, &["a[i]", "a[j]"], JoinPolicy::Broadcast).expect_err("collision");
        assert!(matches!(err, TidyError::InvalidSpecification { .. }));

        let specs = vec![
            ParamSpec::parse("a[i]").expect("spec"),
            ParamSpec::parse("a[i]").expect("spec").with_alias("a_again"),
        ];
        let extraction = extract(&raw, &specs, &ParseOptions::default()).expect("extract");
        let table = assemble(&extraction, AssembleOptions::default()).expect("aliased");
        assert_eq!(table.value_names(), vec!["a", "a_again"]);
    }

    #[test]
    fn long_layout_stacks_specs_with_variable_column() {
        let raw = draws_for(&["sigma", "mu[a]", "mu[b]"], 5);
        let specs = ParamSpec::parse_all(&["sigma", "mu[group]"]).expect("specs");
        let table = gather_draws(&raw, &specs, &ParseOptions::default()).expect("gather");

        assert_eq!(table.len(), 15);
        assert_eq!(table.key_names(), vec!["group", VARIABLE]);
        assert_eq!(table.value_names(), vec![VALUE]);
        let sigma_rows = table
            .rows()
            .filter(|row| row.key(VARIABLE) == Some("sigma"))
            .inspect(|row| assert_eq!(row.key("group"), Some("")))
            .count();
        assert_eq!(sigma_rows, 5);
    }

    #[test]
    fn strict_policy_needs_wide_layout() {
        let raw = draws_for(&["sigma", "mu[a]", "mu[b]"], 2);
        let specs = ParamSpec::parse_all(&["sigma", "mu[group]"]).expect("specs");
        let extraction = extract(&raw, &specs, &ParseOptions::default()).expect("extract");
        let options = AssembleOptions {
            layout: Layout::Long,
            join_policy: JoinPolicy::Strict,
        };
        assert_eq!(
            assemble(&extraction, options).expect_err("strict long"),
            TidyError::InvalidOptions(
                "strict join policy applies only to the wide layout".to_string()
            )
        );
        assert!(
            AssembleOptions {
                layout: Layout::Long,
                ..AssembleOptions::default()
            }
            .validate()
            .is_ok()
        );
    }
}
