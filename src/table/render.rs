//! Plain-text rendering of draw and summary tables using `comfy_table`.

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use super::{CHAIN, DRAW, DrawTable, ITERATION};

/// Render the first `max_rows` rows of a draw table (all rows when `None`).
#[must_use]
pub fn render_table(table: &DrawTable, max_rows: Option<usize>) -> String {
    let mut headers = vec![CHAIN.to_string(), ITERATION.to_string(), DRAW.to_string()];
    headers.extend(table.key_names().into_iter().map(str::to_string));
    headers.extend(table.value_names().into_iter().map(str::to_string));
    let mut rendered = make_table(&headers);

    let shown = max_rows.unwrap_or(table.len()).min(table.len());
    for row in table.rows().take(shown) {
        let id = row.draw_id();
        let mut cells = vec![
            number_cell(id.chain.to_string()),
            number_cell(id.iteration.to_string()),
            number_cell(id.draw.to_string()),
        ];
        for name in table.key_names() {
            cells.push(Cell::new(row.key(name).unwrap_or_default()));
        }
        for name in table.value_names() {
            cells.push(value_cell(row.value(name).unwrap_or(f64::NAN), 4));
        }
        rendered.add_row(cells);
    }

    let mut text = rendered.to_string();
    if shown < table.len() {
        text.push_str(&format!("\n... {} more rows", table.len() - shown));
    }
    text
}

pub(crate) fn make_table<S: AsRef<str>>(headers: &[S]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h.as_ref())).collect::<Vec<_>>());
    table
}

pub(crate) fn value_cell(value: f64, precision: usize) -> Cell {
    number_cell(format!("{value:.precision$}"))
}

pub(crate) fn number_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::DrawId;
    use crate::table::{KeyColumn, ValueColumn};

    fn sample_table(rows: usize) -> DrawTable {
        DrawTable::from_parts(
            (1..=rows).map(|idx| DrawId::new(1, idx, idx)).collect(),
            vec![KeyColumn {
                name: "condition".to_string(),
                values: vec!["A".to_string(); rows],
            }],
            vec![ValueColumn {
                name: "mu".to_string(),
                values: vec![0.5; rows],
            }],
        )
    }

    #[test]
    fn render_table_includes_headers_and_values() {
        let text = render_table(&sample_table(2), None);
        assert!(text.contains(".draw"));
        assert!(text.contains("condition"));
        assert!(text.contains("0.5000"));
    }

    #[test]
    fn render_table_reports_truncated_rows() {
        let text = render_table(&sample_table(5), Some(2));
        assert!(text.ends_with("... 3 more rows"));
    }
}
