//! Plain-text rendering of result tables for the terminal.

use odl_types::{InferredType, NoticeSeverity, Table};
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

const COLUMN_GAP: &str = "  ";

/// Renders `table` as aligned columns followed by its notices.
///
/// Number columns are right-aligned; `null` cells are left blank.
pub fn render_table(table: &Table) -> String {
    let headers: Vec<&str> = table.column_names().collect();
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|name| cell_text(row.get(*name).unwrap_or(&Value::Null)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            cells
                .iter()
                .map(|row| row[index].width())
                .chain(std::iter::once(header.width()))
                .max()
                .unwrap_or_default()
        })
        .collect();
    let right_aligned: Vec<bool> = table
        .columns
        .iter()
        .map(|column| column.inferred_type == InferredType::Number)
        .collect();

    let mut lines = Vec::with_capacity(cells.len() + 2);
    if !headers.is_empty() {
        let header_cells: Vec<String> = headers.iter().map(|header| header.to_string()).collect();
        lines.push(format_line(&header_cells, &widths, &right_aligned));
        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        lines.push(rule.join(COLUMN_GAP));
    }
    for row in &cells {
        lines.push(format_line(row, &widths, &right_aligned));
    }
    if table.is_empty() {
        lines.push("(no rows)".to_string());
    }
    for notice in &table.notices {
        let prefix = match notice.severity {
            NoticeSeverity::Info => "note",
            NoticeSeverity::Warning => "warning",
        };
        lines.push(format!("{prefix}: {}", notice.text));
    }
    lines.join("\n")
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn format_line(cells: &[String], widths: &[usize], right_aligned: &[bool]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .zip(right_aligned)
        .map(|((cell, width), right)| {
            let padding = " ".repeat(width.saturating_sub(cell.width()));
            if *right { format!("{padding}{cell}") } else { format!("{cell}{padding}") }
        })
        .collect();
    padded.join(COLUMN_GAP).trim_end().to_string()
}
