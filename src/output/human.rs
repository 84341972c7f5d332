//! Human-readable output formatting

use serde_json::Value;

use crate::engine::QueryResult;

/// Cells wider than this wrap onto continuation lines
const MAX_CELL_WIDTH: usize = 60;

pub fn format_human(result: &QueryResult) -> String {
    if result.is_error {
        return result
            .cell(0, 0)
            .map(render_cell)
            .unwrap_or_default();
    }

    let header: Vec<Vec<String>> = result.columns.iter().map(|c| wrap(&c.name)).collect();
    let rows: Vec<Vec<Vec<String>>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|v| wrap(&render_cell(v))).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|lines| max_width(lines)).collect();
    for row in &rows {
        for (i, lines) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(max_width(lines));
            }
        }
    }

    let separator = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut output = String::new();
    output.push_str(&separator);
    output.push('\n');
    push_row(&mut output, &header, &widths);
    output.push_str(&separator);
    output.push('\n');
    for row in &rows {
        push_row(&mut output, row, &widths);
    }
    if !rows.is_empty() {
        output.push_str(&separator);
        output.push('\n');
    }
    output.push_str(&format!(
        "{} row{}",
        rows.len(),
        if rows.len() == 1 { "" } else { "s" }
    ));
    output
}

/// Strings print bare, everything else as compact JSON
fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => crate::store::format_number(f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn wrap(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in chars.chunks(MAX_CELL_WIDTH) {
            lines.push(chunk.iter().collect());
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn max_width(lines: &[String]) -> usize {
    lines.iter().map(|l| l.chars().count()).max().unwrap_or(0)
}

fn push_row(output: &mut String, cells: &[Vec<String>], widths: &[usize]) {
    let height = cells.iter().map(Vec::len).max().unwrap_or(1);
    for line in 0..height {
        output.push('|');
        for (i, width) in widths.iter().enumerate() {
            let text = cells
                .get(i)
                .and_then(|lines| lines.get(line))
                .map(String::as_str)
                .unwrap_or("");
            let pad = width - text.chars().count();
            output.push(' ');
            output.push_str(text);
            output.push_str(&" ".repeat(pad + 1));
            output.push('|');
        }
        output.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ColumnKind, ResultColumn};
    use crate::error::PaddockError;
    use serde_json::json;

    #[test]
    fn test_table_layout() {
        let mut result = QueryResult::new(vec![
            ResultColumn::new("id", ColumnKind::Number),
            ResultColumn::new("name", ColumnKind::Text),
        ]);
        result.push_row(vec![json!(1.0), json!("alpha")]);
        result.push_row(vec![json!(2.5), Value::Null]);

        let text = format_human(&result);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "+-----+-------+");
        assert_eq!(lines[1], "| id  | name  |");
        assert_eq!(lines[3], "| 1   | alpha |");
        assert_eq!(lines[4], "| 2.5 | null  |");
        assert_eq!(lines[6], "2 rows");
    }

    #[test]
    fn test_multiline_cells() {
        let mut result = QueryResult::message_column();
        result.push_row(vec![json!("one\ntwo")]);
        let text = format_human(&result);
        assert!(text.contains("| one    |\n| two    |"), "{}", text);
    }

    #[test]
    fn test_error_prints_message_only() {
        let result = QueryResult::error(&PaddockError::TableNotFound("t".to_string()));
        assert_eq!(
            format_human(&result),
            "[TABLE_OR_VIEW_NOT_FOUND] The table or view t cannot be found."
        );
    }
}
