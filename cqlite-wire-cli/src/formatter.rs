//! cqlsh-style table output for decoded rows

use colored::Colorize;
use cqlite_wire::{Row, Value};

pub const COLUMN_SEPARATOR: &str = " | ";
pub const HEADER_BORDER_CHAR: char = '-';
pub const HEADER_SEPARATOR_JUNCTION: &str = "-+-";
pub const ROW_PREFIX: &str = " ";

/// Collects headers and rendered cells, then lays them out as a table
#[derive(Debug, Default)]
pub struct TableFormatter {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    total_rows: usize,
    colors: bool,
}

impl TableFormatter {
    pub fn new(headers: Vec<String>, colors: bool) -> Self {
        Self {
            headers,
            colors,
            ..Self::default()
        }
    }

    /// Add decoded rows, rendering at most `limit` of them
    pub fn add_rows(&mut self, rows: &[Row], limit: Option<usize>) {
        let shown = limit.unwrap_or(rows.len()).min(rows.len());
        self.rows.extend(
            rows[..shown]
                .iter()
                .map(|row| row.iter().map(Value::to_string).collect()),
        );
        self.total_rows += rows.len();
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }
        widths
    }

    /// Headers left-aligned, cells right-aligned, row count last
    pub fn format(&self) -> String {
        let widths = self.column_widths();
        let mut result = String::new();

        result.push_str(ROW_PREFIX);
        for (i, header) in self.headers.iter().enumerate() {
            if i > 0 {
                result.push_str(COLUMN_SEPARATOR);
            }
            let cell = format!("{:<width$}", header, width = widths[i]);
            if self.colors {
                result.push_str(&cell.bold().to_string());
            } else {
                result.push_str(&cell);
            }
        }
        result.push('\n');

        result.push(HEADER_BORDER_CHAR);
        for (i, &width) in widths.iter().enumerate() {
            if i > 0 {
                result.push_str(HEADER_SEPARATOR_JUNCTION);
            }
            result.push_str(&HEADER_BORDER_CHAR.to_string().repeat(width));
        }
        result.push(HEADER_BORDER_CHAR);
        result.push('\n');

        for row in &self.rows {
            result.push_str(ROW_PREFIX);
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    result.push_str(COLUMN_SEPARATOR);
                }
                result.push_str(&format!("{:>width$}", cell, width = widths[i]));
            }
            result.push('\n');
        }

        let hidden = self.total_rows - self.rows.len();
        if hidden > 0 {
            result.push_str(&format!("{}... {} more row(s)\n", ROW_PREFIX, hidden));
        }

        result.push('\n');
        result.push_str(&format!("({} rows)", self.total_rows));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_layout() {
        let mut formatter = TableFormatter::new(vec!["int".into(), "text".into()], false);
        formatter.add_rows(
            &[
                vec![Value::Int32(42), Value::Text("hello".into())],
                vec![Value::Null, Value::Text(String::new())],
            ],
            None,
        );

        let expected = concat!(
            " int  | text   \n",
            "------+---------\n",
            "   42 | 'hello'\n",
            " NULL |      ''\n",
            "\n",
            "(2 rows)"
        );
        assert_eq!(formatter.format(), expected);
    }

    #[test]
    fn test_row_limit() {
        let mut formatter = TableFormatter::new(vec!["int".into()], false);
        let rows: Vec<Row> = (0..5).map(|i| vec![Value::Int32(i)]).collect();
        formatter.add_rows(&rows, Some(2));

        let output = formatter.format();
        assert!(output.contains("... 3 more row(s)"));
        assert!(output.ends_with("(5 rows)"));
    }
}
