//! Structured query results handed to front-ends

use serde::Serialize;
use serde_json::Value;

use crate::error::PaddockError;
use crate::store::ColumnType;

/// Inferred kind of a result column, used by renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnKind {
    Text,
    Number,
    Container,
    Metadata,
    Run,
    Action,
    Error,
}

impl From<ColumnType> for ColumnKind {
    fn from(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Text => ColumnKind::Text,
            ColumnType::Number => ColumnKind::Number,
            ColumnType::Container => ColumnKind::Container,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Column metadata plus ordered rows of cell values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<Value>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl QueryResult {
    pub fn new(columns: Vec<ResultColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            is_error: false,
        }
    }

    /// Empty result with a single `result` text column
    pub fn message_column() -> Self {
        Self::new(vec![ResultColumn::new("result", ColumnKind::Text)])
    }

    /// Single `result` column with one message row
    pub fn message(text: impl Into<String>) -> Self {
        let mut result = Self::message_column();
        result.push_row(vec![Value::from(text.into())]);
        result
    }

    /// One-row, one-column result carrying `[CODE] message`
    pub fn error(err: &PaddockError) -> Self {
        Self {
            columns: vec![ResultColumn::new("error", ColumnKind::Error)],
            rows: vec![vec![Value::from(err.to_string())]],
            is_error: true,
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row)?.get(column)
    }

    /// Rows with column metadata as row 0
    pub fn to_table(&self) -> Vec<Vec<Value>> {
        let header = self
            .columns
            .iter()
            .map(|c| serde_json::json!({ "name": c.name, "type": c.kind }))
            .collect();
        std::iter::once(header).chain(self.rows.iter().cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_result() {
        let result = QueryResult::error(&PaddockError::TableNotFound("t".to_string()));
        assert!(result.is_error);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(
            result.cell(0, 0).unwrap(),
            "[TABLE_OR_VIEW_NOT_FOUND] The table or view t cannot be found."
        );
    }

    #[test]
    fn test_to_table_puts_metadata_first() {
        let mut result = QueryResult::new(vec![
            ResultColumn::new("id", ColumnKind::Number),
            ResultColumn::new("metadata(box)", ColumnKind::Metadata),
        ]);
        result.push_row(vec![Value::from(1), Value::from("x")]);

        let table = result.to_table();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0][1]["type"], "METADATA");
        assert_eq!(table[1][0], 1);
    }
}
