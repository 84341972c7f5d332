//! Table schema: column types and definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PaddockError;
use crate::store::Cell;

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Text,
    Number,
    Container,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Number => write!(f, "NUMBER"),
            ColumnType::Container => write!(f, "CONTAINER"),
        }
    }
}

impl FromStr for ColumnType {
    type Err = PaddockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TEXT" => Ok(ColumnType::Text),
            "NUMBER" => Ok(ColumnType::Number),
            // DOCKER is the legacy spelling of CONTAINER
            "CONTAINER" | "DOCKER" => Ok(ColumnType::Container),
            other => Err(PaddockError::UnknownColumnType(other.to_string())),
        }
    }
}

/// A column declared by CREATE TABLE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl fmt::Display for ColumnDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.column_type)
    }
}

/// One row; cells are positional and aligned with the table's columns
pub type Row = Vec<Cell>;

/// A live table: immutable schema plus append-only rows
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: String, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name,
            columns,
            rows: Vec::new(),
        }
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether `name` is declared with type CONTAINER
    pub fn is_container_column(&self, name: &str) -> bool {
        self.column(name)
            .is_some_and(|c| c.column_type == ColumnType::Container)
    }
}

/// `(id TEXT, box CONTAINER)`
pub fn describe_columns(columns: &[ColumnDefinition]) -> String {
    let cols: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    format!("({})", cols.join(", "))
}
