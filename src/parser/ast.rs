//! Statement definitions for the Paddock command language

use serde::Serialize;

use crate::container::ContainerAction;
use crate::store::ColumnDefinition;

/// One parsed command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    CreateTable(CreateTable),
    Insert(Insert),
    Select(Select),
    DropTable(String),
    ShowTables,
    Lifecycle(LifecycleStatement),
}

impl Statement {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::CreateTable(_) => "create_table",
            Statement::Insert(_) => "insert",
            Statement::Select(_) => "select",
            Statement::DropTable(_) => "drop_table",
            Statement::ShowTables => "show_tables",
            Statement::Lifecycle(_) => "lifecycle",
        }
    }
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

/// INSERT INTO statement; values are positional and already unquoted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insert {
    pub table: String,
    pub values: Vec<String>,
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Select {
    pub table: String,
    pub columns: ColumnSelection,
    pub filter: Option<Condition>,
}

/// Projection list of a SELECT
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ColumnSelection {
    /// `*`: every declared column in declaration order
    All,
    /// Raw column tokens, case-folded outside quotes
    Columns(Vec<String>),
}

/// `WHERE key = value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub key: String,
    pub value: String,
}

/// `<action> <column> FROM <table> [WHERE ...]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleStatement {
    pub action: ContainerAction,
    pub column: String,
    pub table: String,
    pub filter: Option<Condition>,
}
