//! Query engine
//!
//! One [`Engine`] is one session: it owns the store and processes a single
//! statement to completion before the next one is accepted (`&mut self`).

mod lifecycle;
mod result;
mod select;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::container::{ContainerRuntime, SpecLoader};
use crate::error::Result;
use crate::parser::{parse_statement, Statement};
use crate::store::{describe_columns, Store};

pub use result::{ColumnKind, QueryResult, ResultColumn};
pub use select::{extract_json, nested_property};

pub struct Engine {
    store: Store,
}

impl Engine {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, loader: SpecLoader) -> Self {
        Self {
            store: Store::new(runtime, loader),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Execute one statement; errors come back as a one-row error result
    pub async fn execute(&mut self, input: &str) -> QueryResult {
        match self.try_execute(input).await {
            Ok(result) => result,
            Err(err) => {
                warn!(code = err.code(), "{}", err);
                QueryResult::error(&err)
            }
        }
    }

    /// Execute one statement, surfacing structural errors
    pub async fn try_execute(&mut self, input: &str) -> Result<QueryResult> {
        let statement = parse_statement(input)?;
        self.run(&statement).await
    }

    /// Execute an already parsed statement
    pub async fn run(&mut self, statement: &Statement) -> Result<QueryResult> {
        debug!(kind = statement.kind(), "dispatch");

        match statement {
            Statement::CreateTable(create) => {
                let columns = self.store.create_table(&create.name, create.columns.clone())?;
                Ok(QueryResult::message(format!(
                    "create table {} {} was successfully executed.",
                    create.name,
                    describe_columns(columns)
                )))
            }
            Statement::Insert(insert) => {
                let outcome = self.store.insert_row(&insert.table, &insert.values)?;
                let mut result = QueryResult::new(vec![
                    ResultColumn::new("num_affected_rows", ColumnKind::Number),
                    ResultColumn::new("num_inserted_rows", ColumnKind::Number),
                ]);
                result.push_row(vec![outcome.affected.into(), outcome.inserted.into()]);
                Ok(result)
            }
            Statement::Select(stmt) => select::select(&mut self.store, stmt).await,
            Statement::DropTable(name) => {
                self.store.drop_table(name).await?;
                info!(table = %name, "Table and its records have been dropped");
                Ok(QueryResult::message(format!(
                    "drop table {} was successfully executed.",
                    name
                )))
            }
            Statement::ShowTables => {
                let mut result = QueryResult::new(vec![
                    ResultColumn::new("tableName", ColumnKind::Text),
                    ResultColumn::new("columns", ColumnKind::Text),
                ]);
                for table in self.store.list_tables() {
                    result.push_row(vec![table.name.into(), table.columns.into()]);
                }
                Ok(result)
            }
            Statement::Lifecycle(stmt) => lifecycle::lifecycle(&mut self.store, stmt).await,
        }
    }
}
