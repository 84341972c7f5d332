//! `<action> <column> FROM <table> [WHERE ...]` statements

use serde_json::Value;
use tracing::debug;

use crate::engine::result::QueryResult;
use crate::error::{PaddockError, Result};
use crate::parser::LifecycleStatement;
use crate::store::{Cell, HandleId, Store};

/// Run the action on every CONTAINER cell of the column, or on the first
/// row matching the WHERE condition
pub(crate) async fn lifecycle(store: &mut Store, stmt: &LifecycleStatement) -> Result<QueryResult> {
    let table = store.table(&stmt.table)?;
    let index = table
        .column_index(&stmt.column)
        .filter(|_| table.is_container_column(&stmt.column))
        .ok_or_else(|| PaddockError::InvalidColumn {
            table: stmt.table.clone(),
            column: stmt.column.clone(),
        })?;

    let rows = match &stmt.filter {
        Some(condition) => {
            let first = store
                .matching_rows(table, Some(condition))
                .into_iter()
                .next()
                .ok_or_else(|| PaddockError::NoMatchingRow {
                    key: condition.key.clone(),
                    value: condition.value.clone(),
                })?;
            vec![first]
        }
        None => table.rows.clone(),
    };

    let targets: Vec<HandleId> = rows
        .iter()
        .filter_map(|row| match row[index] {
            Cell::Container(id) => Some(id),
            _ => None,
        })
        .collect();
    debug!(action = %stmt.action, table = %stmt.table, targets = targets.len(), "lifecycle");

    let mut result = QueryResult::message_column();
    for id in targets {
        if let Some(handle) = store.handle_mut(id) {
            let message = handle.perform(stmt.action).await;
            result.push_row(vec![Value::from(message)]);
        }
    }
    Ok(result)
}
