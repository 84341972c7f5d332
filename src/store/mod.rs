//! In-memory relational store
//!
//! Owns every table and the arena of container handles. CONTAINER cells hold
//! a [`HandleId`] into the arena rather than the handle itself, so rows stay
//! plain data that can be cloned while handles are driven through `&mut`.

mod cell;
mod schema;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::container::{ContainerHandle, ContainerRuntime, SpecLoader};
use crate::error::{PaddockError, Result};
use crate::parser::Condition;

pub use cell::{coerce_number, format_number, loosely_equals, Cell, HandleId};
pub use schema::{describe_columns, ColumnDefinition, ColumnType, Row, Table};

/// Counts reported by a successful INSERT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    pub affected: usize,
    pub inserted: usize,
}

/// One entry of SHOW TABLES
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableListing {
    pub name: String,
    /// Column definitions as a JSON array
    pub columns: String,
}

pub struct Store {
    runtime: Arc<dyn ContainerRuntime>,
    loader: SpecLoader,
    tables: BTreeMap<String, Table>,
    handles: HashMap<HandleId, ContainerHandle>,
    next_handle: u64,
}

impl Store {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, loader: SpecLoader) -> Self {
        Self {
            runtime,
            loader,
            tables: BTreeMap::new(),
            handles: HashMap::new(),
            next_handle: 0,
        }
    }

    pub fn create_table(
        &mut self,
        name: &str,
        columns: Vec<ColumnDefinition>,
    ) -> Result<&[ColumnDefinition]> {
        if self.tables.contains_key(name) {
            return Err(PaddockError::TableAlreadyExists(name.to_string()));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(PaddockError::DuplicateColumn(column.name.clone()));
            }
        }

        info!(table = name, columns = %describe_columns(&columns), "table created");
        let table = self
            .tables
            .entry(name.to_string())
            .or_insert_with(|| Table::new(name.to_string(), columns));
        Ok(&table.columns)
    }

    /// Append one row, coercing each positional value to its column's type
    ///
    /// Values beyond the column count are ignored and missing ones become
    /// [`Cell::Null`].
    pub fn insert_row(&mut self, name: &str, values: &[String]) -> Result<InsertOutcome> {
        let columns = self
            .tables
            .get(name)
            .map(|t| t.columns.clone())
            .ok_or_else(|| PaddockError::TableNotFound(name.to_string()))?;

        if values.len() != columns.len() {
            warn!(
                table = name,
                expected = columns.len(),
                got = values.len(),
                "value count does not match column count"
            );
        }

        let mut row = Row::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let cell = match values.get(i) {
                None => Cell::Null,
                Some(raw) => match column.column_type {
                    ColumnType::Text => Cell::Text(raw.clone()),
                    ColumnType::Number => Cell::Number(coerce_number(raw)),
                    ColumnType::Container => Cell::Container(self.new_handle(raw)),
                },
            };
            row.push(cell);
        }

        if let Some(table) = self.tables.get_mut(name) {
            table.rows.push(row);
        }
        debug!(table = name, "row inserted");
        Ok(InsertOutcome {
            affected: 1,
            inserted: 1,
        })
    }

    fn new_handle(&mut self, reference: &str) -> HandleId {
        let id = HandleId(self.next_handle);
        self.next_handle += 1;
        let handle = ContainerHandle::new(reference, self.runtime.clone(), self.loader.clone());
        self.handles.insert(id, handle);
        id
    }

    /// Drop a table, removing every unit its CONTAINER cells created
    ///
    /// Removal is best effort: failures are logged and the drop goes on.
    pub async fn drop_table(&mut self, name: &str) -> Result<()> {
        let table = self
            .tables
            .remove(name)
            .ok_or_else(|| PaddockError::TableNotFound(name.to_string()))?;

        let ids = table.rows.iter().flatten().filter_map(|cell| match cell {
            Cell::Container(id) => Some(*id),
            _ => None,
        });

        for id in ids {
            let Some(mut handle) = self.handles.remove(&id) else {
                continue;
            };
            if handle.unit().is_none() {
                continue;
            }
            let message = handle.remove().await;
            debug!(table = name, container = %handle.name(), "{}", message);
        }

        info!(table = name, "table dropped");
        Ok(())
    }

    pub fn list_tables(&self) -> Vec<TableListing> {
        self.tables
            .values()
            .map(|t| TableListing {
                name: t.name.clone(),
                columns: serde_json::to_string(&t.columns).unwrap_or_default(),
            })
            .collect()
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| PaddockError::TableNotFound(name.to_string()))
    }

    pub fn handle(&self, id: HandleId) -> Option<&ContainerHandle> {
        self.handles.get(&id)
    }

    pub fn handle_mut(&mut self, id: HandleId) -> Option<&mut ContainerHandle> {
        self.handles.get_mut(&id)
    }

    /// Loose comparison of a cell against a WHERE literal
    ///
    /// CONTAINER cells compare by the reference they were inserted with.
    pub fn cell_matches(&self, cell: &Cell, literal: &str) -> bool {
        match cell {
            Cell::Container(id) => self
                .handles
                .get(id)
                .is_some_and(|h| h.reference() == literal),
            other => loosely_equals(other, literal),
        }
    }

    /// Rows of `table` that satisfy `filter`, in insertion order
    pub fn matching_rows(&self, table: &Table, filter: Option<&Condition>) -> Vec<Row> {
        let Some(condition) = filter else {
            return table.rows.clone();
        };
        let Some(index) = table.column_index(&condition.key) else {
            debug!(table = %table.name, key = %condition.key, "where column not declared");
            return Vec::new();
        };
        table
            .rows
            .iter()
            .filter(|row| self.cell_matches(&row[index], &condition.value))
            .cloned()
            .collect()
    }

    /// Text shown when a cell is projected as a plain column
    pub fn cell_value(&self, cell: &Cell) -> serde_json::Value {
        match cell {
            Cell::Null => serde_json::Value::Null,
            Cell::Text(s) => serde_json::Value::from(s.clone()),
            Cell::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::from(format_number(*n))),
            Cell::Container(id) => self
                .handles
                .get(id)
                .map(|h| serde_json::Value::from(h.reference()))
                .unwrap_or(serde_json::Value::Null),
        }
    }
}
