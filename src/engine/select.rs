//! SELECT projection
//!
//! Every column token is classified once against the table schema. Rows are
//! then evaluated one at a time and, within a row, left to right; each
//! container call is awaited before the next starts.

use serde_json::Value;
use tracing::debug;

use crate::container::{ContainerAction, NO_RESULT, PROPERTY_NOT_FOUND};
use crate::engine::result::{ColumnKind, QueryResult, ResultColumn};
use crate::error::{PaddockError, Result};
use crate::parser::{extract_function_call, function_name, ColumnSelection, FunctionCall, Select};
use crate::store::{format_number, Cell, ColumnDefinition, ColumnType, Row, Store};

const INVALID_METADATA_COLUMN: &str = "Invalid Container column";
const INVALID_CONTAINER_COLUMN: &str = "Invalid CONTAINER column";

/// How one selected column is computed
#[derive(Debug, Clone)]
enum Projection {
    Plain(Option<usize>),
    Count,
    Sum(Option<usize>),
    Length(Option<usize>),
    Metadata(Target, FunctionCall),
    RunCmd(Target, FunctionCall),
    Action(ContainerAction, Target, FunctionCall),
}

/// Resolved function target: the column index if it is a CONTAINER column
type Target = Option<usize>;

impl Projection {
    fn kind(&self, columns: &[ColumnDefinition]) -> ColumnKind {
        match self {
            Projection::Plain(Some(i)) => columns[*i].column_type.into(),
            Projection::Plain(None) => ColumnKind::Text,
            Projection::Count | Projection::Sum(_) | Projection::Length(_) => ColumnKind::Number,
            Projection::Metadata(..) => ColumnKind::Metadata,
            Projection::RunCmd(..) => ColumnKind::Run,
            Projection::Action(..) => ColumnKind::Action,
        }
    }
}

fn classify(token: &str, columns: &[ColumnDefinition]) -> Result<Projection> {
    let index_of = |name: &str| columns.iter().position(|c| c.name == name);
    let container_index = |name: &str| {
        columns
            .iter()
            .position(|c| c.name == name && c.column_type == ColumnType::Container)
    };

    let Some(name) = function_name(token) else {
        return Ok(Projection::Plain(index_of(token)));
    };

    match name {
        "count" => Ok(Projection::Count),
        "sum" => {
            let call = extract_function_call(token)?;
            Ok(Projection::Sum(index_of(&call.target)))
        }
        "length" => {
            let call = extract_function_call(token)?;
            Ok(Projection::Length(index_of(&call.target)))
        }
        "metadata" => {
            let call = extract_function_call(token)?;
            Ok(Projection::Metadata(container_index(&call.target), call))
        }
        "run_cmd" => {
            let call = extract_function_call(token)?;
            if call.args.is_empty() {
                return Err(PaddockError::InsufficientArguments(token.to_string()));
            }
            Ok(Projection::RunCmd(container_index(&call.target), call))
        }
        other => {
            let action = other.parse::<ContainerAction>()?;
            let call = extract_function_call(token)?;
            Ok(Projection::Action(action, container_index(&call.target), call))
        }
    }
}

pub(crate) async fn select(store: &mut Store, stmt: &Select) -> Result<QueryResult> {
    let table = store.table(&stmt.table)?;
    let columns = table.columns.clone();
    let rows = store.matching_rows(table, stmt.filter.as_ref());

    let tokens: Vec<String> = match &stmt.columns {
        ColumnSelection::All => columns.iter().map(|c| c.name.clone()).collect(),
        ColumnSelection::Columns(tokens) => tokens.clone(),
    };

    let projections = tokens
        .iter()
        .map(|t| classify(t, &columns))
        .collect::<Result<Vec<_>>>()?;
    debug!(table = %stmt.table, rows = rows.len(), ?projections, "select");

    let header = tokens
        .iter()
        .zip(&projections)
        .map(|(token, p)| ResultColumn::new(token.clone(), p.kind(&columns)))
        .collect::<Vec<_>>();

    // count short-circuits everything else
    if let Some(position) = projections.iter().position(|p| matches!(p, Projection::Count)) {
        let mut result = QueryResult::new(vec![header[position].clone()]);
        result.push_row(vec![Value::from(rows.len())]);
        return Ok(result);
    }

    let mut result = QueryResult::new(header);
    let per_row = projections.iter().any(|p| !matches!(p, Projection::Sum(_)));
    let mut sums = vec![0.0_f64; projections.len()];

    for row in &rows {
        let mut values = Vec::with_capacity(projections.len());
        for (i, projection) in projections.iter().enumerate() {
            let value = match projection {
                Projection::Sum(index) => {
                    if let Some(n) = index.and_then(|ix| numeric(&row[ix])) {
                        sums[i] += n;
                    }
                    Value::Null
                }
                other => evaluate(store, other, row).await,
            };
            values.push(value);
        }
        if per_row {
            result.push_row(values);
        }
    }

    if projections.iter().any(|p| matches!(p, Projection::Sum(_))) {
        let trailer = projections
            .iter()
            .zip(&sums)
            .map(|(p, sum)| match p {
                Projection::Sum(_) => number_value(*sum),
                _ => Value::Null,
            })
            .collect();
        result.push_row(trailer);
    }

    Ok(result)
}

async fn evaluate(store: &mut Store, projection: &Projection, row: &Row) -> Value {
    match projection {
        Projection::Plain(Some(index)) => store.cell_value(&row[*index]),
        Projection::Plain(None) => Value::Null,
        Projection::Length(index) => match index.map(|ix| store.cell_value(&row[ix])) {
            Some(Value::String(s)) => Value::from(s.chars().count()),
            Some(Value::Number(n)) => {
                let text = n.as_f64().map(format_number).unwrap_or_else(|| n.to_string());
                Value::from(text.chars().count())
            }
            _ => Value::Null,
        },
        Projection::Metadata(None, _) => Value::from(INVALID_METADATA_COLUMN),
        Projection::Metadata(Some(index), call) => {
            let Some(handle) = container_id(row, *index).and_then(|id| store.handle(id)) else {
                return Value::from(NO_RESULT);
            };
            // an explicit field argument wins over the accessor suffix
            let (field, path) = match call.args.first() {
                Some(field) => (Some(field.as_str()), call.path.as_deref()),
                None => match call.path.as_deref().map(|p| p.split_once('.').unwrap_or((p, ""))) {
                    Some((head, rest)) => (Some(head), (!rest.is_empty()).then_some(rest)),
                    None => (None, None),
                },
            };
            let value = handle.metadata(field).await;
            match path {
                Some(path) if value != Value::from(NO_RESULT) => {
                    nested_property(&value, path).unwrap_or_else(|| Value::from(PROPERTY_NOT_FOUND))
                }
                _ => value,
            }
        }
        Projection::RunCmd(None, _) | Projection::Action(_, None, _) => {
            Value::from(INVALID_CONTAINER_COLUMN)
        }
        Projection::RunCmd(Some(index), call) => {
            let Some(handle) = container_id(row, *index).and_then(|id| store.handle(id)) else {
                return Value::from(NO_RESULT);
            };
            let output = handle.run_command(&call.args[0]).await;
            let path = call.args.get(1).map(String::as_str).or(call.path.as_deref());
            render_text(output, path)
        }
        Projection::Action(action, Some(index), call) => {
            let Some(handle) = container_id(row, *index).and_then(|id| store.handle_mut(id)) else {
                return Value::from(NO_RESULT);
            };
            let output = handle.perform(*action).await;
            render_text(output, call.path.as_deref())
        }
        Projection::Count | Projection::Sum(_) => Value::Null,
    }
}

fn container_id(row: &Row, index: usize) -> Option<crate::store::HandleId> {
    match row.get(index) {
        Some(Cell::Container(id)) => Some(*id),
        _ => None,
    }
}

/// Raw text, or a property of the JSON object embedded in it
fn render_text(output: String, path: Option<&str>) -> Value {
    match path {
        Some(path) => extract_json(&output)
            .and_then(|json| nested_property(&json, path))
            .unwrap_or_else(|| Value::from(PROPERTY_NOT_FOUND)),
        None if output.is_empty() => Value::from(NO_RESULT),
        None => Value::from(output),
    }
}

fn numeric(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if !n.is_nan() => Some(*n),
        Cell::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn number_value(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Parse the outermost `{...}` span of `text`
pub fn extract_json(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Follow a dotted path through objects and arrays
pub fn nested_property(value: &Value, path: &str) -> Option<Value> {
    path.split('.')
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
            _ => None,
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json() {
        assert_eq!(
            extract_json("noise {\"a\": {\"b\": 1}} trailing"),
            Some(json!({"a": {"b": 1}}))
        );
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
        assert_eq!(extract_json("{broken"), None);
    }

    #[test]
    fn test_nested_property() {
        let value = json!({"a": {"b": [10, {"c": "x"}]}});
        assert_eq!(nested_property(&value, "a.b.1.c"), Some(json!("x")));
        assert_eq!(nested_property(&value, "a.b.0"), Some(json!(10)));
        assert_eq!(nested_property(&value, "a.missing"), None);
        assert_eq!(nested_property(&value, "a.b.c"), None);
    }

    #[test]
    fn test_render_text() {
        assert_eq!(render_text(String::new(), None), json!(NO_RESULT));
        assert_eq!(render_text("hi".to_string(), None), json!("hi"));
        assert_eq!(
            render_text(r#"{ "ok": 1 }"#.to_string(), Some("ok")),
            json!(1)
        );
        assert_eq!(
            render_text("plain".to_string(), Some("ok")),
            json!(PROPERTY_NOT_FOUND)
        );
    }

    #[test]
    fn test_classify() {
        let columns = vec![
            ColumnDefinition {
                name: "id".to_string(),
                column_type: ColumnType::Number,
            },
            ColumnDefinition {
                name: "box".to_string(),
                column_type: ColumnType::Container,
            },
        ];
        assert!(matches!(classify("id", &columns).unwrap(), Projection::Plain(Some(0))));
        assert!(matches!(classify("nope", &columns).unwrap(), Projection::Plain(None)));
        assert!(matches!(classify("count(*)", &columns).unwrap(), Projection::Count));
        assert!(matches!(classify("sum(id)", &columns).unwrap(), Projection::Sum(Some(0))));
        assert!(matches!(
            classify("metadata(id)", &columns).unwrap(),
            Projection::Metadata(None, _)
        ));
        assert!(matches!(
            classify("box.run_cmd('ls')", &columns).unwrap(),
            Projection::RunCmd(Some(1), _)
        ));
        assert!(matches!(
            classify("stop(box)", &columns).unwrap(),
            Projection::Action(ContainerAction::Stop, Some(1), _)
        ));
        assert_eq!(classify("explode(box)", &columns).unwrap_err().code(), "UNKNOWN_FUNCTION");
        assert_eq!(
            classify("run_cmd(box)", &columns).unwrap_err().code(),
            "INSUFFICIENT_ARGUMENTS"
        );
        assert_eq!(
            classify("metadata(box", &columns).unwrap_err().code(),
            "MALFORMED_FUNCTION_CALL"
        );
    }
}
