//! Pest grammar parser for Paddock commands

use pest::Parser;
use pest_derive::Parser;
use tracing::debug;

use crate::container::ContainerAction;
use crate::error::{PaddockError, Result};
use crate::parser::ast::*;
use crate::parser::lexer::{fold_case, split_args, split_column_list, strip_trailing_semicolon, unquote};
use crate::store::{ColumnDefinition, ColumnType};

#[derive(Parser)]
#[grammar = "../grammar/paddock.pest"]
pub struct PaddockParser;

type Pair<'i> = pest::iterators::Pair<'i, Rule>;

/// Parse one command string into a [`Statement`]
///
/// A single trailing `;` is ignored. Input that matches none of the grammar
/// rules yields [`PaddockError::InvalidQuery`].
pub fn parse_statement(input: &str) -> Result<Statement> {
    let input = strip_trailing_semicolon(input);
    let pairs = PaddockParser::parse(Rule::command, input).map_err(|e| {
        debug!(error = %e, "no grammar rule matched");
        PaddockError::InvalidQuery(input.to_string())
    })?;

    let command = pairs
        .into_iter()
        .next()
        .ok_or_else(|| PaddockError::InvalidQuery(input.to_string()))?;

    let inner = command
        .into_inner()
        .next()
        .ok_or_else(|| PaddockError::InvalidQuery(input.to_string()))?;

    match inner.as_rule() {
        Rule::create_table => parse_create_table(inner),
        Rule::insert_into => parse_insert(inner),
        Rule::select_stmt => parse_select(inner),
        Rule::drop_table => Ok(Statement::DropTable(first_identifier(inner)?)),
        Rule::show_tables => Ok(Statement::ShowTables),
        Rule::action_stmt => parse_action(inner),
        _ => Err(PaddockError::InvalidQuery(input.to_string())),
    }
}

// ============================================================================
// DDL
// ============================================================================

fn parse_create_table(pair: Pair<'_>) -> Result<Statement> {
    let mut name = None;
    let mut columns = Vec::new();

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::identifier => name = Some(identifier(&item)),
            Rule::column_def => columns.push(parse_column_def(item)?),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| PaddockError::InvalidQuery("Expected table name".to_string()))?;
    Ok(Statement::CreateTable(CreateTable { name, columns }))
}

fn parse_column_def(pair: Pair<'_>) -> Result<ColumnDefinition> {
    let mut inner = pair.into_inner();

    let name = inner
        .next()
        .map(|p| identifier(&p))
        .ok_or_else(|| PaddockError::InvalidQuery("Expected column name".to_string()))?;
    let column_type = inner
        .next()
        .ok_or_else(|| PaddockError::InvalidQuery(format!("Expected type for column {}", name)))?;

    Ok(ColumnDefinition {
        name,
        column_type: column_type.as_str().parse::<ColumnType>()?,
    })
}

// ============================================================================
// DML
// ============================================================================

fn parse_insert(pair: Pair<'_>) -> Result<Statement> {
    let mut table = None;
    let mut values = Vec::new();

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::identifier => table = Some(identifier(&item)),
            Rule::value_list => {
                values = split_args(item.as_str())
                    .iter()
                    .map(|v| unquote(v).to_string())
                    .collect();
            }
            _ => {}
        }
    }

    let table = table.ok_or_else(|| PaddockError::InvalidQuery("Expected table name".to_string()))?;
    Ok(Statement::Insert(Insert { table, values }))
}

fn parse_select(pair: Pair<'_>) -> Result<Statement> {
    let mut columns = None;
    let mut table = None;
    let mut filter = None;

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::column_list => {
                let raw = item.as_str().trim();
                columns = Some(if raw == "*" {
                    ColumnSelection::All
                } else {
                    ColumnSelection::Columns(split_column_list(&fold_case(raw)))
                });
            }
            Rule::identifier => table = Some(identifier(&item)),
            Rule::where_clause => filter = Some(parse_where_clause(item)?),
            _ => {}
        }
    }

    let columns =
        columns.ok_or_else(|| PaddockError::InvalidQuery("Expected column list".to_string()))?;
    let table = table.ok_or_else(|| PaddockError::InvalidQuery("Expected table name".to_string()))?;
    Ok(Statement::Select(Select {
        table,
        columns,
        filter,
    }))
}

fn parse_action(pair: Pair<'_>) -> Result<Statement> {
    let mut action = None;
    let mut identifiers = Vec::new();
    let mut filter = None;

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::action_kw => action = Some(item.as_str().parse::<ContainerAction>()?),
            Rule::identifier => identifiers.push(identifier(&item)),
            Rule::where_clause => filter = Some(parse_where_clause(item)?),
            _ => {}
        }
    }

    let action = action.ok_or_else(|| PaddockError::InvalidQuery("Expected action".to_string()))?;
    let mut identifiers = identifiers.into_iter();
    let (Some(column), Some(table)) = (identifiers.next(), identifiers.next()) else {
        return Err(PaddockError::InvalidQuery(
            "Expected <column> FROM <table>".to_string(),
        ));
    };

    Ok(Statement::Lifecycle(LifecycleStatement {
        action,
        column,
        table,
        filter,
    }))
}

// ============================================================================
// WHERE Clause Parsing
// ============================================================================

fn parse_where_clause(pair: Pair<'_>) -> Result<Condition> {
    let mut key = None;
    let mut value = None;

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::identifier => key = Some(identifier(&item)),
            Rule::where_value => value = Some(unquote(item.as_str()).to_string()),
            _ => {}
        }
    }

    match (key, value) {
        (Some(key), Some(value)) => Ok(Condition { key, value }),
        _ => Err(PaddockError::InvalidQuery(
            "Expected WHERE <key> = <value>".to_string(),
        )),
    }
}

fn first_identifier(pair: Pair<'_>) -> Result<String> {
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::identifier)
        .map(|p| identifier(&p))
        .ok_or_else(|| PaddockError::InvalidQuery("Expected table name".to_string()))
}

fn identifier(pair: &Pair<'_>) -> String {
    pair.as_str().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_table() {
        let stmt = parse_statement("CREATE TABLE Fleet (id TEXT, box CONTAINER)").unwrap();
        match stmt {
            Statement::CreateTable(c) => {
                assert_eq!(c.name, "fleet");
                assert_eq!(c.columns.len(), 2);
                assert_eq!(c.columns[0].name, "id");
                assert_eq!(c.columns[0].column_type, ColumnType::Text);
                assert_eq!(c.columns[1].column_type, ColumnType::Container);
            }
            _ => panic!("Expected CreateTable statement"),
        }
    }

    #[test]
    fn test_parse_create_table_unknown_type() {
        let err = parse_statement("create table t (id BLOB)").unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_COLUMN_TYPE");
    }

    #[test]
    fn test_parse_insert_keeps_literal_case() {
        let stmt = parse_statement("insert into fleet (1, 'Configs/A.json');").unwrap();
        match stmt {
            Statement::Insert(i) => {
                assert_eq!(i.table, "fleet");
                assert_eq!(i.values, vec!["1".to_string(), "Configs/A.json".to_string()]);
            }
            _ => panic!("Expected Insert statement"),
        }
    }

    #[test]
    fn test_parse_insert_comma_inside_quotes() {
        let stmt = parse_statement("insert into t ('a, b', 2)").unwrap();
        match stmt {
            Statement::Insert(i) => assert_eq!(i.values, vec!["a, b", "2"]),
            _ => panic!("Expected Insert statement"),
        }
    }

    #[test]
    fn test_parse_select_star() {
        let stmt = parse_statement("select * from fleet").unwrap();
        match stmt {
            Statement::Select(s) => {
                assert_eq!(s.table, "fleet");
                assert_eq!(s.columns, ColumnSelection::All);
                assert!(s.filter.is_none());
            }
            _ => panic!("Expected Select statement"),
        }
    }

    #[test]
    fn test_parse_select_with_where() {
        let stmt =
            parse_statement("select id, metadata(box).status from fleet where id = 1").unwrap();
        match stmt {
            Statement::Select(s) => {
                assert_eq!(
                    s.columns,
                    ColumnSelection::Columns(vec![
                        "id".to_string(),
                        "metadata(box).status".to_string()
                    ])
                );
                assert_eq!(
                    s.filter,
                    Some(Condition {
                        key: "id".to_string(),
                        value: "1".to_string()
                    })
                );
            }
            _ => panic!("Expected Select statement"),
        }
    }

    #[test]
    fn test_parse_select_from_inside_quoted_command() {
        let stmt = parse_statement("SELECT run_cmd(box, \"echo FROM here\") FROM fleet WHERE name = 'Web'")
            .unwrap();
        match stmt {
            Statement::Select(s) => {
                assert_eq!(s.table, "fleet");
                assert_eq!(
                    s.columns,
                    ColumnSelection::Columns(vec!["run_cmd(box, \"echo FROM here\")".to_string()])
                );
                assert_eq!(s.filter.unwrap().value, "Web");
            }
            _ => panic!("Expected Select statement"),
        }
    }

    #[test]
    fn test_parse_select_quoted_from_where_clause() {
        let stmt =
            parse_statement("select run_cmd(box, 'grep x from logs where level') from fleet").unwrap();
        match stmt {
            Statement::Select(s) => {
                assert_eq!(s.table, "fleet");
                assert_eq!(
                    s.columns,
                    ColumnSelection::Columns(vec![
                        "run_cmd(box, 'grep x from logs where level')".to_string()
                    ])
                );
                assert!(s.filter.is_none());
            }
            _ => panic!("Expected Select statement"),
        }

        let stmt = parse_statement(
            "select run_cmd(box, \"cat a from b where c = d\") from fleet where id = 2",
        )
        .unwrap();
        match stmt {
            Statement::Select(s) => {
                assert_eq!(s.table, "fleet");
                assert_eq!(s.filter.unwrap().value, "2");
            }
            _ => panic!("Expected Select statement"),
        }
    }

    #[test]
    fn test_parse_drop_and_show() {
        assert_eq!(
            parse_statement("drop table fleet").unwrap(),
            Statement::DropTable("fleet".to_string())
        );
        assert_eq!(parse_statement("SHOW TABLES;").unwrap(), Statement::ShowTables);
    }

    #[test]
    fn test_parse_lifecycle_statement() {
        let stmt = parse_statement("start box from fleet where id = '1'").unwrap();
        match stmt {
            Statement::Lifecycle(l) => {
                assert_eq!(l.action, ContainerAction::Start);
                assert_eq!(l.column, "box");
                assert_eq!(l.table, "fleet");
                assert_eq!(l.filter.unwrap().value, "1");
            }
            _ => panic!("Expected Lifecycle statement"),
        }

        let stmt = parse_statement("UNPAUSE box FROM fleet").unwrap();
        match stmt {
            Statement::Lifecycle(l) => {
                assert_eq!(l.action, ContainerAction::Unpause);
                assert!(l.filter.is_none());
            }
            _ => panic!("Expected Lifecycle statement"),
        }
    }

    #[test]
    fn test_parse_invalid_query() {
        let err = parse_statement("launch rockets").unwrap_err();
        assert_eq!(err.code(), "INVALID_QUERY");
        assert!(parse_statement("").is_err());
        assert!(parse_statement("drop tables fleet").is_err());
    }
}
