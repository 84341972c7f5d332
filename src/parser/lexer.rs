//! Lexical helpers shared by the grammar, the function-call extractor and the
//! script runner.
//!
//! All helpers are total: unterminated quotes or unbalanced parentheses never
//! fail, the trailing partial token is simply emitted as-is.

/// Remove one trailing `;` (after trimming surrounding whitespace)
pub fn strip_trailing_semicolon(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed.strip_suffix(';').unwrap_or(trimmed)
}

/// Strip one pair of outer quotes when the value is `'...'` or `"..."`
///
/// The pair does not have to match (`'abc"` unquotes to `abc`) and the inner
/// text must be non-empty, so `''` is returned unchanged.
pub fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 3 && is_quote(bytes[0]) && is_quote(bytes[bytes.len() - 1]) {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Split function arguments on commas outside of quotes
///
/// Quote characters are consumed. A quote preceded by a backslash is kept as a
/// literal character and does not toggle quote state.
pub fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some('\'') | Some('"')) => {
                if let Some(quote) = chars.next() {
                    current.push(quote);
                }
            }
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            ',' if !in_single && !in_double => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        args.push(current.trim().to_string());
    }

    args
}

/// Split a SELECT column list on top-level commas
///
/// A comma separates columns only outside quotes and at parenthesis depth
/// zero, so `metadata(c1), run_cmd(c1, "a,b")` yields two tokens. Quotes are
/// retained in the output.
pub fn split_column_list(input: &str) -> Vec<String> {
    let mut columns = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;

    for c in input.chars() {
        let escaped = prev == Some('\\');
        prev = Some(c);

        if (c == '\'' || c == '"') && !escaped {
            match quote {
                Some(q) if q == c => quote = None,
                None => quote = Some(c),
                _ => {}
            }
            current.push(c);
            continue;
        }

        if quote.is_some() {
            current.push(c);
            continue;
        }

        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                columns.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }

    if !current.trim().is_empty() {
        columns.push(current.trim().to_string());
    }

    columns
}

/// Split a script into statements on `;` outside of quotes
///
/// Blank statements and `--` comment lines are dropped.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for line in script.lines() {
        if quote.is_none() && line.trim_start().starts_with("--") {
            continue;
        }
        for c in line.chars() {
            match (quote, c) {
                (None, '\'') | (None, '"') => quote = Some(c),
                (Some(q), _) if q == c => quote = None,
                (None, ';') => {
                    push_statement(&mut statements, &current);
                    current.clear();
                    continue;
                }
                _ => {}
            }
            current.push(c);
        }
        current.push('\n');
    }
    push_statement(&mut statements, &current);

    statements
}

/// Lowercase everything outside of quoted spans
///
/// Identifiers and keywords are case-insensitive while quoted literals (for
/// example a command passed to `run_cmd`) keep their case.
pub fn fold_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;

    for c in input.chars() {
        let escaped = prev == Some('\\');
        prev = Some(c);
        match quote {
            Some(q) => {
                if c == q && !escaped {
                    quote = None;
                }
                out.push(c);
            }
            None => {
                if (c == '\'' || c == '"') && !escaped {
                    quote = Some(c);
                    out.push(c);
                } else {
                    out.extend(c.to_lowercase());
                }
            }
        }
    }

    out
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

fn is_quote(b: u8) -> bool {
    b == b'\'' || b == b'"'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_trailing_semicolon() {
        assert_eq!(strip_trailing_semicolon("show tables;"), "show tables");
        assert_eq!(strip_trailing_semicolon("show tables"), "show tables");
        assert_eq!(strip_trailing_semicolon("  drop table t ; "), "drop table t ");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'configs/a.json'"), "configs/a.json");
        assert_eq!(unquote("\"hello\""), "hello");
        assert_eq!(unquote("'mixed\""), "mixed");
        assert_eq!(unquote("bare"), "bare");
        assert_eq!(unquote("''"), "''");
        assert_eq!(unquote("'a'b'"), "a'b");
    }

    #[test]
    fn test_split_args_consumes_quotes() {
        assert_eq!(
            split_args("c1, \"echo a,b\""),
            vec!["c1".to_string(), "echo a,b".to_string()]
        );
        assert_eq!(split_args("'x', y"), vec!["x", "y"]);
        assert!(split_args("").is_empty());
    }

    #[test]
    fn test_split_args_escaped_quote_is_literal() {
        assert_eq!(
            split_args(r#"c1, "echo \"hi\", there""#),
            vec!["c1".to_string(), r#"echo "hi", there"#.to_string()]
        );
    }

    #[test]
    fn test_split_args_unterminated_quote_emits_tail() {
        assert_eq!(split_args("c1, 'open, tail"), vec!["c1", "open, tail"]);
    }

    #[test]
    fn test_split_column_list_keeps_function_calls_whole() {
        let cols = split_column_list("metadata(c1), run_cmd(c1,\"echo a,b\")");
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0], "metadata(c1)");
        assert_eq!(cols[1], "run_cmd(c1,\"echo a,b\")");
    }

    #[test]
    fn test_split_column_list_plain_columns() {
        assert_eq!(split_column_list("id, name ,box"), vec!["id", "name", "box"]);
    }

    #[test]
    fn test_split_column_list_unbalanced_paren() {
        assert_eq!(split_column_list("id, metadata(c1"), vec!["id", "metadata(c1"]);
    }

    #[test]
    fn test_split_statements() {
        let script = "create table t (id NUMBER);\n-- a comment\ninsert into t (1);\n\ninsert into t ('a;b');";
        let statements = split_statements(script);
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[2], "insert into t ('a;b')");
    }

    #[test]
    fn test_fold_case_preserves_quoted_text() {
        assert_eq!(
            fold_case("SELECT Run_Cmd(Box, \"echo HELLO\") FROM Fleet"),
            "select run_cmd(box, \"echo HELLO\") from fleet"
        );
        assert_eq!(fold_case("WHERE Name = 'Web'"), "where name = 'Web'");
    }
}
