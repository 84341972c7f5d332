//! Function-call extraction for SELECT column tokens
//!
//! Accepts both call styles used by column expressions:
//!
//! - `metadata(box).status` / `run_cmd(box, "echo hi")`
//! - `box.run_cmd("echo hi").pid` (the receiver becomes the first argument)

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PaddockError, Result};
use crate::parser::lexer::split_args;

static NESTED_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.([A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)$").unwrap());

static FUNCTION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// A parsed `name(target, args...)[.path]` column expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    /// First argument; the column the function operates on
    pub target: String,
    /// Function name, e.g. `metadata`, `run_cmd`, `start`
    pub name: String,
    /// Remaining arguments with quotes stripped
    pub args: Vec<String>,
    /// Dotted accessor written after the closing parenthesis
    pub path: Option<String>,
}

/// Return the function name of a column token, if it looks like a call
pub fn function_name(token: &str) -> Option<&str> {
    let head = &token[..token.find('(')?];
    let name = head.rsplit('.').next().unwrap_or(head).trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Parse a column token into a [`FunctionCall`]
pub fn extract_function_call(token: &str) -> Result<FunctionCall> {
    let token = token.trim();
    let malformed = || PaddockError::MalformedFunctionCall(token.to_string());

    let open = token.find('(').ok_or_else(malformed)?;
    let close = matching_paren(token, open).ok_or_else(malformed)?;

    let path = match &token[close + 1..] {
        "" => None,
        suffix => {
            let caps = NESTED_PATH.captures(suffix).ok_or_else(malformed)?;
            Some(caps[1].to_string())
        }
    };

    let head = token[..open].trim();
    let (receiver, name) = match head.rsplit_once('.') {
        Some((receiver, name)) => (Some(receiver.trim()), name.trim()),
        None => (None, head),
    };
    if !FUNCTION_NAME.is_match(name) {
        return Err(malformed());
    }

    let mut params = split_args(&token[open + 1..close]);
    if let Some(receiver) = receiver {
        if receiver.is_empty() {
            return Err(malformed());
        }
        params.insert(0, receiver.to_string());
    }

    if params.first().map_or(true, |p| p.is_empty()) {
        return Err(PaddockError::InsufficientArguments(token.to_string()));
    }

    let target = params.remove(0);
    Ok(FunctionCall {
        target,
        name: name.to_string(),
        args: params,
        path,
    })
}

/// Find the `)` closing the `(` at `open`, skipping quoted spans
fn matching_paren(token: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;

    for (i, c) in token[open..].char_indices() {
        let escaped = prev == Some('\\');
        prev = Some(c);
        match quote {
            Some(q) if c == q && !escaped => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' if !escaped => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(open + i);
                    }
                }
                _ => {}
            },
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_metadata_with_path() {
        let call = extract_function_call("metadata(box).status").unwrap();
        assert_eq!(call.name, "metadata");
        assert_eq!(call.target, "box");
        assert!(call.args.is_empty());
        assert_eq!(call.path.as_deref(), Some("status"));
    }

    #[test]
    fn test_extract_run_cmd_with_quoted_comma() {
        let call = extract_function_call("run_cmd(c1, \"echo a,b\")").unwrap();
        assert_eq!(call.name, "run_cmd");
        assert_eq!(call.target, "c1");
        assert_eq!(call.args, vec!["echo a,b".to_string()]);
        assert_eq!(call.path, None);
    }

    #[test]
    fn test_extract_method_style() {
        let call = extract_function_call("c1.run_cmd(\"echo hi\").pid").unwrap();
        assert_eq!(call.name, "run_cmd");
        assert_eq!(call.target, "c1");
        assert_eq!(call.args, vec!["echo hi".to_string()]);
        assert_eq!(call.path.as_deref(), Some("pid"));
    }

    #[test]
    fn test_extract_nested_dotted_path() {
        let call = extract_function_call("run_cmd(db, 'cat info.json').a.b").unwrap();
        assert_eq!(call.args, vec!["cat info.json".to_string()]);
        assert_eq!(call.path.as_deref(), Some("a.b"));
    }

    #[test]
    fn test_extract_lifecycle_token() {
        let call = extract_function_call("start(box)").unwrap();
        assert_eq!(call.name, "start");
        assert_eq!(call.target, "box");
    }

    #[test]
    fn test_extract_paren_inside_quotes() {
        let call = extract_function_call("run_cmd(box, 'echo )')").unwrap();
        assert_eq!(call.args, vec!["echo )".to_string()]);
    }

    #[test]
    fn test_extract_missing_paren_is_malformed() {
        let err = extract_function_call("metadata").unwrap_err();
        assert_eq!(err.code(), "MALFORMED_FUNCTION_CALL");

        let err = extract_function_call("metadata(box").unwrap_err();
        assert_eq!(err.code(), "MALFORMED_FUNCTION_CALL");

        let err = extract_function_call("metadata(box) extra").unwrap_err();
        assert_eq!(err.code(), "MALFORMED_FUNCTION_CALL");
    }

    #[test]
    fn test_extract_requires_target() {
        let err = extract_function_call("metadata()").unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_ARGUMENTS");
    }

    #[test]
    fn test_function_name() {
        assert_eq!(function_name("count(*)"), Some("count"));
        assert_eq!(function_name("c1.run_cmd('x')"), Some("run_cmd"));
        assert_eq!(function_name("plain"), None);
    }
}
