//! Parser for the Paddock command language

pub mod ast;
pub mod function;
pub mod grammar;
pub mod lexer;

pub use ast::*;
pub use function::{extract_function_call, function_name, FunctionCall};
pub use grammar::parse_statement;
pub use lexer::split_statements;
