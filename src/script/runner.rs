//! Script runner for files of `;`-separated statements

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::engine::{Engine, QueryResult};
use crate::error::Result;
use crate::output::{format_output, OutputFormat};
use crate::parser::split_statements;

/// Result of script execution
#[derive(Debug)]
pub struct ScriptResult {
    /// All results from executed statements
    pub results: Vec<QueryResult>,
    /// Statements that ran to completion
    pub statements_executed: usize,
    /// Whether the script completed successfully
    pub success: bool,
    /// Error message if script failed
    pub error: Option<String>,
}

/// Runs every statement of a script in one engine session
pub struct ScriptRunner {
    engine: Engine,
    /// Print each result as it is produced
    output_format: Option<OutputFormat>,
}

impl ScriptRunner {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            output_format: None,
        }
    }

    /// Print results in `format` while running
    pub fn with_output(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Load and run a script file
    pub async fn run_file(&mut self, path: &Path) -> Result<ScriptResult> {
        let content = fs::read_to_string(path)?;
        debug!(script = %path.display(), "running script");
        Ok(self.run_script(&content).await)
    }

    /// Run script text, stopping at the first statement that fails
    pub async fn run_script(&mut self, content: &str) -> ScriptResult {
        let mut results = Vec::new();
        let mut statements_executed = 0;

        for statement in split_statements(content) {
            match self.engine.try_execute(&statement).await {
                Ok(result) => {
                    statements_executed += 1;
                    if let Some(format) = &self.output_format {
                        println!("{}", format_output(&result, format));
                    }
                    results.push(result);
                }
                Err(e) => {
                    warn!(statement = %statement, "script stopped: {}", e);
                    return ScriptResult {
                        results,
                        statements_executed,
                        success: false,
                        error: Some(e.to_string()),
                    };
                }
            }
        }

        ScriptResult {
            results,
            statements_executed,
            success: true,
            error: None,
        }
    }
}
