//! Interactive REPL implementation

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::engine::Engine;
use crate::error::{PaddockError, Result};
use crate::output::{format_output, OutputFormat};

pub async fn run_repl(mut engine: Engine, format: OutputFormat) -> Result<()> {
    let mut rl = DefaultEditor::new().map_err(|e| PaddockError::Config(e.to_string()))?;

    println!("Paddock v{} - Interactive Mode", env!("CARGO_PKG_VERSION"));
    println!("Type 'help' for commands, 'exit' to quit\n");

    loop {
        match rl.readline("paddock> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match line.to_lowercase().as_str() {
                    "exit" | "quit" | "q" => {
                        println!("Goodbye!");
                        break;
                    }
                    "help" | "?" => {
                        print_help();
                        continue;
                    }
                    "clear" | "cls" => {
                        print!("\x1B[2J\x1B[1;1H");
                        continue;
                    }
                    _ => {}
                }

                let _ = rl.add_history_entry(line);
                let result = engine.execute(line).await;
                println!("{}\n", format_output(&result, &format));
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"
Paddock Commands
================

TABLES:
  CREATE TABLE fleet (id TEXT, box CONTAINER)
  INSERT INTO fleet (1, 'configs/web.json')
  DROP TABLE fleet                - Drop a table and remove its containers
  SHOW TABLES

QUERIES:
  SELECT * FROM fleet WHERE id = 1
  SELECT count(*) FROM fleet
  SELECT sum(col), length(col) FROM fleet
  SELECT metadata(box).status FROM fleet
  SELECT run_cmd(box, 'ls /') FROM fleet
  SELECT box.run_cmd("cat state.json").field FROM fleet

CONTAINER ACTIONS:
  START box FROM fleet [WHERE id = 1]
  STOP | PAUSE | UNPAUSE | RESTART | KILL | REMOVE  (same shape)

REPL:
  help, ?                         - Show this help
  clear                           - Clear the screen
  exit, quit, q                   - Leave the REPL
"#
    );
}
