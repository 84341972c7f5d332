//! Paddock - SQL-like tables whose cells drive containers
//!
//! Tables are declared and queried with a small SQL-like language. A column
//! of type `CONTAINER` holds a handle to an external unit; selecting through
//! it fetches live metadata, runs commands inside the unit, or invokes
//! lifecycle actions.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use paddock::{DockerCli, Engine, OutputFormat, SpecLoader, format_output};
//!
//! # async fn demo() {
//! let mut engine = Engine::new(Arc::new(DockerCli::default()), SpecLoader::default());
//! engine.execute("create table fleet (id TEXT, box CONTAINER)").await;
//! engine.execute("insert into fleet (1, 'configs/web.json')").await;
//! engine.execute("start box from fleet where id = 1").await;
//! let result = engine.execute("select id, metadata(box).status from fleet").await;
//! println!("{}", format_output(&result, &OutputFormat::Human));
//! # }
//! ```

pub mod cli;
pub mod container;
pub mod engine;
pub mod error;
pub mod output;
pub mod parser;
pub mod script;
pub mod server;
pub mod store;

#[cfg(feature = "repl")]
pub mod repl;

pub use container::{ContainerAction, ContainerHandle, ContainerRuntime, DockerCli, SpecLoader};
pub use engine::{Engine, QueryResult};
pub use error::{PaddockError, Result};
pub use output::{format_output, OutputFormat};
pub use parser::{parse_statement, Statement};
pub use script::{ScriptResult, ScriptRunner};
