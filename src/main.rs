//! Paddock CLI - drive containers with SQL-like tables

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::debug;

use paddock::cli::{Args, SubCommand};
use paddock::{format_output, DockerCli, Engine, OutputFormat, ScriptRunner, SpecLoader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // logs go to stderr so results on stdout stay parseable
    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let output_format = if args.json { OutputFormat::Json } else { OutputFormat::Human };
    debug!(docker = %args.docker.display(), config_dir = ?args.config_dir, "starting");

    let engine = Engine::new(
        Arc::new(DockerCli::new(args.docker.clone())),
        SpecLoader::new(args.config_dir.clone()),
    );

    match args.command {
        SubCommand::Query { query } => {
            let mut engine = engine;
            let result = engine.execute(&query).await;
            println!("{}", format_output(&result, &output_format));
            if result.is_error {
                std::process::exit(1);
            }
            Ok(())
        }

        SubCommand::Run { file } => {
            let mut runner = ScriptRunner::new(engine).with_output(output_format);
            let result = runner
                .run_file(&file)
                .await
                .with_context(|| format!("Failed to run script {}", file.display()))?;

            if args.verbose {
                eprintln!(
                    "--- Script completed: {} statements executed ---",
                    result.statements_executed
                );
            }
            if let Some(err) = result.error {
                bail!(
                    "{} (after {} successful statements)",
                    err,
                    result.statements_executed
                );
            }
            Ok(())
        }

        SubCommand::Serve { bind } => {
            paddock::server::serve(engine, bind)
                .await
                .with_context(|| format!("Failed to serve on {}", bind))?;
            Ok(())
        }

        #[cfg(feature = "repl")]
        SubCommand::Repl => Ok(paddock::repl::run_repl(engine, output_format).await?),
        #[cfg(not(feature = "repl"))]
        SubCommand::Repl => {
            bail!("REPL support not enabled. Rebuild with --features repl")
        }
    }
}
