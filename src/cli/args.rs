//! CLI argument parsing

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "paddock")]
#[command(author, version, about = "Drive containers with SQL-like tables", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubCommand,

    /// Docker executable used to manage containers
    #[arg(long, global = true, env = "PADDOCK_DOCKER", default_value = "docker")]
    pub docker: PathBuf,

    /// Base directory for relative container config references
    #[arg(long, global = true, env = "PADDOCK_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum SubCommand {
    /// Execute a single statement
    Query {
        /// The statement to execute
        query: String,
    },

    /// Run a file of ';'-separated statements in one session
    Run {
        /// Path to the script file
        file: PathBuf,
    },

    /// Start interactive REPL mode
    Repl,

    /// Accept statements over HTTP (`POST /query`) in one shared session
    Serve {
        /// Address to listen on
        #[arg(long, env = "PADDOCK_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
}
