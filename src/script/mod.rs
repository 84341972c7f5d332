//! Script execution module
//!
//! Runs files of `;`-separated statements against one engine session.

pub mod runner;

pub use runner::{ScriptResult, ScriptRunner};
