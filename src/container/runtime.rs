//! The container runtime seam
//!
//! Handles never talk to a container engine directly; every call goes
//! through a [`ContainerRuntime`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::container::UnitSpec;

/// Failure reported by a runtime adapter
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("No such container: {0}")]
    NotFound(String),

    #[error("Unexpected runtime response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Spec(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

/// Reference to a unit that exists in the runtime (name or id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitRef(pub String);

impl fmt::Display for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state reported by `inspect`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    Other(String),
}

impl UnitStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "created" => UnitStatus::Created,
            "running" => UnitStatus::Running,
            "paused" => UnitStatus::Paused,
            "restarting" => UnitStatus::Restarting,
            "removing" => UnitStatus::Removing,
            "exited" => UnitStatus::Exited,
            "dead" => UnitStatus::Dead,
            other => UnitStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            UnitStatus::Created => "created",
            UnitStatus::Running => "running",
            UnitStatus::Paused => "paused",
            UnitStatus::Restarting => "restarting",
            UnitStatus::Removing => "removing",
            UnitStatus::Exited => "exited",
            UnitStatus::Dead => "dead",
            UnitStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A port exposed by a unit, with its host binding if published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub container_port: u16,
    pub protocol: String,
    pub host_port: Option<String>,
}

/// Result of `inspect`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub name: String,
    pub image: String,
    pub status: UnitStatus,
    pub ports: Vec<PortMapping>,
    /// RFC 3339 start time; `None` if the unit never started
    pub started_at: Option<String>,
}

/// Result of `stats`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitStats {
    /// CPU usage as the adapter reports it; `DockerCli` gives the current
    /// percentage (`"0.25%"`), not a cumulative counter
    pub cpu_usage: Option<String>,
}

/// Operations the core needs from a container engine
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create (but do not start) a unit from its spec
    async fn create(&self, spec: &UnitSpec) -> RuntimeResult<UnitRef>;

    async fn start(&self, unit: &UnitRef) -> RuntimeResult<()>;

    async fn stop(&self, unit: &UnitRef) -> RuntimeResult<()>;

    async fn pause(&self, unit: &UnitRef) -> RuntimeResult<()>;

    async fn unpause(&self, unit: &UnitRef) -> RuntimeResult<()>;

    async fn restart(&self, unit: &UnitRef) -> RuntimeResult<()>;

    async fn kill(&self, unit: &UnitRef) -> RuntimeResult<()>;

    async fn remove(&self, unit: &UnitRef) -> RuntimeResult<()>;

    async fn inspect(&self, unit: &UnitRef) -> RuntimeResult<Inspection>;

    async fn stats(&self, unit: &UnitRef) -> RuntimeResult<UnitStats>;

    /// Run `argv` inside the unit and return its combined output
    async fn exec(&self, unit: &UnitRef, argv: &[String]) -> RuntimeResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_status_parse() {
        assert_eq!(UnitStatus::parse("running"), UnitStatus::Running);
        assert_eq!(UnitStatus::parse("Exited"), UnitStatus::Exited);
        assert_eq!(
            UnitStatus::parse("hibernating"),
            UnitStatus::Other("hibernating".to_string())
        );
        assert_eq!(UnitStatus::Paused.to_string(), "paused");
    }
}
