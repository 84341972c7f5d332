//! Container handles and the runtime seam they drive
//!
//! A CONTAINER cell owns a [`ContainerHandle`]. Handles talk to the outside
//! world only through a [`ContainerRuntime`]; [`DockerCli`] is the adapter
//! used by the binary.

mod action;
pub mod command;
pub mod config;
mod docker;
mod handle;
pub mod metadata;
pub mod runtime;

#[cfg(test)]
pub(crate) mod mock;

pub use action::ContainerAction;
pub use config::{SpecLoader, UnitSpec};
pub use docker::{parse_inspect, DockerCli, Listing};
pub use handle::{ContainerHandle, COMMAND_FAILED, NO_RESULT};
pub use metadata::{Metadata, PROPERTY_NOT_FOUND};
pub use runtime::{
    ContainerRuntime, Inspection, PortMapping, RuntimeError, RuntimeResult, UnitRef, UnitStats,
    UnitStatus,
};
