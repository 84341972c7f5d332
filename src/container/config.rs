//! Unit config files
//!
//! A CONTAINER cell stores a reference to a JSON file describing the unit:
//!
//! ```json
//! {
//!   "name": "web",
//!   "image": "nginx",
//!   "exposedPorts": { "80/tcp": {} },
//!   "hostConfig": { "PortBindings": { "80/tcp": [{ "HostPort": "8080" }] } }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PaddockError, Result};

/// Deserialized unit config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSpec {
    #[serde(default)]
    pub name: Option<String>,
    /// Id of an already existing unit to adopt instead of creating one
    #[serde(default, rename = "container_id")]
    pub container_id: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub exposed_ports: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub host_config: Option<HostConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig {
    #[serde(default)]
    pub port_bindings: BTreeMap<String, Vec<HostBinding>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostBinding {
    #[serde(default)]
    pub host_port: String,
}

impl UnitSpec {
    /// Parse and validate a config document
    pub fn from_json(raw: &str) -> Result<Self> {
        let spec: UnitSpec = serde_json::from_str(raw)?;
        if spec.identifier().is_none() {
            return Err(PaddockError::Config(
                "Container name or ID not found in the config.".to_string(),
            ));
        }
        Ok(spec)
    }

    /// Name if present, otherwise the adopted container id
    pub fn identifier(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.container_id.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// The first configured host port binding, as `(container port key, host port)`
    pub fn host_binding(&self) -> Option<(&str, u16)> {
        let bindings = &self.host_config.as_ref()?.port_bindings;
        bindings.iter().find_map(|(key, hosts)| {
            let port = hosts.first()?.host_port.parse::<u16>().ok()?;
            (port != 0).then_some((key.as_str(), port))
        })
    }
}

/// Resolves cell references to unit specs
#[derive(Debug, Clone, Default)]
pub struct SpecLoader {
    base_dir: Option<PathBuf>,
}

impl SpecLoader {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    /// Path a reference resolves to; relative references hang off the base dir
    pub fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn load(&self, reference: &str) -> Result<UnitSpec> {
        let path = self.resolve(reference);
        let raw = fs::read_to_string(&path).map_err(|e| {
            PaddockError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        UnitSpec::from_json(&raw)
    }
}
