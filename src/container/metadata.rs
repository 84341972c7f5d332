//! Normalized metadata snapshot of a unit

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::container::runtime::{Inspection, UnitStats};

/// Returned for field names that are not part of the snapshot
pub const PROPERTY_NOT_FOUND: &str = "Property not found";

/// Live state of one unit, rebuilt from `inspect` + `stats` on every request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: String,
    pub image: String,
    pub status: String,
    pub port: Option<u16>,
    pub host_port: Option<String>,
    pub cpu_usage: Option<String>,
    pub last_started: Option<String>,
}

impl Metadata {
    pub fn from_runtime(inspection: &Inspection, stats: &UnitStats) -> Self {
        // the first exposed port is the unit's primary port
        let primary = inspection.ports.first();

        Self {
            name: inspection.name.trim_start_matches('/').to_string(),
            image: inspection.image.clone(),
            status: inspection.status.to_string(),
            port: primary.map(|p| p.container_port),
            host_port: primary.and_then(|p| p.host_port.clone()),
            cpu_usage: stats.cpu_usage.clone(),
            last_started: inspection.started_at.as_deref().and_then(normalize_started_at),
        }
    }

    /// Look up one field by its case-insensitive name
    pub fn field(&self, name: &str) -> Value {
        match name.trim().to_lowercase().as_str() {
            "name" => Value::from(self.name.clone()),
            "image" => Value::from(self.image.clone()),
            "status" => Value::from(self.status.clone()),
            "port" => self.port.map(Value::from).unwrap_or(Value::Null),
            "hostport" => option_value(&self.host_port),
            "cpuusage" => option_value(&self.cpu_usage),
            "laststarted" => option_value(&self.last_started),
            _ => Value::from(PROPERTY_NOT_FOUND),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn option_value(value: &Option<String>) -> Value {
    value.clone().map(Value::from).unwrap_or(Value::Null)
}

/// Runtimes report the zero timestamp for units that never started
fn normalize_started_at(raw: &str) -> Option<String> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) if ts.timestamp() <= 0 => None,
        Ok(ts) => Some(ts.with_timezone(&Utc).to_rfc3339()),
        Err(_) if raw.is_empty() => None,
        Err(_) => Some(raw.to_string()),
    }
}
