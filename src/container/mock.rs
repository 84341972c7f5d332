//! In-memory runtime for tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::container::config::UnitSpec;
use crate::container::runtime::{
    ContainerRuntime, Inspection, PortMapping, RuntimeError, RuntimeResult, UnitRef, UnitStats,
    UnitStatus,
};

#[derive(Debug, Clone)]
struct MockUnit {
    image: String,
    status: UnitStatus,
    ports: Vec<PortMapping>,
    started_at: Option<String>,
}

#[derive(Debug, Default)]
struct MockState {
    units: HashMap<String, MockUnit>,
    calls: Vec<String>,
    failing: HashSet<String>,
    exec_output: String,
    last_exec: Option<Vec<String>>,
}

/// Records every call and keeps unit status transitions in memory
#[derive(Debug, Default)]
pub struct MockRuntime {
    state: Mutex<MockState>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verbs called so far, e.g. `["create", "start", "inspect"]`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| *c == verb).count()
    }

    /// Make every later call of `verb` fail
    pub fn fail_on(&self, verb: &str) {
        self.state.lock().unwrap().failing.insert(verb.to_string());
    }

    pub fn set_exec_output(&self, output: &str) {
        self.state.lock().unwrap().exec_output = output.to_string();
    }

    pub fn last_exec(&self) -> Option<Vec<String>> {
        self.state.lock().unwrap().last_exec.clone()
    }

    /// Drop every unit, as if they were removed out of band
    pub fn forget_all(&self) {
        self.state.lock().unwrap().units.clear();
    }

    pub fn status_of(&self, unit: &str) -> Option<UnitStatus> {
        self.state.lock().unwrap().units.get(unit).map(|u| u.status.clone())
    }

    fn record(&self, verb: &str) -> RuntimeResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(verb.to_string());
        if state.failing.contains(verb) {
            return Err(RuntimeError::CommandFailed {
                command: format!("mock {}", verb),
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn transition(&self, verb: &str, unit: &UnitRef, status: UnitStatus) -> RuntimeResult<()> {
        self.record(verb)?;
        let mut state = self.state.lock().unwrap();
        let entry = state
            .units
            .get_mut(&unit.0)
            .ok_or_else(|| RuntimeError::NotFound(unit.0.clone()))?;
        if status == UnitStatus::Running && entry.started_at.is_none() {
            entry.started_at = Some("2024-05-01T10:00:00Z".to_string());
        }
        entry.status = status;
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn create(&self, spec: &UnitSpec) -> RuntimeResult<UnitRef> {
        self.record("create")?;
        let base = spec
            .identifier()
            .ok_or_else(|| RuntimeError::Spec("missing name".to_string()))?
            .to_string();

        let mut state = self.state.lock().unwrap();
        let mut name = base.clone();
        let mut suffix = 0;
        while state.units.contains_key(&name) {
            suffix += 1;
            name = format!("{}_{}", base, suffix);
        }

        let host = spec.host_binding().map(|(_, port)| port.to_string());
        let ports = spec
            .exposed_ports
            .keys()
            .filter_map(|key| {
                let (port, protocol) = key.split_once('/').unwrap_or((key.as_str(), "tcp"));
                Some(PortMapping {
                    container_port: port.parse().ok()?,
                    protocol: protocol.to_string(),
                    host_port: host.clone(),
                })
            })
            .collect();

        state.units.insert(
            name.clone(),
            MockUnit {
                image: spec.image.clone().unwrap_or_default(),
                status: UnitStatus::Created,
                ports,
                started_at: None,
            },
        );
        Ok(UnitRef(name))
    }

    async fn start(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.transition("start", unit, UnitStatus::Running)
    }

    async fn stop(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.transition("stop", unit, UnitStatus::Exited)
    }

    async fn pause(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.transition("pause", unit, UnitStatus::Paused)
    }

    async fn unpause(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.transition("unpause", unit, UnitStatus::Running)
    }

    async fn restart(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.transition("restart", unit, UnitStatus::Running)
    }

    async fn kill(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.transition("kill", unit, UnitStatus::Exited)
    }

    async fn remove(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.record("remove")?;
        self.state
            .lock()
            .unwrap()
            .units
            .remove(&unit.0)
            .map(|_| ())
            .ok_or_else(|| RuntimeError::NotFound(unit.0.clone()))
    }

    async fn inspect(&self, unit: &UnitRef) -> RuntimeResult<Inspection> {
        self.record("inspect")?;
        let state = self.state.lock().unwrap();
        let entry = state
            .units
            .get(&unit.0)
            .ok_or_else(|| RuntimeError::NotFound(unit.0.clone()))?;
        Ok(Inspection {
            name: format!("/{}", unit.0),
            image: entry.image.clone(),
            status: entry.status.clone(),
            ports: entry.ports.clone(),
            started_at: entry.started_at.clone(),
        })
    }

    async fn stats(&self, unit: &UnitRef) -> RuntimeResult<UnitStats> {
        self.record("stats")?;
        let state = self.state.lock().unwrap();
        let entry = state
            .units
            .get(&unit.0)
            .ok_or_else(|| RuntimeError::NotFound(unit.0.clone()))?;
        let cpu_usage = (entry.status == UnitStatus::Running).then(|| "0.25%".to_string());
        Ok(UnitStats { cpu_usage })
    }

    async fn exec(&self, unit: &UnitRef, argv: &[String]) -> RuntimeResult<String> {
        self.record("exec")?;
        let mut state = self.state.lock().unwrap();
        if !state.units.contains_key(&unit.0) {
            return Err(RuntimeError::NotFound(unit.0.clone()));
        }
        state.last_exec = Some(argv.to_vec());
        Ok(state.exec_output.clone())
    }
}
