//! Container handle owned by one CONTAINER cell
//!
//! A handle is built at INSERT time from the raw reference string and does
//! nothing until a lifecycle action is invoked. The first `start` loads the
//! unit config and asks the runtime to create the unit. Every guard check
//! re-inspects the unit, since its state can change outside this process.
//!
//! Handle operations never fail: runtime errors are logged and rendered as a
//! message so one broken unit cannot abort the enclosing query.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::container::command::build_argv;
use crate::container::config::{SpecLoader, UnitSpec};
use crate::container::metadata::Metadata;
use crate::container::runtime::{
    ContainerRuntime, RuntimeError, RuntimeResult, UnitRef, UnitStatus,
};
use crate::container::ContainerAction;

/// Rendered when a handle has no unit to ask
pub const NO_RESULT: &str = "No result";

/// Rendered when `run_cmd` fails inside the unit
pub const COMMAND_FAILED: &str = "Error running command in container";

pub struct ContainerHandle {
    reference: String,
    runtime: Arc<dyn ContainerRuntime>,
    loader: SpecLoader,
    spec: Option<UnitSpec>,
    unit: Option<UnitRef>,
}

impl fmt::Debug for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerHandle")
            .field("reference", &self.reference)
            .field("unit", &self.unit)
            .finish()
    }
}

impl ContainerHandle {
    pub fn new(reference: &str, runtime: Arc<dyn ContainerRuntime>, loader: SpecLoader) -> Self {
        Self {
            reference: reference.to_string(),
            runtime,
            loader,
            spec: None,
            unit: None,
        }
    }

    /// The raw string this handle was inserted with
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The runtime unit, once created
    pub fn unit(&self) -> Option<&UnitRef> {
        self.unit.as_ref()
    }

    /// Name used in messages: the configured unit name once loaded
    pub fn name(&self) -> &str {
        self.spec
            .as_ref()
            .and_then(|s| s.identifier())
            .unwrap_or(&self.reference)
    }

    pub async fn start(&mut self) -> String {
        self.perform(ContainerAction::Start).await
    }

    pub async fn stop(&mut self) -> String {
        self.perform(ContainerAction::Stop).await
    }

    pub async fn pause(&mut self) -> String {
        self.perform(ContainerAction::Pause).await
    }

    pub async fn unpause(&mut self) -> String {
        self.perform(ContainerAction::Unpause).await
    }

    pub async fn restart(&mut self) -> String {
        self.perform(ContainerAction::Restart).await
    }

    pub async fn kill(&mut self) -> String {
        self.perform(ContainerAction::Kill).await
    }

    pub async fn remove(&mut self) -> String {
        self.perform(ContainerAction::Remove).await
    }

    /// Run one lifecycle action and render its outcome
    pub async fn perform(&mut self, action: ContainerAction) -> String {
        match self.try_perform(action).await {
            Ok(message) => message,
            Err(err) => {
                error!(container = %self.name(), %action, "{}", err);
                format!("Failed to {} container {}: {}", action, self.name(), err)
            }
        }
    }

    /// Like [`perform`](Self::perform), but surfaces runtime failures
    pub async fn try_perform(&mut self, action: ContainerAction) -> RuntimeResult<String> {
        if action == ContainerAction::Start {
            return self.try_start().await;
        }

        let name = self.name().to_string();
        let unit = match &self.unit {
            Some(unit) => unit.clone(),
            None => {
                debug!(container = %name, %action, "no unit created yet");
                return Ok(format!(
                    "Unable to {} container: {}. Container: {} is not exists.",
                    action, name, name
                ));
            }
        };

        let status = self.runtime.inspect(&unit).await?.status;
        debug!(container = %name, %action, %status, "guard check");

        let message = match action {
            ContainerAction::Pause => {
                if status == UnitStatus::Exited {
                    return Ok(format!(
                        "Unable to pause container: {}. Container: {} already stopped",
                        name, name
                    ));
                }
                self.runtime.pause(&unit).await?;
                format!("Container {} was successfully paused.", name)
            }
            ContainerAction::Unpause => {
                if status == UnitStatus::Running {
                    return Ok(format!(
                        "Unable to unpause container: {}. Container: {} is already running.",
                        name, name
                    ));
                }
                self.runtime.unpause(&unit).await?;
                format!("Container {} was successfully unpaused.", name)
            }
            ContainerAction::Stop => {
                if status == UnitStatus::Exited {
                    return Ok(format!("Container: {} is already stopped.", name));
                }
                self.runtime.stop(&unit).await?;
                format!("Container {} stopped", name)
            }
            ContainerAction::Restart => {
                if status == UnitStatus::Running {
                    return Ok(format!(
                        "Unable to restart container: {}. Container: {} is already running.",
                        name, name
                    ));
                }
                self.runtime.restart(&unit).await?;
                format!("Container {} restarted", name)
            }
            ContainerAction::Kill => {
                if status == UnitStatus::Exited {
                    return Ok(format!(
                        "Cannot kill container: {}. Container: is not running.",
                        name
                    ));
                }
                self.runtime.kill(&unit).await?;
                format!("Container {} stopped and killed.", name)
            }
            ContainerAction::Remove => {
                if matches!(
                    status,
                    UnitStatus::Running | UnitStatus::Paused | UnitStatus::Restarting
                ) {
                    self.runtime.stop(&unit).await?;
                }
                self.runtime.remove(&unit).await?;
                self.unit = None;
                format!("Container {} stopped and removed.", name)
            }
            ContainerAction::Start => unreachable!("start is handled above"),
        };

        info!(container = %name, %action, "{}", message);
        Ok(message)
    }

    async fn try_start(&mut self) -> RuntimeResult<String> {
        if let Some(unit) = self.unit.clone() {
            match self.runtime.inspect(&unit).await {
                Ok(inspection) if inspection.status == UnitStatus::Created => {
                    self.runtime.start(&unit).await?;
                    return Ok(self.started_message());
                }
                Ok(_) => {
                    debug!(container = %self.name(), "start skipped, unit exists");
                    return Ok(format!("Container: {} is already running.", self.name()));
                }
                Err(RuntimeError::NotFound(_)) => {
                    debug!(container = %self.name(), "unit vanished, recreating");
                    self.unit = None;
                }
                Err(err) => return Err(err),
            }
        }

        let spec = self.load_spec()?;
        let unit = self.runtime.create(&spec).await?;
        // recorded before start so a failed start can still be removed
        self.unit = Some(unit.clone());
        self.runtime.start(&unit).await?;
        Ok(self.started_message())
    }

    fn started_message(&self) -> String {
        let message = format!("Container {} was successfully started.", self.name());
        info!(container = %self.name(), "{}", message);
        message
    }

    fn load_spec(&mut self) -> RuntimeResult<UnitSpec> {
        if let Some(spec) = &self.spec {
            return Ok(spec.clone());
        }
        let spec = self
            .loader
            .load(&self.reference)
            .map_err(|e| RuntimeError::Spec(e.to_string()))?;
        self.spec = Some(spec.clone());
        Ok(spec)
    }

    /// Live metadata, or a single field of it
    ///
    /// Returns [`NO_RESULT`] when there is no unit or the runtime cannot
    /// describe it.
    pub async fn metadata(&self, field: Option<&str>) -> Value {
        match self.fetch_metadata().await {
            Ok(Some(metadata)) => match field {
                Some(field) => metadata.field(field),
                None => metadata.to_value(),
            },
            Ok(None) => Value::from(NO_RESULT),
            Err(err) => {
                error!(container = %self.name(), "Error fetching metadata: {}", err);
                Value::from(NO_RESULT)
            }
        }
    }

    async fn fetch_metadata(&self) -> RuntimeResult<Option<Metadata>> {
        let Some(unit) = &self.unit else {
            return Ok(None);
        };
        let inspection = self.runtime.inspect(unit).await?;
        let stats = self.runtime.stats(unit).await?;
        Ok(Some(Metadata::from_runtime(&inspection, &stats)))
    }

    /// Run `command` inside the unit and return its trimmed output
    pub async fn run_command(&self, command: &str) -> String {
        let Some(unit) = &self.unit else {
            return NO_RESULT.to_string();
        };

        let result = async {
            let inspection = self.runtime.inspect(unit).await?;
            let port = inspection.ports.first().map(|p| p.container_port);
            let argv = build_argv(&inspection.image, port, command);
            debug!(container = %self.name(), ?argv, "exec");
            self.runtime.exec(unit, &argv).await
        }
        .await;

        match result {
            Ok(output) => output.trim().to_string(),
            Err(err) => {
                error!(container = %self.name(), "Error running command: {}", err);
                COMMAND_FAILED.to_string()
            }
        }
    }
}
