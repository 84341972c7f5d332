//! Runtime adapter that drives the `docker` command line
//!
//! Every operation is one `docker` invocation run through `tokio::process`.
//! A non-zero exit becomes [`RuntimeError::CommandFailed`] carrying stderr,
//! except for unknown units, which map to [`RuntimeError::NotFound`].

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::container::config::UnitSpec;
use crate::container::runtime::{
    ContainerRuntime, Inspection, PortMapping, RuntimeError, RuntimeResult, UnitRef, UnitStats,
    UnitStatus,
};

/// Host side of a published port in `docker ps` output, e.g. `0.0.0.0:8080->80/tcp`
static PUBLISHED_PORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(\d+)->").unwrap());

const ZERO_TIME_PREFIX: &str = "0001-01-01";

#[derive(Debug, Clone)]
pub struct DockerCli {
    program: PathBuf,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run one docker invocation and return its stdout and stderr
    async fn run(&self, args: &[String]) -> RuntimeResult<(String, String)> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        debug!("Running: {:?}", cmd);

        let output = cmd.output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            if stderr.contains("No such container") || stderr.contains("No such object") {
                let target = args.last().cloned().unwrap_or_default();
                return Err(RuntimeError::NotFound(target));
            }
            return Err(RuntimeError::CommandFailed {
                command: format!("docker {}", args.first().map(String::as_str).unwrap_or("")),
                stderr,
            });
        }
        Ok((stdout, stderr))
    }

    async fn verb(&self, verb: &str, unit: &UnitRef) -> RuntimeResult<()> {
        self.run(&[verb.to_string(), unit.0.clone()]).await.map(|_| ())
    }

    /// Names and published host ports of every existing container
    async fn existing(&self) -> RuntimeResult<Listing> {
        let args = [
            "ps".to_string(),
            "-a".to_string(),
            "--format".to_string(),
            "{{.Names}}\t{{.Ports}}".to_string(),
        ];
        let (stdout, _) = self.run(&args).await?;
        Ok(Listing::parse(&stdout))
    }
}

/// Parsed `docker ps -a` output
#[derive(Debug, Default, PartialEq)]
pub struct Listing {
    pub names: BTreeSet<String>,
    pub host_ports: BTreeSet<u16>,
}

impl Listing {
    pub fn parse(text: &str) -> Self {
        let mut listing = Listing::default();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let (names, ports) = line.split_once('\t').unwrap_or((line, ""));
            listing
                .names
                .extend(names.split(',').map(|n| n.trim().to_string()));
            listing.host_ports.extend(
                PUBLISHED_PORT
                    .captures_iter(ports)
                    .filter_map(|c| c[1].parse::<u16>().ok()),
            );
        }
        listing
    }

    /// `base`, or the first of `base_1`, `base_2`, ... that is free
    pub fn available_name(&self, base: &str) -> String {
        let mut name = base.to_string();
        let mut suffix = 0;
        while self.names.contains(&name) {
            suffix += 1;
            name = format!("{}_{}", base, suffix);
        }
        name
    }

    /// First free host port counting upward from `start`
    pub fn available_host_port(&self, start: u16) -> u16 {
        let mut port = start;
        while self.host_ports.contains(&port) && port < u16::MAX {
            port += 1;
        }
        port
    }
}

/// Arguments for `docker create`
fn create_args(spec: &UnitSpec, image: &str, listing: &Listing) -> Vec<String> {
    let base = spec.identifier().unwrap_or(image);
    let mut args = vec![
        "create".to_string(),
        "--name".to_string(),
        listing.available_name(base),
        "--tty".to_string(),
        "--interactive".to_string(),
    ];

    for port in spec.exposed_ports.keys() {
        args.push("--expose".to_string());
        args.push(port.clone());
    }
    if let Some((container_port, host_port)) = spec.host_binding() {
        args.push("-p".to_string());
        args.push(format!(
            "{}:{}",
            listing.available_host_port(host_port),
            container_port
        ));
    }

    args.push(image.to_string());
    if let Some(command) = &spec.command {
        args.extend(command.iter().cloned());
    }
    args
}

/// Turn `docker inspect` JSON into an [`Inspection`]
pub fn parse_inspect(text: &str) -> RuntimeResult<Inspection> {
    let parsed: Value =
        serde_json::from_str(text).map_err(|e| RuntimeError::InvalidResponse(e.to_string()))?;
    let data = parsed
        .get(0)
        .ok_or_else(|| RuntimeError::InvalidResponse("empty inspect output".to_string()))?;

    let str_at = |pointer: &str| {
        data.pointer(pointer)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let mut ports = Vec::new();
    let published = data.pointer("/NetworkSettings/Ports").and_then(Value::as_object);
    let exposed = data.pointer("/Config/ExposedPorts").and_then(Value::as_object);
    // created units have no network settings yet
    if let Some(map) = published.filter(|m| !m.is_empty()).or(exposed) {
        for (key, bindings) in map {
            let (port, protocol) = key.split_once('/').unwrap_or((key.as_str(), "tcp"));
            let Ok(container_port) = port.parse::<u16>() else {
                continue;
            };
            let host_port = bindings
                .get(0)
                .and_then(|b| b.get("HostPort"))
                .and_then(Value::as_str)
                .map(str::to_string);
            ports.push(PortMapping {
                container_port,
                protocol: protocol.to_string(),
                host_port,
            });
        }
    }

    let started_at = str_at("/State/StartedAt");
    let started_at = (!started_at.is_empty() && !started_at.starts_with(ZERO_TIME_PREFIX))
        .then_some(started_at);

    Ok(Inspection {
        name: str_at("/Name").trim_start_matches('/').to_string(),
        image: str_at("/Config/Image"),
        status: UnitStatus::parse(&str_at("/State/Status")),
        ports,
        started_at,
    })
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn create(&self, spec: &UnitSpec) -> RuntimeResult<UnitRef> {
        let Some(image) = spec.image.as_deref() else {
            // no image: adopt an existing unit
            let id = spec
                .identifier()
                .ok_or_else(|| RuntimeError::Spec("missing name or container_id".to_string()))?;
            debug!("Adopting existing container {}", id);
            return Ok(UnitRef(id.to_string()));
        };

        let listing = self.existing().await?;
        let args = create_args(spec, image, &listing);
        self.run(&args).await?;
        // address the unit by name
        Ok(UnitRef(args[2].clone()))
    }

    async fn start(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.verb("start", unit).await
    }

    async fn stop(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.verb("stop", unit).await
    }

    async fn pause(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.verb("pause", unit).await
    }

    async fn unpause(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.verb("unpause", unit).await
    }

    async fn restart(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.verb("restart", unit).await
    }

    async fn kill(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.verb("kill", unit).await
    }

    async fn remove(&self, unit: &UnitRef) -> RuntimeResult<()> {
        self.verb("rm", unit).await
    }

    async fn inspect(&self, unit: &UnitRef) -> RuntimeResult<Inspection> {
        let args = [
            "inspect".to_string(),
            "--type".to_string(),
            "container".to_string(),
            unit.0.clone(),
        ];
        let (stdout, _) = self.run(&args).await?;
        parse_inspect(&stdout)
    }

    async fn stats(&self, unit: &UnitRef) -> RuntimeResult<UnitStats> {
        let args = [
            "stats".to_string(),
            "--no-stream".to_string(),
            "--format".to_string(),
            "{{.CPUPerc}}".to_string(),
            unit.0.clone(),
        ];
        let (stdout, _) = self.run(&args).await?;
        let cpu = stdout.trim();
        Ok(UnitStats {
            cpu_usage: (!cpu.is_empty()).then(|| cpu.to_string()),
        })
    }

    async fn exec(&self, unit: &UnitRef, argv: &[String]) -> RuntimeResult<String> {
        let mut args = vec!["exec".to_string(), unit.0.clone()];
        args.extend(argv.iter().cloned());
        let (stdout, stderr) = self.run(&args).await?;
        if stderr.is_empty() {
            Ok(stdout)
        } else {
            Ok(format!("{}{}", stdout, stderr))
        }
    }
}
