//! Container runtime (Docker/Podman)
//!
//! Drives the runtime CLI. One step maps to these invocations:
//!
//! 1. `<rt> create --name <n> -v <cwd>:<mount> -w <mount> -e K=V... <image> tail -f /dev/null`
//! 2. `<rt> start <id>`
//! 3. `<rt> exec -w <mount> <id> sh -e -c <script>`
//! 4. `<rt> rm -f -v <id>`
//!
//! Creating and starting make up provisioning; a container that was created
//! but could not be started is removed before the error is returned.

use crate::executor::{
    ContainerHandle, ContainerRuntime, HealthStatus, ProvisionRequest, ScriptOutcome, ShellConfig,
    stream_session,
};
use crate::job::JobError;
use serde::{Deserialize, Serialize};
use std::process::Command;

/// Default mount point of the workspace inside containers
pub const DEFAULT_WORKSPACE_MOUNT: &str = "/workspace";

/// Keeps a provisioned container alive until it is removed
pub const IDLE_COMMAND: [&str; 3] = ["tail", "-f", "/dev/null"];

/// Container runtime flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// Docker runtime
    #[default]
    Docker,
    /// Podman runtime
    Podman,
    /// No container: run the shell on the host
    Host,
}

impl std::fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeKind::Docker => write!(f, "docker"),
            RuntimeKind::Podman => write!(f, "podman"),
            RuntimeKind::Host => write!(f, "host"),
        }
    }
}

/// Runtime backed by the `docker` or `podman` command line
#[derive(Debug, Clone)]
pub struct CliRuntime {
    kind: RuntimeKind,
    binary: String,
    shell: ShellConfig,
    workspace_mount: String,
}

impl CliRuntime {
    /// Creates a Docker runtime
    #[must_use]
    pub fn docker() -> Self {
        Self::new(RuntimeKind::Docker)
    }

    /// Creates a Podman runtime
    #[must_use]
    pub fn podman() -> Self {
        Self::new(RuntimeKind::Podman)
    }

    fn new(kind: RuntimeKind) -> Self {
        Self {
            kind,
            binary: kind.to_string(),
            shell: ShellConfig::default(),
            workspace_mount: DEFAULT_WORKSPACE_MOUNT.to_string(),
        }
    }

    /// Uses a different executable (e.g. an absolute path)
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Sets the shell started inside containers
    #[must_use]
    pub fn with_shell(mut self, shell: ShellConfig) -> Self {
        self.shell = shell;
        self
    }

    /// Sets where the workspace is mounted inside containers
    #[must_use]
    pub fn with_workspace_mount(mut self, mount: impl Into<String>) -> Self {
        self.workspace_mount = mount.into();
        self
    }

    /// Runtime flavour
    #[must_use]
    pub fn kind(&self) -> RuntimeKind {
        self.kind
    }

    /// Checks if the runtime executable answers `--version`
    fn is_runtime_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        cmd
    }

    /// Arguments of the `exec` call that runs `script` in container `id`
    fn exec_args(&self, id: &str, script: &str) -> Vec<String> {
        let mut args = vec![
            "exec".to_string(),
            "-w".to_string(),
            self.workspace_mount.clone(),
            id.to_string(),
        ];
        args.extend(self.shell.session_argv(script));
        args
    }

    /// Removes `id`, logging instead of failing
    fn discard(&self, id: &str) {
        let args = ["rm".to_string(), "-f".to_string(), "-v".to_string(), id.to_string()];
        match self.command(&args).output() {
            Ok(output) if output.status.success() => {}
            Ok(output) => tracing::warn!(
                container = %id,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Failed to remove container"
            ),
            Err(e) => tracing::warn!(container = %id, error = %e, "Failed to remove container"),
        }
    }
}

fn failure_reason(binary: &str, verb: &str, output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("{binary} {verb} exited with {}", output.status)
    } else {
        stderr
    }
}

impl ContainerRuntime for CliRuntime {
    fn name(&self) -> &str {
        match self.kind {
            RuntimeKind::Docker => "docker",
            RuntimeKind::Podman => "podman",
            RuntimeKind::Host => "host",
        }
    }

    fn provision_command(&self, request: &ProvisionRequest<'_>) -> Vec<String> {
        let cwd = request.context.cwd.to_string_lossy();
        let mut argv = vec![
            self.binary.clone(),
            "create".to_string(),
            "--name".to_string(),
            request.container_name.clone(),
            "--label".to_string(),
            format!("jobline.run={}", request.context.run_id),
            "-v".to_string(),
            format!("{cwd}:{}", self.workspace_mount),
            "-w".to_string(),
            self.workspace_mount.clone(),
        ];

        for (key, value) in &request.context.env {
            argv.push("-e".to_string());
            argv.push(format!("{key}={value}"));
        }

        argv.push(request.spec.image.clone());
        argv.extend(IDLE_COMMAND.iter().map(ToString::to_string));
        argv
    }

    fn provision(&self, request: &ProvisionRequest<'_>) -> Result<ContainerHandle, JobError> {
        let argv = self.provision_command(request);
        tracing::debug!(command = %shell_words::join(&argv), "Provisioning container");

        let output = self
            .command(&argv[1..])
            .output()
            .map_err(|e| JobError::Runtime(format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            return Err(JobError::Provisioning {
                image: request.spec.image.clone(),
                reason: failure_reason(&self.binary, "create", &output),
            });
        }

        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let id = if id.is_empty() {
            request.container_name.clone()
        } else {
            id
        };

        let start = ["start".to_string(), id.clone()];
        let reason = match self.command(&start).output() {
            Ok(output) if output.status.success() => None,
            Ok(output) => Some(failure_reason(&self.binary, "start", &output)),
            Err(e) => Some(format!("failed to run {}: {e}", self.binary)),
        };
        if let Some(reason) = reason {
            self.discard(&id);
            return Err(JobError::Provisioning {
                image: request.spec.image.clone(),
                reason,
            });
        }

        Ok(ContainerHandle {
            id,
            image: request.spec.image.clone(),
        })
    }

    fn run_script(&self, handle: &ContainerHandle, script: &str) -> Result<ScriptOutcome, JobError> {
        let args = self.exec_args(&handle.id, script);
        stream_session(self.command(&args), &self.shell)
    }

    fn teardown(&self, handle: &ContainerHandle) -> Result<(), JobError> {
        let args = ["rm".to_string(), "-f".to_string(), "-v".to_string(), handle.id.clone()];
        let output = self
            .command(&args)
            .output()
            .map_err(|e| JobError::Runtime(format!("failed to run {}: {e}", self.binary)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(JobError::Runtime(format!(
                "failed to remove container {}: {}",
                handle.id,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    fn health_check(&self) -> HealthStatus {
        if !self.is_runtime_available() {
            return HealthStatus::Unhealthy {
                reason: format!("{} is not available", self.binary),
            };
        }

        match Command::new(&self.binary).arg("info").output() {
            Ok(o) if o.status.success() => HealthStatus::Healthy,
            Ok(_) => HealthStatus::Degraded {
                reason: format!("{} daemon may not be running", self.kind),
            },
            Err(e) => HealthStatus::Unhealthy {
                reason: format!("{} error: {e}", self.kind),
            },
        }
    }
}
