//! Host runtime
//!
//! Runs step scripts directly on the host, in the workspace directory. The
//! image is recorded but never pulled. Useful when already inside the build
//! container, and for exercising fail-fast behaviour without a daemon.

use crate::executor::{
    ContainerHandle, ContainerRuntime, HealthStatus, ProvisionRequest, ScriptOutcome, ShellConfig,
    stream_session,
};
use crate::job::JobError;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::process::Command;

#[derive(Debug, Clone)]
struct HostSession {
    cwd: PathBuf,
    env: BTreeMap<String, String>,
}

/// Runtime that runs the shell on the host
#[derive(Debug, Default)]
pub struct HostRuntime {
    shell: ShellConfig,
    sessions: Mutex<HashMap<String, HostSession>>,
}

impl HostRuntime {
    /// Creates a host runtime with the default shell
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the shell configuration
    #[must_use]
    pub fn with_shell(mut self, shell: ShellConfig) -> Self {
        self.shell = shell;
        self
    }

    /// Number of sessions provisioned and not yet torn down
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().len()
    }
}

impl ContainerRuntime for HostRuntime {
    fn name(&self) -> &str {
        "host"
    }

    fn provision_command(&self, request: &ProvisionRequest<'_>) -> Vec<String> {
        let mut argv = vec!["env".to_string()];
        argv.extend(request.context.env.iter().map(|(k, v)| format!("{k}={v}")));
        argv.extend(self.shell.session_argv(&request.spec.script));
        argv
    }

    fn provision(&self, request: &ProvisionRequest<'_>) -> Result<ContainerHandle, JobError> {
        let cwd = request.context.cwd.clone();
        if !cwd.is_dir() {
            return Err(JobError::Provisioning {
                image: request.spec.image.clone(),
                reason: format!("workspace {} is not a directory", cwd.display()),
            });
        }

        tracing::debug!(
            step = request.step_name,
            image = %request.spec.image,
            "Host runtime ignores the image"
        );

        self.sessions.lock().insert(
            request.container_name.clone(),
            HostSession {
                cwd,
                env: request.context.env.clone(),
            },
        );

        Ok(ContainerHandle {
            id: request.container_name.clone(),
            image: request.spec.image.clone(),
        })
    }

    fn run_script(&self, handle: &ContainerHandle, script: &str) -> Result<ScriptOutcome, JobError> {
        let session = self
            .sessions
            .lock()
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| JobError::Runtime(format!("unknown session {}", handle.id)))?;

        let argv = self.shell.session_argv(script);
        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]).current_dir(&session.cwd).envs(&session.env);

        stream_session(cmd, &self.shell)
    }

    fn teardown(&self, handle: &ContainerHandle) -> Result<(), JobError> {
        self.sessions.lock().remove(&handle.id);
        Ok(())
    }

    fn health_check(&self) -> HealthStatus {
        match Command::new(&self.shell.shell).arg("-c").arg("true").output() {
            Ok(output) if output.status.success() => HealthStatus::Healthy,
            Ok(_) => HealthStatus::Unhealthy {
                reason: "Shell command returned non-zero exit code".to_string(),
            },
            Err(e) => HealthStatus::Unhealthy {
                reason: format!("Shell not available: {e}"),
            },
        }
    }
}
