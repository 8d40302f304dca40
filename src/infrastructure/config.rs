//! Configuration management

use super::container::{CliRuntime, DEFAULT_WORKSPACE_MOUNT, RuntimeKind};
use super::host::HostRuntime;
use crate::executor::{ContainerRuntime, DEFAULT_TAIL_LINES, ShellConfig};
use crate::job::JobError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Container runtime
    pub runtime: RuntimeKind,
    /// Runtime executable, when not on `PATH` under its usual name
    pub runtime_binary: Option<String>,
    /// Shell started inside containers
    pub shell: String,
    /// Trace script commands (`-x`)
    pub trace: bool,
    /// Mirror step output on the terminal
    pub echo_output: bool,
    /// Output lines kept per failed step
    pub tail_lines: usize,
    /// Workspace mount point inside containers
    pub workspace_mount: String,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime: RuntimeKind::Docker,
            runtime_binary: None,
            shell: "sh".to_string(),
            trace: false,
            echo_output: true,
            tail_lines: DEFAULT_TAIL_LINES,
            workspace_mount: DEFAULT_WORKSPACE_MOUNT.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads a YAML configuration file
    ///
    /// # Errors
    ///
    /// [`JobError::Descriptor`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, JobError> {
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| JobError::Descriptor {
            path: origin.clone(),
            reason: e.to_string(),
        })?;
        serde_yaml::from_str(&text).map_err(|e| JobError::Descriptor {
            path: origin,
            reason: e.to_string(),
        })
    }

    /// Shell settings derived from this configuration
    #[must_use]
    pub fn shell_config(&self) -> ShellConfig {
        ShellConfig {
            shell: self.shell.clone(),
            trace: self.trace,
            echo_output: self.echo_output,
            tail_lines: self.tail_lines,
        }
    }

    /// Builds the configured runtime
    #[must_use]
    pub fn build_runtime(&self) -> Arc<dyn ContainerRuntime> {
        let cli = match self.runtime {
            RuntimeKind::Host => {
                return Arc::new(HostRuntime::new().with_shell(self.shell_config()));
            }
            RuntimeKind::Docker => CliRuntime::docker(),
            RuntimeKind::Podman => CliRuntime::podman(),
        };

        let cli = cli
            .with_shell(self.shell_config())
            .with_workspace_mount(self.workspace_mount.clone());

        match &self.runtime_binary {
            Some(binary) => Arc::new(cli.with_binary(binary.clone())),
            None => Arc::new(cli),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.runtime, RuntimeKind::Docker);
        assert_eq!(config.shell, "sh");
        assert_eq!(config.log_level, "info");
        assert!(config.echo_output);
    }

    #[test]
    fn test_partial_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobline.yml");
        std::fs::write(&path, "runtime: podman\ntrace: true\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.runtime, RuntimeKind::Podman);
        assert!(config.trace);
        assert_eq!(config.workspace_mount, "/workspace");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobline.yml");
        std::fs::write(&path, "runtme: podman\n").unwrap();

        assert!(matches!(Config::load(&path), Err(JobError::Descriptor { .. })));
    }

    #[test]
    fn test_build_runtime() {
        let mut config = Config::default();
        assert_eq!(config.build_runtime().name(), "docker");
        config.runtime = RuntimeKind::Host;
        assert_eq!(config.build_runtime().name(), "host");
    }

    #[test]
    fn test_shell_config() {
        let config = Config {
            trace: true,
            echo_output: false,
            ..Config::default()
        };
        let shell = config.shell_config();
        assert!(shell.trace);
        assert!(!shell.echo_output);
        assert_eq!(shell.session_argv("true"), vec!["sh", "-e", "-x", "-c", "true"]);
    }
}
