//! In-memory runtime for executor tests

use super::shell::ScriptOutcome;
use super::traits::{ContainerHandle, ContainerRuntime, HealthStatus, ProvisionRequest};
use crate::job::JobError;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Debug, Default)]
struct Calls {
    provisions: usize,
    teardowns: usize,
    active: HashSet<String>,
    scripts: Vec<String>,
}

/// Records every call; outcomes are keyed by image or script text
#[derive(Debug, Default)]
pub(crate) struct FakeRuntime {
    unresolvable: HashSet<String>,
    failing_scripts: HashMap<String, i32>,
    broken_scripts: HashSet<String>,
    stuck_containers: bool,
    calls: Mutex<Calls>,
}

impl FakeRuntime {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn unresolvable(mut self, image: &str) -> Self {
        self.unresolvable.insert(image.to_string());
        self
    }

    pub(crate) fn fail_script(mut self, script: &str, code: i32) -> Self {
        self.failing_scripts.insert(script.to_string(), code);
        self
    }

    pub(crate) fn broken_run(mut self, script: &str) -> Self {
        self.broken_scripts.insert(script.to_string());
        self
    }

    /// Every teardown reports an error, after forgetting the container
    pub(crate) fn failing_teardown(mut self) -> Self {
        self.stuck_containers = true;
        self
    }

    pub(crate) fn provisions(&self) -> usize {
        self.calls.lock().provisions
    }

    pub(crate) fn teardowns(&self) -> usize {
        self.calls.lock().teardowns
    }

    pub(crate) fn active_containers(&self) -> usize {
        self.calls.lock().active.len()
    }

    pub(crate) fn scripts_run(&self) -> Vec<String> {
        self.calls.lock().scripts.clone()
    }
}

impl ContainerRuntime for FakeRuntime {
    fn name(&self) -> &str {
        "fake"
    }

    fn provision_command(&self, request: &ProvisionRequest<'_>) -> Vec<String> {
        vec![
            "fake".to_string(),
            request.container_name.clone(),
            request.spec.image.clone(),
        ]
    }

    fn provision(&self, request: &ProvisionRequest<'_>) -> Result<ContainerHandle, JobError> {
        let mut calls = self.calls.lock();
        calls.provisions += 1;
        if self.unresolvable.contains(&request.spec.image) {
            return Err(JobError::Provisioning {
                image: request.spec.image.clone(),
                reason: "manifest unknown".to_string(),
            });
        }
        calls.active.insert(request.container_name.clone());
        Ok(ContainerHandle {
            id: request.container_name.clone(),
            image: request.spec.image.clone(),
        })
    }

    fn run_script(&self, _handle: &ContainerHandle, script: &str) -> Result<ScriptOutcome, JobError> {
        if self.broken_scripts.contains(script) {
            return Err(JobError::Runtime("attach failed".to_string()));
        }
        self.calls.lock().scripts.push(script.to_string());
        let exit_code = self.failing_scripts.get(script).copied().unwrap_or(0);
        Ok(ScriptOutcome {
            exit_code,
            output_tail: vec![format!("ran {script}")],
            duration: Duration::ZERO,
        })
    }

    fn teardown(&self, handle: &ContainerHandle) -> Result<(), JobError> {
        let mut calls = self.calls.lock();
        calls.teardowns += 1;
        calls.active.remove(&handle.id);
        if self.stuck_containers {
            return Err(JobError::Runtime(format!(
                "failed to remove container {}: device or resource busy",
                handle.id
            )));
        }
        Ok(())
    }

    fn health_check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}
