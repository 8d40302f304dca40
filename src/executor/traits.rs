//! Job execution traits
//!
//! [`JobExecutor`] drives a whole job; [`ContainerRuntime`] is the seam to
//! whatever provisions containers (Docker, Podman, or the host itself).

use super::report::JobReport;
use super::shell::ScriptOutcome;
use crate::job::{ContainerSpec, Job, JobError, ValidationError};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Trait for executing jobs
#[allow(clippy::missing_errors_doc)]
pub trait JobExecutor: Send + Sync {
    /// Executes a job and returns its report
    fn execute(&self, job: &Job) -> Result<JobReport, JobError>;

    /// Validates a job without executing it
    fn validate(&self, job: &Job) -> Result<(), ValidationError>;

    /// Resolves what would run, without side effects
    fn dry_run(&self, job: &Job) -> Result<Plan, JobError>;

    /// Performs a health check
    fn health_check(&self) -> HealthStatus;
}

/// Provisions containers and runs step scripts inside them
#[allow(clippy::missing_errors_doc)]
pub trait ContainerRuntime: Send + Sync {
    /// Short name used in logs (`docker`, `podman`, `host`)
    fn name(&self) -> &str;

    /// Command line that [`ContainerRuntime::provision`] runs for `request`
    fn provision_command(&self, request: &ProvisionRequest<'_>) -> Vec<String>;

    /// Acquires a container; fails with [`JobError::Provisioning`] when the
    /// image cannot be resolved
    fn provision(&self, request: &ProvisionRequest<'_>) -> Result<ContainerHandle, JobError>;

    /// Streams `script` into a fail-fast shell inside the container
    fn run_script(&self, handle: &ContainerHandle, script: &str)
    -> Result<ScriptOutcome, JobError>;

    /// Releases the container
    fn teardown(&self, handle: &ContainerHandle) -> Result<(), JobError>;

    /// Reports whether the runtime can be used
    fn health_check(&self) -> HealthStatus;
}

/// Everything a runtime needs to provision one step's container
#[derive(Debug, Clone)]
pub struct ProvisionRequest<'a> {
    /// Unique container name for this run and step
    pub container_name: String,

    /// Display name of the step
    pub step_name: &'a str,

    /// Image and script
    pub spec: &'a ContainerSpec,

    /// Run-wide context
    pub context: &'a RunContext,
}

/// A provisioned container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    /// Runtime-specific identifier
    pub id: String,

    /// Image the container was created from
    pub image: String,
}

/// Health status of an executor or runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Fully usable
    Healthy,

    /// Usable, with caveats
    Degraded {
        /// Reason for degradation
        reason: String,
    },

    /// Not usable
    Unhealthy {
        /// Reason for being unhealthy
        reason: String,
    },
}

impl HealthStatus {
    /// Returns true if healthy or degraded
    #[must_use]
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::Unhealthy { .. })
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded { reason } => write!(f, "degraded: {reason}"),
            Self::Unhealthy { reason } => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// Context shared by all steps of one run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Identifier of this run
    pub run_id: Uuid,

    /// Display name of the job
    pub job_name: String,

    /// Variables passed into every container
    pub env: BTreeMap<String, String>,

    /// Workspace directory on the host
    pub cwd: PathBuf,
}

impl RunContext {
    /// Creates a context for a job run rooted at `cwd`
    #[must_use]
    pub fn new(job: &Job, cwd: impl Into<PathBuf>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            job_name: job.name.clone(),
            env: job.environment.vars.clone(),
            cwd: cwd.into(),
        }
    }

    /// Container name for the step at `index`
    #[must_use]
    pub fn container_name(&self, index: usize) -> String {
        let run = self.run_id.simple().to_string();
        format!("jobline-{}-{}", &run[..12], index + 1)
    }
}

/// One resolved step of a dry run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    /// Display name of the step
    pub name: String,

    /// Image reference
    pub image: String,

    /// Provisioning command line
    pub command: Vec<String>,
}

/// Result of a dry run: the steps in execution order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Display name of the job
    pub job: String,

    /// Runtime that would execute the steps
    pub runtime: String,

    /// Steps in execution order
    pub steps: Vec<PlannedStep>,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Job: {} (runtime: {})", self.job, self.runtime)?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "  {}. {} [{}]", i + 1, step.name, step.image)?;
            writeln!(f, "     $ {}", shell_words::join(&step.command))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Step;

    #[test]
    fn test_run_context_takes_job_environment() {
        let job = Job::new("CI")
            .environment(|e| e.set("A", "1"))
            .step(Step::new("s", "alpine", "true"));
        let ctx = RunContext::new(&job, "/work");

        assert_eq!(ctx.job_name, "CI");
        assert_eq!(ctx.env.get("A").unwrap(), "1");
        assert_eq!(ctx.env.len(), 1);
        assert_eq!(ctx.cwd, PathBuf::from("/work"));
    }

    #[test]
    fn test_container_names_are_unique_per_step() {
        let job = Job::new("CI");
        let ctx = RunContext::new(&job, "/work");
        let first = ctx.container_name(0);
        let second = ctx.container_name(1);

        assert!(first.starts_with("jobline-"));
        assert!(first.ends_with("-1"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_health_status_is_operational() {
        assert!(HealthStatus::Healthy.is_operational());
        assert!(HealthStatus::Degraded { reason: "x".to_string() }.is_operational());
        assert!(!HealthStatus::Unhealthy { reason: "x".to_string() }.is_operational());
    }

    #[test]
    fn test_plan_display_quotes_arguments() {
        let plan = Plan {
            job: "CI".to_string(),
            runtime: "docker".to_string(),
            steps: vec![PlannedStep {
                name: "Cargo build".to_string(),
                image: "rust".to_string(),
                command: vec!["docker".to_string(), "create".to_string(), "a b".to_string()],
            }],
        };
        let text = plan.to_string();
        assert!(text.contains("1. Cargo build [rust]"));
        assert!(text.contains("$ docker create 'a b'"));
    }
}
