//! `jobline plan` - Dry run
//!
//! Validates the job and prints, per step, the provisioning command the
//! configured runtime would issue. Nothing is pulled, created or executed.

use anyhow::{Context, Result};
use jobline::executor::{JobExecutor, Plan, SequentialExecutor};
use jobline::infrastructure::Config;
use jobline::job::Job;

/// Resolves the plan for `job`
pub fn plan_job(job: &Job, config: &Config) -> Result<Plan> {
    SequentialExecutor::new(config.build_runtime())
        .dry_run(job)
        .with_context(|| format!("Failed to plan job '{}'", job.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobline::infrastructure::RuntimeKind;
    use jobline::job::templates;

    #[test]
    fn test_plan_builtin_on_docker() {
        let plan = plan_job(&templates::cargo_ci(), &Config::default()).unwrap();
        assert_eq!(plan.runtime, "docker");
        assert_eq!(plan.steps.len(), 1);
        let command = &plan.steps[0].command;
        assert_eq!(command[..2], ["docker", "create"]);
        assert_eq!(
            command[command.len() - 4..],
            ["rustlang/rust:nightly", "tail", "-f", "/dev/null"]
        );
        assert!(plan.to_string().contains("1. Cargo build [rustlang/rust:nightly]"));
    }

    #[test]
    fn test_plan_on_podman_binary() {
        let config = Config {
            runtime: RuntimeKind::Podman,
            runtime_binary: Some("/opt/podman".to_string()),
            ..Config::default()
        };
        let plan = plan_job(&templates::cargo_ci(), &config).unwrap();
        assert_eq!(plan.steps[0].command[0], "/opt/podman");
    }
}
