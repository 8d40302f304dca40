use super::lease::ContainerLease;
use super::listener::{RunEvent, RunListener, TracingListener};
use super::report::{FailureKind, JobReport};
use super::shell::ScriptOutcome;
use super::traits::{
    ContainerRuntime, HealthStatus, JobExecutor, Plan, PlannedStep, ProvisionRequest, RunContext,
};
use crate::job::{Job, JobError, RunState, Step, Validate, ValidationError};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Runs steps one at a time, in declared order, stopping at the first failure
#[derive(Clone)]
pub struct SequentialExecutor {
    runtime: Arc<dyn ContainerRuntime>,
    listeners: Vec<Arc<dyn RunListener>>,
    cwd: PathBuf,
}

impl std::fmt::Debug for SequentialExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequentialExecutor")
            .field("runtime", &self.runtime.name())
            .field("listeners", &self.listeners.len())
            .field("cwd", &self.cwd)
            .finish()
    }
}

impl SequentialExecutor {
    /// Creates an executor on `runtime`, using the current directory as workspace
    #[must_use]
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            runtime,
            listeners: vec![Arc::new(TracingListener)],
            cwd: workspace_or_dot(std::env::current_dir()),
        }
    }

    /// Sets the workspace directory
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Adds a listener
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn RunListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    fn emit(&self, event: &RunEvent) {
        for listener in &self.listeners {
            listener.on_event(event);
        }
    }

    fn set_state(&self, report: &mut JobReport, index: usize, state: RunState) {
        report.steps[index].state = state;
        self.emit(&RunEvent::StepStateChanged {
            index,
            step: report.steps[index].name.clone(),
            state,
        });
    }

    /// Provisions, runs and tears down one step's container.
    fn run_step(
        &self,
        index: usize,
        step: &Step,
        context: &RunContext,
    ) -> Result<ScriptOutcome, JobError> {
        let request = ProvisionRequest {
            container_name: context.container_name(index),
            step_name: &step.name,
            spec: &step.container,
            context,
        };

        let lease = ContainerLease::acquire(self.runtime.as_ref(), &request)?;
        let container = lease.id().to_string();
        let outcome = lease.run(step.script());

        if let Err(e) = lease.release() {
            tracing::warn!(step = %step.name, container = %container, error = %e, "Teardown failed");
        }
        self.emit(&RunEvent::ContainerReleased { index, container });

        outcome
    }
}

fn workspace_or_dot(current: io::Result<PathBuf>) -> PathBuf {
    current.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Cannot resolve the current directory, using '.' as workspace");
        PathBuf::from(".")
    })
}

impl JobExecutor for SequentialExecutor {
    fn execute(&self, job: &Job) -> Result<JobReport, JobError> {
        job.validate()?;

        let context = RunContext::new(job, &self.cwd);
        let mut report = JobReport::pending(job, context.run_id, self.runtime.name());

        tracing::info!(
            job = %job.name,
            run_id = %context.run_id,
            runtime = self.runtime.name(),
            steps = job.steps.len(),
            "Starting job"
        );
        self.emit(&RunEvent::JobStarted {
            run_id: context.run_id,
            job: job.name.clone(),
            steps: job.steps.len(),
        });

        for (index, step) in job.steps.iter().enumerate() {
            tracing::info!(step = %step.name, image = %step.image(), "Executing step");
            self.set_state(&mut report, index, RunState::Running);

            let start = Instant::now();
            let result = self.run_step(index, step, &context);
            report.steps[index].duration = start.elapsed();

            let state = match result {
                Ok(outcome) => {
                    let entry = &mut report.steps[index];
                    entry.exit_code = Some(outcome.exit_code);
                    if outcome.is_success() {
                        RunState::Succeeded
                    } else {
                        entry.failure = Some(FailureKind::ExitStatus {
                            code: outcome.exit_code,
                        });
                        entry.output_tail = outcome.output_tail;
                        RunState::Failed
                    }
                }
                Err(JobError::Provisioning { reason, .. }) => {
                    report.steps[index].failure = Some(FailureKind::Provisioning { reason });
                    RunState::Failed
                }
                Err(e) => {
                    report.steps[index].failure = Some(FailureKind::Runtime {
                        reason: e.to_string(),
                    });
                    RunState::Failed
                }
            };

            self.set_state(&mut report, index, state);
            tracing::info!(
                step = %step.name,
                result = %state,
                duration_ms = report.steps[index].duration.as_millis(),
                "Step completed"
            );

            if state.is_failure() {
                if let Some(error) = report.error() {
                    tracing::error!(step = %step.name, error = %error, "Step failed, stopping job");
                }
                break;
            }
        }

        let state = report.state();
        self.emit(&RunEvent::JobFinished {
            run_id: context.run_id,
            state,
        });
        tracing::info!(job = %job.name, result = %state, "Job completed");

        Ok(report)
    }

    fn validate(&self, job: &Job) -> Result<(), ValidationError> {
        job.validate()
    }

    fn dry_run(&self, job: &Job) -> Result<Plan, JobError> {
        tracing::info!(job = %job.name, runtime = self.runtime.name(), "Starting dry run");

        job.validate()?;

        let context = RunContext::new(job, &self.cwd);
        let steps = job
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let request = ProvisionRequest {
                    container_name: context.container_name(index),
                    step_name: &step.name,
                    spec: &step.container,
                    context: &context,
                };
                tracing::debug!(step = %step.name, "Would execute step");
                PlannedStep {
                    name: step.name.clone(),
                    image: step.image().to_string(),
                    command: self.runtime.provision_command(&request),
                }
            })
            .collect();

        Ok(Plan {
            job: job.name.clone(),
            runtime: self.runtime.name().to_string(),
            steps,
        })
    }

    fn health_check(&self) -> HealthStatus {
        self.runtime.health_check()
    }
}
