//! Job execution layer
//!
//! This module contains the executor trait, the container runtime seam and
//! the sequential fail-fast executor built on them.

mod lease;
mod listener;
mod report;
mod sequential;
mod shell;
mod traits;

#[cfg(test)]
pub(crate) mod fake;

pub use lease::ContainerLease;
pub use listener::{RunEvent, RunListener, RunRecorder, TracingListener};
pub use report::{FailureKind, JobReport, StepReport};
pub use sequential::SequentialExecutor;
pub use shell::{DEFAULT_TAIL_LINES, ScriptOutcome, ShellConfig, stream_session};
pub use traits::{
    ContainerHandle, ContainerRuntime, HealthStatus, JobExecutor, Plan, PlannedStep,
    ProvisionRequest, RunContext,
};
