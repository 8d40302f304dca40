//! Prelude module for common imports

pub use crate::job::templates;
pub use crate::job::{
    ContainerSpec, Descriptor, Environment, ImageReference, Job, JobError, RunState, Step,
    Validate, ValidationError,
};

pub use crate::executor::{
    ContainerRuntime, FailureKind, HealthStatus, JobExecutor, JobReport, Plan, RunContext,
    RunListener, RunRecorder, SequentialExecutor, ShellConfig, StepReport,
};

pub use crate::infrastructure::{CliRuntime, Config, HostRuntime, RuntimeKind};
