//! Run reports
//!
//! A [`JobReport`] starts with every step `NotStarted` and is updated as the
//! executor walks the steps. Steps after a failure keep `NotStarted`.

use crate::job::{Job, JobError, RunState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Why a step failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// Container could not be created from the image; no script line ran
    Provisioning {
        /// Runtime message
        reason: String,
    },
    /// Script exited non-zero
    ExitStatus {
        /// Exit status of the shell session
        code: i32,
    },
    /// Runtime could not run the script at all
    Runtime {
        /// Runtime message
        reason: String,
    },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provisioning { reason } => write!(f, "provisioning failed: {reason}"),
            Self::ExitStatus { code } => write!(f, "exit code {code}"),
            Self::Runtime { reason } => write!(f, "runtime error: {reason}"),
        }
    }
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Display name
    pub name: String,

    /// Image reference
    pub image: String,

    /// Final (or current) state
    pub state: RunState,

    /// Exit status, when the script ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Set when `state` is `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,

    /// Time from provisioning to teardown
    #[serde(with = "duration_ms")]
    pub duration: Duration,

    /// Last lines of output
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub output_tail: Vec<String>,
}

impl StepReport {
    fn pending(name: &str, image: &str) -> Self {
        Self {
            name: name.to_string(),
            image: image.to_string(),
            state: RunState::NotStarted,
            exit_code: None,
            failure: None,
            duration: Duration::ZERO,
            output_tail: Vec::new(),
        }
    }
}

/// Outcome of a job run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    /// Run identifier
    pub run_id: Uuid,

    /// Display name of the job
    pub job: String,

    /// Runtime the steps ran on
    pub runtime: String,

    /// Per-step outcomes, in declared order
    pub steps: Vec<StepReport>,
}

impl JobReport {
    /// Creates a report with every step `NotStarted`
    #[must_use]
    pub fn pending(job: &Job, run_id: Uuid, runtime: impl Into<String>) -> Self {
        Self {
            run_id,
            job: job.name.clone(),
            runtime: runtime.into(),
            steps: job
                .steps
                .iter()
                .map(|s| StepReport::pending(&s.name, s.image()))
                .collect(),
        }
    }

    /// Aggregated job state
    #[must_use]
    pub fn state(&self) -> RunState {
        RunState::aggregate(self.steps.iter().map(|s| s.state))
    }

    /// Returns true if every step succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state().is_success()
    }

    /// The step the failure is attributed to
    #[must_use]
    pub fn failed_step(&self) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.state.is_failure())
    }

    /// The error that stopped the job, if a step failed
    #[must_use]
    pub fn error(&self) -> Option<JobError> {
        let step = self.failed_step()?;
        Some(match step.failure.as_ref()? {
            FailureKind::ExitStatus { code } => JobError::StepFailed {
                step: step.name.clone(),
                code: *code,
            },
            FailureKind::Provisioning { reason } => JobError::Provisioning {
                image: step.image.clone(),
                reason: reason.clone(),
            },
            FailureKind::Runtime { reason } => JobError::Runtime(reason.clone()),
        })
    }

    /// Total time spent in steps
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// Renders the report as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which only happens on non-string map keys.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Job '{}': {}", self.job, self.state())?;
        for step in &self.steps {
            write!(f, "  [{}] {} ({})", step.state, step.name, step.image)?;
            if let Some(failure) = &step.failure {
                write!(f, ": {failure}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
