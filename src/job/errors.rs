//! Error types for the job domain

use thiserror::Error;

/// Errors that can occur while loading or running a job
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Validation failed with specified reason
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Descriptor could not be read or parsed
    #[error("Invalid descriptor '{path}': {reason}")]
    Descriptor {
        /// Where the descriptor came from.
        path: String,
        /// Parser or IO message.
        reason: String,
    },

    /// Container could not be provisioned from the image
    #[error("Failed to provision container from '{image}': {reason}")]
    Provisioning {
        /// Image reference that could not be resolved.
        image: String,
        /// Message reported by the container runtime.
        reason: String,
    },

    /// A command inside the step script exited non-zero
    #[error("Step '{step}' failed with exit code {code}")]
    StepFailed {
        /// Display name of the failed step.
        step: String,
        /// Exit status of the shell session.
        code: i32,
    },

    /// Container runtime misbehaved outside of provisioning
    #[error("Container runtime error: {0}")]
    Runtime(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for JobError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl JobError {
    /// Returns true for errors caused by the descriptor itself
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Descriptor { .. })
    }
}

/// Validation errors for job components
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name cannot be empty
    #[error("Name cannot be empty")]
    EmptyName,

    /// Name too long
    #[error("Name too long: max {max} characters, got {len}")]
    NameTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length of the name.
        len: usize,
    },

    /// Job must have at least one step
    #[error("Job '{job}' must have at least one step")]
    EmptyJob {
        /// Name of the empty job.
        job: String,
    },

    /// Step script is blank
    #[error("Step '{step}' has an empty script")]
    EmptyScript {
        /// Name of the step.
        step: String,
    },

    /// Image reference does not follow the reference grammar
    #[error("Invalid image reference '{reference}': {reason}")]
    InvalidImage {
        /// The rejected reference.
        reference: String,
        /// Which part is malformed.
        reason: String,
    },

    /// Environment variable name is not a shell identifier
    #[error("Invalid environment variable name: '{0}'")]
    InvalidEnvKey(String),
}
