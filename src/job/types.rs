//! Core types for the job domain
//!
//! Run states shared by steps and jobs, and the validation trait.

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a step or a job within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Not reached yet (or never reached because an earlier step failed)
    #[default]
    NotStarted,
    /// Container provisioned, script executing
    Running,
    /// Script exited 0
    Succeeded,
    /// Provisioning failed or script exited non-zero
    Failed,
}

impl RunState {
    /// Returns true if the state is final
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if execution succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Returns true if execution failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Folds step states into the job state.
    ///
    /// Any failure fails the job. The job succeeds only if every step
    /// succeeded; an empty set of steps never succeeds.
    pub fn aggregate<I>(states: I) -> Self
    where
        I: IntoIterator<Item = RunState>,
    {
        let mut seen_any = false;
        let mut all_succeeded = true;
        let mut all_pending = true;

        for state in states {
            seen_any = true;
            match state {
                Self::Failed => return Self::Failed,
                Self::Succeeded => all_pending = false,
                Self::Running => {
                    all_pending = false;
                    all_succeeded = false;
                }
                Self::NotStarted => all_succeeded = false,
            }
        }

        if !seen_any || all_pending {
            Self::NotStarted
        } else if all_succeeded {
            Self::Succeeded
        } else {
            Self::Running
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NOT STARTED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Succeeded => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILURE"),
        }
    }
}

/// Trait for types that can be validated
#[allow(clippy::missing_errors_doc)]
pub trait Validate {
    /// Type of validation error
    type Error;

    /// Validates this type
    fn validate(&self) -> std::result::Result<(), Self::Error>;
}
