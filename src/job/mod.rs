//! Job domain types and logic
//!
//! A [`Job`] is a named, ordered list of [`Step`]s. Every step owns exactly
//! one [`ContainerSpec`]: the image to provision and the script body handed
//! verbatim to a shell inside that container.

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

pub mod descriptor;
pub mod errors;
pub mod image;
pub mod templates;
pub mod types;

#[cfg(test)]
mod types_tests;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use descriptor::{Descriptor, DescriptorFormat};
pub use errors::{JobError, ValidationError};
pub use image::ImageReference;
pub use types::{RunState, Validate};

/// Longest accepted display name for jobs and steps
pub const MAX_NAME_LEN: usize = 200;

static ENV_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("env key pattern is valid"));

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong {
            max: MAX_NAME_LEN,
            len,
        });
    }
    Ok(())
}

/// Environment variables handed to every container of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Environment {
    /// Variables as key-value pairs, kept sorted for stable command lines.
    pub vars: BTreeMap<String, String>,
}

impl Environment {
    /// Creates a new empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an environment variable.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Gets an environment variable by name.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.vars.get(key)
    }

    /// Returns true if no variables are set.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Validate for Environment {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        for key in self.vars.keys() {
            if !ENV_KEY_PATTERN.is_match(key) {
                return Err(ValidationError::InvalidEnvKey(key.clone()));
            }
        }
        Ok(())
    }
}

/// Image plus the script executed inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerSpec {
    /// Image reference resolvable by the container runtime
    pub image: String,

    /// Script body, passed to the shell without interpretation
    pub script: String,
}

impl ContainerSpec {
    /// Creates a container specification
    pub fn new(image: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            script: script.into(),
        }
    }

    /// Parses the image reference
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidImage`] if the reference is malformed.
    pub fn image_reference(&self) -> Result<ImageReference, ValidationError> {
        ImageReference::parse(&self.image)
    }
}

/// A single containerized unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Display name, also used as the container's display name
    pub name: String,

    /// Where and what to run
    pub container: ContainerSpec,
}

impl Step {
    /// Creates a new step
    pub fn new(name: impl Into<String>, image: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            container: ContainerSpec::new(image, script),
        }
    }

    /// Image reference string of this step
    pub fn image(&self) -> &str {
        &self.container.image
    }

    /// Script body of this step
    pub fn script(&self) -> &str {
        &self.container.script
    }
}

impl Validate for Step {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        validate_name(&self.name)?;
        self.container.image_reference()?;

        if self.container.script.trim().is_empty() {
            return Err(ValidationError::EmptyScript {
                step: self.name.clone(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step({}): {}", self.name, self.container.image)
    }
}

/// A named CI unit composed of ordered steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    /// Display name; not required to be unique
    pub name: String,

    /// Variables passed into every step's container
    #[serde(default, skip_serializing_if = "Environment::is_empty")]
    pub environment: Environment,

    /// Steps, executed in declared order
    pub steps: Vec<Step>,
}

impl Job {
    /// Creates a job without steps
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environment: Environment::new(),
            steps: Vec::new(),
        }
    }

    /// Appends a step
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Modifies the job environment
    pub fn environment<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Environment) -> Environment,
    {
        self.environment = f(self.environment);
        self
    }

    /// Returns number of steps
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

impl Validate for Job {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        validate_name(&self.name)?;

        if self.steps.is_empty() {
            return Err(ValidationError::EmptyJob {
                job: self.name.clone(),
            });
        }

        self.environment.validate()?;

        for step in &self.steps {
            step.validate()?;
        }

        Ok(())
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({}): {} steps", self.name, self.steps.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_step() -> Step {
        Step::new("Cargo build", "rustlang/rust:nightly", "cargo build")
    }

    #[test]
    fn test_job_builder() {
        let job = Job::new("CI")
            .environment(|e| e.set("CARGO_TERM_COLOR", "always"))
            .step(build_step());

        assert_eq!(job.step_count(), 1);
        assert_eq!(job.environment.get("CARGO_TERM_COLOR").unwrap(), "always");
        assert_eq!(job.to_string(), "Job(CI): 1 steps");
    }

    #[test]
    fn test_valid_job() {
        let job = Job::new("CI").step(build_step());
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_job_without_steps_is_rejected() {
        let err = Job::new("CI").validate().unwrap_err();
        assert_eq!(err, ValidationError::EmptyJob { job: "CI".to_string() });
    }

    #[test]
    fn test_blank_job_name_is_rejected() {
        let job = Job::new("   ").step(build_step());
        assert_eq!(job.validate().unwrap_err(), ValidationError::EmptyName);
    }

    #[test]
    fn test_long_step_name_is_rejected() {
        let step = Step::new("x".repeat(MAX_NAME_LEN + 1), "rust", "true");
        assert!(matches!(
            step.validate(),
            Err(ValidationError::NameTooLong { len, .. }) if len == MAX_NAME_LEN + 1
        ));
    }

    #[test]
    fn test_blank_script_is_rejected() {
        let step = Step::new("Build", "rust", " \n\t");
        assert!(matches!(step.validate(), Err(ValidationError::EmptyScript { .. })));
    }

    #[test]
    fn test_script_contents_are_not_inspected() {
        let step = Step::new("Build", "rust", "this is ( not valid shell");
        assert!(step.validate().is_ok());
    }

    #[test]
    fn test_invalid_image_is_rejected() {
        let job = Job::new("CI").step(Step::new("Build", "Not An Image", "true"));
        assert!(matches!(job.validate(), Err(ValidationError::InvalidImage { .. })));
    }

    #[test]
    fn test_invalid_env_key_is_rejected() {
        let job = Job::new("CI")
            .environment(|e| e.set("1BAD", "x"))
            .step(build_step());
        assert_eq!(
            job.validate().unwrap_err(),
            ValidationError::InvalidEnvKey("1BAD".to_string())
        );
    }

    #[test]
    fn test_duplicate_step_names_are_allowed() {
        let job = Job::new("CI").step(build_step()).step(build_step());
        assert!(job.validate().is_ok());
    }
}
