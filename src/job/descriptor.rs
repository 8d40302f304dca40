//! Loading and rendering job descriptors
//!
//! Descriptors are YAML documents (JSON is accepted for `.json` files).
//! Parsing rejects unknown fields; [`Descriptor::load`] also validates, so a
//! malformed descriptor never reaches the executor.

use super::errors::JobError;
use super::types::Validate;
use super::Job;
use std::fs;
use std::path::Path;

/// Serialization format of a descriptor file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    /// YAML document (default)
    Yaml,
    /// JSON document
    Json,
}

impl DescriptorFormat {
    /// Picks the format from a file extension, defaulting to YAML
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Entry points for reading and writing [`Job`] descriptors
pub struct Descriptor;

impl Descriptor {
    /// Reads, parses and validates a descriptor file.
    ///
    /// # Errors
    ///
    /// [`JobError::Descriptor`] if the file cannot be read or parsed,
    /// [`JobError::Validation`] if the job is malformed.
    pub fn load(path: &Path) -> Result<Job, JobError> {
        let origin = path.display().to_string();
        tracing::debug!(path = %origin, "Loading job descriptor");

        let text = fs::read_to_string(path).map_err(|e| JobError::Descriptor {
            path: origin.clone(),
            reason: e.to_string(),
        })?;

        let job = match DescriptorFormat::from_path(path) {
            DescriptorFormat::Yaml => Self::parse_yaml(&text, &origin)?,
            DescriptorFormat::Json => Self::parse_json(&text, &origin)?,
        };

        job.validate()?;
        Ok(job)
    }

    /// Parses and validates YAML text.
    ///
    /// # Errors
    ///
    /// See [`Descriptor::load`].
    pub fn from_yaml_str(text: &str) -> Result<Job, JobError> {
        let job = Self::parse_yaml(text, "<inline>")?;
        job.validate()?;
        Ok(job)
    }

    /// Renders a job as YAML.
    ///
    /// # Errors
    ///
    /// [`JobError::Descriptor`] if serialization fails.
    pub fn to_yaml(job: &Job) -> Result<String, JobError> {
        serde_yaml::to_string(job).map_err(|e| JobError::Descriptor {
            path: job.name.clone(),
            reason: e.to_string(),
        })
    }

    fn parse_yaml(text: &str, origin: &str) -> Result<Job, JobError> {
        serde_yaml::from_str(text).map_err(|e| JobError::Descriptor {
            path: origin.to_string(),
            reason: e.to_string(),
        })
    }

    fn parse_json(text: &str, origin: &str) -> Result<Job, JobError> {
        serde_json::from_str(text).map_err(|e| JobError::Descriptor {
            path: origin.to_string(),
            reason: e.to_string(),
        })
    }
}
