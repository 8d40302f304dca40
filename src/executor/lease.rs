//! Scoped container ownership
//!
//! A [`ContainerLease`] owns a provisioned container for the duration of one
//! step. The container is torn down by [`ContainerLease::release`] or, if the
//! lease is dropped without being released, by `Drop`.

use super::shell::ScriptOutcome;
use super::traits::{ContainerHandle, ContainerRuntime, ProvisionRequest};
use crate::job::JobError;

/// Guard that tears its container down exactly once
pub struct ContainerLease<'r> {
    runtime: &'r dyn ContainerRuntime,
    handle: Option<ContainerHandle>,
}

impl<'r> ContainerLease<'r> {
    /// Provisions a container for `request`.
    ///
    /// # Errors
    ///
    /// Whatever [`ContainerRuntime::provision`] returns. No container is held
    /// when provisioning fails.
    pub fn acquire(
        runtime: &'r dyn ContainerRuntime,
        request: &ProvisionRequest<'_>,
    ) -> Result<Self, JobError> {
        let handle = runtime.provision(request)?;
        tracing::debug!(
            runtime = runtime.name(),
            container = %handle.id,
            image = %handle.image,
            "Container provisioned"
        );
        Ok(Self {
            runtime,
            handle: Some(handle),
        })
    }

    /// Identifier of the leased container
    #[must_use]
    pub fn id(&self) -> &str {
        self.handle.as_ref().map_or("", |h| h.id.as_str())
    }

    /// Runs the step script inside the leased container.
    ///
    /// # Errors
    ///
    /// [`JobError::Runtime`] if the lease was already released or the
    /// runtime could not run the script.
    pub fn run(&self, script: &str) -> Result<ScriptOutcome, JobError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| JobError::Runtime("container already released".to_string()))?;
        self.runtime.run_script(handle, script)
    }

    /// Tears the container down now.
    ///
    /// # Errors
    ///
    /// Whatever [`ContainerRuntime::teardown`] returns.
    pub fn release(mut self) -> Result<(), JobError> {
        match self.handle.take() {
            Some(handle) => self.runtime.teardown(&handle),
            None => Ok(()),
        }
    }
}

impl Drop for ContainerLease<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.runtime.teardown(&handle) {
                tracing::warn!(container = %handle.id, error = %e, "Failed to tear down container");
            }
        }
    }
}
