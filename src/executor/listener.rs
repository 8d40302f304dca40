//! Run listeners
//!
//! Listeners observe state transitions while a job runs. The executor emits
//! `Running` before provisioning a step and the terminal state after its
//! container has been torn down.

use crate::job::RunState;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// Execution event types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// Job started
    JobStarted {
        /// Run identifier
        run_id: Uuid,
        /// Display name of the job
        job: String,
        /// Number of declared steps
        steps: usize,
    },
    /// A step changed state
    StepStateChanged {
        /// Position in the job
        index: usize,
        /// Display name of the step
        step: String,
        /// New state
        state: RunState,
    },
    /// Container for a step has been released
    ContainerReleased {
        /// Position in the job
        index: usize,
        /// Runtime identifier of the container
        container: String,
    },
    /// Job reached its final state
    JobFinished {
        /// Run identifier
        run_id: Uuid,
        /// Aggregated job state
        state: RunState,
    },
}

/// Listener trait for run events
pub trait RunListener: Send + Sync {
    /// Called when an event occurs
    fn on_event(&self, event: &RunEvent);
}

/// Writes events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl RunListener for TracingListener {
    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::JobStarted { run_id, job, steps } => {
                tracing::info!(run_id = %run_id, job = %job, steps, "Job started");
            }
            RunEvent::StepStateChanged { index, step, state } if state.is_terminal() => {
                tracing::info!(index, step = %step, state = %state, "Step finished");
            }
            RunEvent::StepStateChanged { index, step, state } => {
                tracing::debug!(index, step = %step, state = %state, "Step state changed");
            }
            RunEvent::ContainerReleased { index, container } => {
                tracing::debug!(index, container = %container, "Container released");
            }
            RunEvent::JobFinished { run_id, state } => {
                tracing::info!(run_id = %run_id, state = %state, "Job finished");
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default, Clone)]
pub struct RunRecorder {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl RunRecorder {
    /// Creates an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events received so far
    #[must_use]
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().clone()
    }

    /// States the step at `index` went through, in order
    #[must_use]
    pub fn step_states(&self, index: usize) -> Vec<RunState> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                RunEvent::StepStateChanged { index: i, state, .. } if *i == index => Some(*state),
                _ => None,
            })
            .collect()
    }
}

impl RunListener for RunRecorder {
    fn on_event(&self, event: &RunEvent) {
        self.events.lock().push(event.clone());
    }
}
