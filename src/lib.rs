//! # jobline - containerized CI jobs
//!
//! A job is a named, ordered list of steps. Each step names a container image
//! and a shell script. Running a job means, for every step in order:
//!
//! 1. provision a container from the image,
//! 2. run the script in a fail-fast shell (`sh -e -c <script>`) inside it,
//! 3. tear the container down, whatever happened,
//! 4. stop at the first step that failed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jobline::prelude::*;
//! use std::sync::Arc;
//!
//! let job = templates::cargo_ci();
//! let executor = SequentialExecutor::new(Arc::new(CliRuntime::docker()));
//! let report = executor.execute(&job)?;
//! println!("{report}");
//! # Ok::<(), JobError>(())
//! ```
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <https://www.apache.org/licenses/LICENSE-2.0>)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or <https://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod executor;
pub mod infrastructure;
pub mod job;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use executor::{
    ContainerRuntime, HealthStatus, JobExecutor, JobReport, Plan, RunContext, SequentialExecutor,
    ShellConfig, StepReport,
};
pub use infrastructure::{CliRuntime, Config, HostRuntime, RuntimeKind};
pub use job::{ContainerSpec, Descriptor, Job, JobError, RunState, Step, Validate, ValidationError};

/// Version of the jobline crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
