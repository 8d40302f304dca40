//! Infrastructure layer
//!
//! This module contains the container runtimes and process-wide setup.

mod config;
pub mod container;
pub mod host;
mod logging;

pub use config::Config;
pub use container::{CliRuntime, RuntimeKind};
pub use host::HostRuntime;
pub use logging::init_logging;
