//! jobline - run containerized CI jobs
//!
//! Each step of a job descriptor is provisioned as a container, its script
//! run in a fail-fast shell, and the container torn down afterwards.
//!
//! ## Commands
//!
//! - `jobline run` - Execute a job
//! - `jobline check` - Validate a job descriptor
//! - `jobline plan` - Show the container commands a run would issue
//! - `jobline init` - Write the built-in cargo CI descriptor
//! - `jobline completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Write .jobline.yml (fmt, build, test, clippy on rustlang/rust:nightly)
//! jobline init
//!
//! # Validate it
//! jobline check
//!
//! # Run it on docker, keeping a JSON report
//! jobline run --report run.json
//! ```

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if std::env::var("JOBLINE_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
