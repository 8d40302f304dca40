//! `jobline run` - Execute a job
//!
//! Steps run in order, each in its own container; the first failing step
//! stops the job. The process exits 0 only if every step succeeded.
//!
//! ```bash
//! jobline run                       # .jobline.yml on docker
//! jobline run ci.yml --runtime podman --report run.json
//! jobline run --builtin --runtime host
//! ```

use anyhow::{Context, Result};
use jobline::executor::{JobExecutor, JobReport, SequentialExecutor};
use jobline::infrastructure::Config;
use jobline::job::Job;
use std::fs;
use std::path::Path;

/// Runs `job` with the runtime described by `config`.
///
/// Returns whether the job succeeded.
pub fn run_job(job: &Job, config: &Config, report_path: Option<&Path>) -> Result<bool> {
    let runtime = config.build_runtime();
    let health = runtime.health_check();
    if !health.is_operational() {
        tracing::warn!(runtime = runtime.name(), status = %health, "Runtime health check failed");
    }

    let executor = SequentialExecutor::new(runtime);
    let report = executor
        .execute(job)
        .with_context(|| format!("Job '{}' could not be started", job.name))?;

    if let Some(path) = report_path {
        save_report(&report, path)?;
    }

    print_report(&report);
    Ok(report.is_success())
}

fn print_report(report: &JobReport) {
    eprintln!();
    eprint!("{report}");

    if let Some(error) = report.error() {
        eprintln!("Error: {error}");
    }

    if let Some(step) = report.failed_step() {
        if !step.output_tail.is_empty() {
            eprintln!("--- last output of '{}' ---", step.name);
            for line in &step.output_tail {
                eprintln!("{line}");
            }
        }
    }
}

/// Writes the report as JSON
pub fn save_report(report: &JobReport, path: &Path) -> Result<()> {
    let json = report.to_json().context("Failed to serialize run report")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write run report to: {}", path.display()))?;
    Ok(())
}
