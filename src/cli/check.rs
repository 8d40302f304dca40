//! `jobline check` - Validate a job descriptor
//!
//! Parsing and validation happen while the descriptor is loaded; this command
//! only reports what was found. Exit code 1 means the descriptor is malformed.

use jobline::job::Job;

/// One line per step: name and image
pub fn summary(job: &Job) -> String {
    let mut out = format!("{} is valid: {} step(s)\n", job.name, job.step_count());
    for (i, step) in job.steps.iter().enumerate() {
        out.push_str(&format!("  {}. {} [{}]\n", i + 1, step.name, step.image()));
    }
    out
}

/// Prints the summary for a valid job
pub fn print_summary(job: &Job) {
    tracing::info!(job = %job.name, "Descriptor is valid");
    print!("{}", summary(job));
}
