//! Built-in job descriptors

use super::{Job, Step};

/// Display name of the cargo CI job
pub const CARGO_CI_JOB_NAME: &str = "Build, run tests, and lint";

/// Display name of its single container step
pub const CARGO_CI_STEP_NAME: &str = "Cargo build";

/// Image the cargo CI step runs in
pub const CARGO_CI_IMAGE: &str = "rustlang/rust:nightly";

/// Script of the cargo CI step.
///
/// The registry publish block stays commented out: nothing decides when a
/// publish should happen, so it never runs.
pub const CARGO_CI_SCRIPT: &str = r#"set -eux
# Check formatting
cargo fmt --check --verbose
# Build the Rust project
cargo build --verbose
# Run tests
cargo test --verbose
# Lint with clippy
cargo clippy --all-targets --all-features --verbose
# Publish to sparse Cargo registry
# export CARGO_UNSTABLE_SPARSE_REGISTRY=true
# export CARGO_UNSTABLE_REGISTRY_AUTH=true
# cargo login --registry=space-registry "Bearer $JB_SPACE_CLIENT_TOKEN"
# cargo publish --verbose --registry=space-registry
"#;

/// Format-check, build, test and lint a cargo project in one container.
#[must_use]
pub fn cargo_ci() -> Job {
    cargo_ci_with_image(CARGO_CI_IMAGE)
}

/// Same as [`cargo_ci`] on a different toolchain image.
#[must_use]
pub fn cargo_ci_with_image(image: impl Into<String>) -> Job {
    Job::new(CARGO_CI_JOB_NAME).step(Step::new(CARGO_CI_STEP_NAME, image, CARGO_CI_SCRIPT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Validate;

    fn executable_lines(script: &str) -> Vec<&str> {
        script
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect()
    }

    #[test]
    fn test_cargo_ci_is_valid() {
        assert!(cargo_ci().validate().is_ok());
    }

    #[test]
    fn test_cargo_ci_shape() {
        let job = cargo_ci();
        assert_eq!(job.name, CARGO_CI_JOB_NAME);
        assert_eq!(job.step_count(), 1);
        assert_eq!(job.steps[0].name, CARGO_CI_STEP_NAME);
        assert_eq!(job.steps[0].image(), "rustlang/rust:nightly");
    }

    #[test]
    fn test_tool_order_is_fmt_build_test_clippy() {
        let lines = executable_lines(CARGO_CI_SCRIPT);
        assert_eq!(
            lines,
            vec![
                "set -eux",
                "cargo fmt --check --verbose",
                "cargo build --verbose",
                "cargo test --verbose",
                "cargo clippy --all-targets --all-features --verbose",
            ]
        );
    }

    #[test]
    fn test_publish_block_is_inert() {
        assert!(CARGO_CI_SCRIPT.contains("# cargo publish"));
        assert!(
            !executable_lines(CARGO_CI_SCRIPT)
                .iter()
                .any(|l| l.contains("publish") || l.contains("login"))
        );
    }

    #[test]
    fn test_custom_image() {
        let job = cargo_ci_with_image("rust:1.80");
        assert_eq!(job.steps[0].image(), "rust:1.80");
        assert_eq!(job.steps[0].script(), CARGO_CI_SCRIPT);
    }
}
