//! Tests for job types
//!
//! Run states, their aggregation, and the error types.

#[cfg(test)]
mod types_tests {
    use super::super::*;

    #[test]
    fn test_run_state_default_is_not_started() {
        assert_eq!(RunState::default(), RunState::NotStarted);
    }

    #[test]
    fn test_run_state_predicates() {
        assert!(RunState::Succeeded.is_success());
        assert!(RunState::Failed.is_failure());
        assert!(RunState::Succeeded.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(!RunState::NotStarted.is_terminal());
    }

    #[test]
    fn test_run_state_display() {
        assert_eq!(RunState::NotStarted.to_string(), "NOT STARTED");
        assert_eq!(RunState::Running.to_string(), "RUNNING");
        assert_eq!(RunState::Succeeded.to_string(), "SUCCESS");
        assert_eq!(RunState::Failed.to_string(), "FAILURE");
    }

    #[test]
    fn test_run_state_serialize() {
        let json = serde_json::to_string(&RunState::NotStarted).unwrap();
        assert_eq!(json, r#""not_started""#);
        let state: RunState = serde_json::from_str(r#""failed""#).unwrap();
        assert_eq!(state, RunState::Failed);
    }

    #[test]
    fn test_aggregate_all_succeeded() {
        let states = [RunState::Succeeded, RunState::Succeeded];
        assert_eq!(RunState::aggregate(states), RunState::Succeeded);
    }

    #[test]
    fn test_aggregate_any_failure_fails() {
        let states = [RunState::Succeeded, RunState::Failed, RunState::NotStarted];
        assert_eq!(RunState::aggregate(states), RunState::Failed);
    }

    #[test]
    fn test_aggregate_in_progress() {
        let states = [RunState::Succeeded, RunState::NotStarted];
        assert_eq!(RunState::aggregate(states), RunState::Running);
        let states = [RunState::Running, RunState::NotStarted];
        assert_eq!(RunState::aggregate(states), RunState::Running);
    }

    #[test]
    fn test_aggregate_nothing_started() {
        assert_eq!(
            RunState::aggregate([RunState::NotStarted, RunState::NotStarted]),
            RunState::NotStarted
        );
        assert_eq!(RunState::aggregate(std::iter::empty::<RunState>()), RunState::NotStarted);
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::NameTooLong { max: 200, len: 250 };
        assert!(err.to_string().contains("200"));
        assert!(err.to_string().contains("250"));

        let err = ValidationError::EmptyScript { step: "Lint".to_string() };
        assert!(err.to_string().contains("Lint"));
    }

    #[test]
    fn test_job_error_from_validation() {
        let err = JobError::from(ValidationError::EmptyName);
        assert!(matches!(err, JobError::Validation(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_job_error_provisioning() {
        let err = JobError::Provisioning {
            image: "nope:latest".to_string(),
            reason: "manifest unknown".to_string(),
        };
        assert!(err.to_string().contains("nope:latest"));
        assert!(err.to_string().contains("manifest unknown"));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_job_error_step_failed() {
        let err = JobError::StepFailed {
            step: "Cargo build".to_string(),
            code: 101,
        };
        assert!(err.to_string().contains("Cargo build"));
        assert!(err.to_string().contains("101"));
    }

    #[test]
    fn test_job_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "docker not found");
        let err = JobError::from(io_err);
        assert!(matches!(err, JobError::Io(ref m) if m.contains("docker")));
    }
}
