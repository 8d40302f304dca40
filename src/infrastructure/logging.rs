//! Logging configuration
//!
//! Initializes tracing for the application. `RUST_LOG` wins over the level
//! passed in.

/// Initializes logging with the specified level
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Step output goes to stdout; keep diagnostics on stderr.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging("debug");
        init_logging("info");
    }
}
