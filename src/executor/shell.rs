//! Fail-fast shell sessions
//!
//! Every step script is handed to `<shell> -e [-x] -c <script>`. With `-e`
//! the shell exits on the first command that returns non-zero, so the rest
//! of the script never runs and the session's exit status is that command's
//! status. The session's stdin is closed: commands that read stdin see EOF.
//!
//! [`stream_session`] spawns the prepared process, echoes its output line by
//! line and keeps the last lines for the run report.

use crate::job::JobError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Lines of output kept per step for failure reports
pub const DEFAULT_TAIL_LINES: usize = 50;

/// Shell used inside containers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Shell binary (default: sh)
    pub shell: String,

    /// Trace every command (`-x`)
    pub trace: bool,

    /// Mirror the session's output on our stdout/stderr
    pub echo_output: bool,

    /// Number of output lines kept for the report
    pub tail_lines: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            trace: false,
            echo_output: true,
            tail_lines: DEFAULT_TAIL_LINES,
        }
    }
}

impl ShellConfig {
    /// Argv that runs `script` in a fail-fast shell
    #[must_use]
    pub fn session_argv(&self, script: &str) -> Vec<String> {
        let mut argv = vec![self.shell.clone(), "-e".to_string()];
        if self.trace {
            argv.push("-x".to_string());
        }
        argv.push("-c".to_string());
        argv.push(script.to_string());
        argv
    }
}

/// How a shell session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutcome {
    /// Exit status; -1 when the process was killed by a signal
    pub exit_code: i32,

    /// Last lines of combined stdout/stderr
    pub output_tail: Vec<String>,

    /// Wall-clock duration of the session
    pub duration: Duration,
}

impl ScriptOutcome {
    /// Returns true if the session exited 0
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Bounded buffer holding the most recent output lines
#[derive(Debug, Clone)]
struct OutputTail {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl OutputTail {
    fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn push(&self, line: String) {
        if self.capacity == 0 {
            return;
        }
        let mut lines = self.lines.lock();
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    fn snapshot(&self) -> Vec<String> {
        self.lines.lock().iter().cloned().collect()
    }
}

fn spawn_reader<R>(source: R, tail: OutputTail, echo: bool, to_stderr: bool) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\n', '\r'])
                        .to_string();
                    if echo {
                        if to_stderr {
                            eprintln!("{line}");
                        } else {
                            println!("{line}");
                        }
                    }
                    tail.push(line);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read session output");
                    break;
                }
            }
        }
    })
}

/// Waits for the output readers; a reader that panicked is logged
fn join_readers(readers: Vec<thread::JoinHandle<()>>, program: &str) -> usize {
    let mut panicked = 0;
    for reader in readers {
        if reader.join().is_err() {
            panicked += 1;
            tracing::warn!(program = %program, "Output reader panicked, report output may be incomplete");
        }
    }
    panicked
}

/// Runs `command` and collects its output.
///
/// The command must run a fail-fast shell; see [`ShellConfig::session_argv`].
/// Its stdin is closed.
///
/// # Errors
///
/// [`JobError::Runtime`] if the process cannot be spawned or waited on.
/// A non-zero exit is not an error; it is reported in [`ScriptOutcome`].
pub fn stream_session(mut command: Command, config: &ShellConfig) -> Result<ScriptOutcome, JobError> {
    let program = command.get_program().to_string_lossy().into_owned();

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let start = Instant::now();
    let mut child = command
        .spawn()
        .map_err(|e| JobError::Runtime(format!("failed to spawn '{program}': {e}")))?;

    let tail = OutputTail::new(config.tail_lines);
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(stdout, tail.clone(), config.echo_output, false));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(stderr, tail.clone(), config.echo_output, true));
    }

    let status = child
        .wait()
        .map_err(|e| JobError::Runtime(format!("failed to wait for '{program}': {e}")))?;

    join_readers(readers, &program);

    Ok(ScriptOutcome {
        exit_code: status.code().unwrap_or(-1),
        output_tail: tail.snapshot(),
        duration: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> ShellConfig {
        ShellConfig {
            echo_output: false,
            ..ShellConfig::default()
        }
    }

    fn run(config: &ShellConfig, script: &str) -> ScriptOutcome {
        let argv = config.session_argv(script);
        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        stream_session(cmd, config).unwrap()
    }

    #[test]
    fn test_session_argv_is_fail_fast() {
        assert_eq!(
            ShellConfig::default().session_argv("make"),
            vec!["sh", "-e", "-c", "make"]
        );
    }

    #[test]
    fn test_session_argv_with_trace() {
        let config = ShellConfig {
            trace: true,
            ..ShellConfig::default()
        };
        assert_eq!(config.session_argv("make"), vec!["sh", "-e", "-x", "-c", "make"]);
    }

    #[test]
    fn test_successful_script() {
        let outcome = run(&quiet(), "echo one\necho two");
        assert!(outcome.is_success());
        assert_eq!(outcome.output_tail, vec!["one", "two"]);
    }

    #[test]
    fn test_first_failure_stops_script() {
        let outcome = run(&quiet(), "echo before\nexit 3\necho after\n");
        assert_eq!(outcome.exit_code, 3);
        assert_eq!(outcome.output_tail, vec!["before"]);
    }

    #[test]
    fn test_failing_command_without_explicit_exit() {
        let outcome = run(&quiet(), "false\necho unreachable\n");
        assert_eq!(outcome.exit_code, 1);
        assert!(outcome.output_tail.is_empty());
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        let config = ShellConfig {
            tail_lines: 2,
            ..quiet()
        };
        let outcome = run(&config, "echo a\necho b\necho c\n");
        assert_eq!(outcome.output_tail, vec!["b", "c"]);
    }

    #[test]
    fn test_stderr_is_captured() {
        let outcome = run(&quiet(), "echo oops >&2\nexit 2\n");
        assert_eq!(outcome.exit_code, 2);
        assert_eq!(outcome.output_tail, vec!["oops"]);
    }

    #[test]
    fn test_non_utf8_output_keeps_draining() {
        let outcome = run(&quiet(), "printf 'bad \\377 byte\\n'\necho after\nexit 0\n");
        assert!(outcome.is_success(), "exit code {}", outcome.exit_code);
        assert_eq!(outcome.output_tail.len(), 2);
        assert!(outcome.output_tail[0].contains('\u{FFFD}'));
        assert_eq!(outcome.output_tail[1], "after");
    }

    #[test]
    fn test_command_reading_stdin_does_not_consume_script() {
        let outcome = run(&quiet(), "cat > /dev/null\nexit 7\n");
        assert_eq!(outcome.exit_code, 7);
    }

    #[test]
    fn test_long_script_runs_to_its_failing_line() {
        let mut script = String::from("cat > /dev/null\n");
        for i in 0..2000 {
            script.push_str(&format!(": padding line {i}\n"));
        }
        script.push_str("exit 5\necho unreachable\n");

        let outcome = run(&quiet(), &script);

        assert_eq!(outcome.exit_code, 5);
        assert!(outcome.output_tail.is_empty());
    }

    #[test]
    fn test_stdin_is_closed_for_other_shells() {
        if !std::path::Path::new("/bin/bash").exists() {
            return;
        }
        let config = ShellConfig {
            shell: "bash".to_string(),
            ..quiet()
        };
        let outcome = run(&config, "cat > /dev/null\nexit 7\n");
        assert_eq!(outcome.exit_code, 7);
    }

    #[test]
    fn test_reader_panic_is_counted_not_propagated() {
        let readers = vec![
            thread::spawn(|| {}),
            thread::spawn(|| panic!("reader failed")),
        ];
        assert_eq!(join_readers(readers, "sh"), 1);
    }

    #[test]
    fn test_missing_shell_is_runtime_error() {
        let cmd = Command::new("/nonexistent/shell-binary");
        let err = stream_session(cmd, &quiet()).unwrap_err();
        assert!(matches!(err, JobError::Runtime(ref m) if m.contains("nonexistent")));
    }
}
