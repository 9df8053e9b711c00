//! `sh -c` backed executor with a timeout.

use super::{CommandExecutor, ExecutionError};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Executes commands through the system shell.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
    timeout: Duration,
}

impl ShellExecutor {
    /// Create an executor using `/bin/sh` and the given timeout.
    pub fn new(timeout_seconds: u64) -> Self {
        Self {
            shell: "/bin/sh".to_string(),
            timeout: Duration::from_secs(timeout_seconds.max(1)),
        }
    }

    /// Use a different shell binary.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(&self, command: &str) -> Result<String, ExecutionError> {
        let start = Instant::now();
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecutionError::Spawn {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        // Drain pipes on helper threads so a chatty command cannot block on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = wait_with_timeout(&mut child, self.timeout).map_err(|e| {
            ExecutionError::Spawn {
                command: command.to_string(),
                message: e.to_string(),
            }
        })?;

        // Grandchildren may still hold the pipes after a kill, so readers are not joined here.
        let Some(status) = status else {
            warn!(command, timeout_secs = self.timeout.as_secs(), "command timed out");
            return Err(ExecutionError::TimedOut {
                command: command.to_string(),
                seconds: self.timeout.as_secs(),
            });
        };

        let stdout = stdout.and_then(|h| h.join().ok()).unwrap_or_default();
        let stderr = stderr.and_then(|h| h.join().ok()).unwrap_or_default();

        debug!(
            command,
            code = ?status.code(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "command finished"
        );

        if status.success() {
            Ok(stdout)
        } else {
            Err(ExecutionError::NonZeroExit {
                command: command.to_string(),
                code: status.code(),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Wait for a child process, killing it once `timeout` elapses.
///
/// Returns `None` when the process was killed.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(50);

    loop {
        match child.try_wait()? {
            Some(status) => return Ok(Some(status)),
            None => {
                if start.elapsed() >= timeout {
                    // SIGKILL on Unix.
                    let _ = child.kill();
                    let _ = child.wait();
                    return Ok(None);
                }
                thread::sleep(poll_interval);
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let exec = ShellExecutor::new(10);
        let out = exec.execute("echo hello").unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn non_zero_exit_is_an_error() {
        let exec = ShellExecutor::new(10);
        let err = exec.execute("echo oops >&2; exit 3").unwrap_err();
        match err {
            ExecutionError::NonZeroExit { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_shell_is_a_spawn_error() {
        let exec = ShellExecutor::new(10).with_shell("/nonexistent/shell");
        let err = exec.execute("true").unwrap_err();
        assert!(matches!(err, ExecutionError::Spawn { .. }));
    }

    #[test]
    fn slow_command_times_out() {
        let exec = ShellExecutor::new(1);
        let err = exec.execute("sleep 5").unwrap_err();
        assert_eq!(
            err,
            ExecutionError::TimedOut {
                command: "sleep 5".to_string(),
                seconds: 1
            }
        );
    }
}
