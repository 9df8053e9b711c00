//! Command execution collaborator.
//!
//! The orchestrator never spawns processes itself; it hands approved
//! commands to a [`CommandExecutor`]. [`ShellExecutor`] is the production
//! implementation, tests substitute a scripted fake.

mod shell;

pub use shell::ShellExecutor;

use thiserror::Error;

/// Failure reported by a command executor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The command could not be started at all.
    #[error("failed to start '{command}': {message}")]
    Spawn { command: String, message: String },

    /// The command ran and exited unsuccessfully.
    #[error("'{command}' exited with {}: {stderr}", .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The command exceeded its time budget and was killed.
    #[error("'{command}' timed out after {seconds}s")]
    TimedOut { command: String, seconds: u64 },
}

/// Runs a single command and returns its standard output.
pub trait CommandExecutor {
    /// Execute `command`, failing on invocation error or non-zero exit.
    fn execute(&self, command: &str) -> Result<String, ExecutionError>;
}

impl<T: CommandExecutor + ?Sized> CommandExecutor for &T {
    fn execute(&self, command: &str) -> Result<String, ExecutionError> {
        (**self).execute(command)
    }
}
