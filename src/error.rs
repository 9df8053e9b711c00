//! Error types for the reclaim engine and CLI.
//!
//! Uses thiserror for derive macros. Per-item validation and execution
//! failures are normally recorded in a run's failure list rather than
//! propagated; the variants here surface when they are fatal to an
//! operation (for example a `check` command, or a disk measurement that
//! cannot be parsed).

use crate::exit_codes;
use thiserror::Error;

/// Main error type for reclaim operations.
#[derive(Error, Debug)]
pub enum ReclaimError {
    /// User provided invalid arguments or unreadable input.
    #[error("{0}")]
    UserError(String),

    /// A command was refused by the safety validator.
    #[error("Command rejected: {0}")]
    ValidationRejected(String),

    /// The command executor reported a failure.
    #[error("Execution failed: {0}")]
    Execution(#[from] crate::exec::ExecutionError),

    /// The disk usage report could not be obtained or parsed.
    #[error("Disk measurement failed: {0}")]
    MeasurementParse(String),

    /// The configuration file is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A cleanup batch finished with items that did not complete.
    #[error("Cleanup incomplete: {0}")]
    Incomplete(String),
}

impl ReclaimError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReclaimError::UserError(_) => exit_codes::USER_ERROR,
            ReclaimError::Config(_) => exit_codes::USER_ERROR,
            ReclaimError::ValidationRejected(_) => exit_codes::VALIDATION_FAILURE,
            ReclaimError::Execution(_) => exit_codes::EXECUTION_FAILURE,
            ReclaimError::MeasurementParse(_) => exit_codes::MEASUREMENT_FAILURE,
            ReclaimError::Incomplete(_) => exit_codes::EXECUTION_FAILURE,
        }
    }
}

/// Result type alias for reclaim operations.
pub type Result<T> = std::result::Result<T, ReclaimError>;
