//! Exit code constants for the reclaim CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, unreadable input)
//! - 2: Safety rejection (a command failed validation)
//! - 3: Execution failure (one or more cleanup commands failed)
//! - 4: Measurement failure (disk usage report could not be parsed)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid config, or unreadable input.
pub const USER_ERROR: i32 = 1;

/// A command was rejected by the safety validator.
pub const VALIDATION_FAILURE: i32 = 2;

/// A cleanup command failed to run or exited non-zero.
pub const EXECUTION_FAILURE: i32 = 3;

/// The disk usage report was missing or malformed.
pub const MEASUREMENT_FAILURE: i32 = 4;
