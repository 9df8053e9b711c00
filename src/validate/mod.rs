//! Command safety validation for reclaim.
//!
//! Every cleanup command passes through [`CommandSafetyValidator`] right
//! before it runs:
//! - Allow rules: known-safe shapes such as snapshot thinning or deletion
//!   inside a cache, log, trash or downloads directory
//! - Deny rules: root or OS-critical targets, privilege escalation,
//!   world-writable modes, root ownership, disk formatting, `..` escapes
//! - Whitelist: user-protected paths, which no command may touch
//!
//! Deny beats allow, and the whitelist beats everything.

mod rules;
mod shape;
mod validator;
mod whitelist;


// Re-export public API
pub use rules::{ALLOW_RULES, DENY_RULES, SafetyPolicy, SafetyRule};
pub use shape::{CommandShape, Segment, ShapeError};
pub use validator::{CommandSafetyValidator, Rejection, RejectionCause, ValidationResult};
pub use whitelist::{WhitelistEntry, find_protected, suggested_whitelist};

pub(crate) use shape::is_glob;
