//! Command safety validation.

use super::rules::{ALLOW_RULES, DENY_RULES, SafetyPolicy, SafetyRule, segment_is_plain};
use super::shape::CommandShape;
use super::whitelist::{WhitelistEntry, find_protected};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Why a command was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RejectionCause {
    EmptyCommand,
    Unparsable,
    Denied { rule: SafetyRule },
    Whitelisted { entry_id: String, path: String },
    NotAllowListed,
}

/// A refused command with an operator-facing reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub cause: RejectionCause,
    pub reason: String,
}

/// Outcome of validating one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ValidationResult {
    /// `allowed_by` is empty when approval came from the default-allow policy.
    Approved { allowed_by: Vec<SafetyRule> },
    Rejected(Rejection),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Approved { .. })
    }

    /// The rejection reason, or `None` when approved.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ValidationResult::Approved { .. } => None,
            ValidationResult::Rejected(r) => Some(&r.reason),
        }
    }

    fn rejected(cause: RejectionCause, reason: impl Into<String>) -> Self {
        ValidationResult::Rejected(Rejection {
            cause,
            reason: reason.into(),
        })
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationResult::Approved { allowed_by } if allowed_by.is_empty() => {
                write!(f, "approved (no deny rule matched)")
            }
            ValidationResult::Approved { allowed_by } => {
                let names: Vec<String> = allowed_by.iter().map(|r| r.to_string()).collect();
                write!(f, "approved by {}", names.join(", "))
            }
            ValidationResult::Rejected(r) => write!(f, "rejected: {}", r.reason),
        }
    }
}

/// Decides whether a cleanup command may run.
///
/// Validation is pure: it reads only its arguments and never caches, so the
/// caller passes the whitelist as it stands at the moment of execution.
#[derive(Debug, Clone, Default)]
pub struct CommandSafetyValidator {
    policy: SafetyPolicy,
    home: Option<String>,
}

impl CommandSafetyValidator {
    pub fn new(policy: SafetyPolicy) -> Self {
        Self { policy, home: None }
    }

    /// Validator that knows the operator's home directory, so absolute
    /// home paths and `~` compare equal.
    pub fn with_home(mut self, home: impl Into<String>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Validator for the current user, reading the home directory from the OS.
    pub fn for_current_user(policy: SafetyPolicy) -> Self {
        let validator = Self::new(policy);
        match dirs::home_dir().and_then(|p| p.to_str().map(str::to_string)) {
            Some(home) => validator.with_home(home),
            None => validator,
        }
    }

    pub fn policy(&self) -> SafetyPolicy {
        self.policy
    }

    /// Validate a command against the rules and the given whitelist.
    ///
    /// Checks, in order:
    /// 1. allow rules (every segment must match one)
    /// 2. deny rules, evaluated even when an allow rule matched
    /// 3. whitelist containment
    ///
    /// A deny match or whitelist hit always rejects. Otherwise the command
    /// is approved when allow-listed, or when the policy is default-allow.
    pub fn validate(&self, command: &str, whitelist: &[WhitelistEntry]) -> ValidationResult {
        let command = command.trim();
        if command.is_empty() {
            return ValidationResult::rejected(RejectionCause::EmptyCommand, "command is empty");
        }

        let home = self.home.as_deref();
        let shape = match CommandShape::parse(command) {
            Ok(shape) if !shape.segments.is_empty() => shape,
            Ok(_) => {
                return ValidationResult::rejected(
                    RejectionCause::EmptyCommand,
                    "command contains no executable words",
                );
            }
            Err(e) => {
                // Whitelist hits are still reported over parse errors.
                if let Some(entry) = find_protected(command, None, whitelist, home) {
                    return whitelisted(entry);
                }
                return ValidationResult::rejected(
                    RejectionCause::Unparsable,
                    format!("command cannot be parsed safely: {}", e),
                );
            }
        };

        let allowed_by = allow_matches(&shape, home);

        if let Some(rule) = DENY_RULES
            .iter()
            .copied()
            .find(|rule| rule.denies(command, &shape, home))
        {
            debug!(command, %rule, "deny rule matched");
            return ValidationResult::rejected(
                RejectionCause::Denied { rule },
                format!("{} ({})", rule.description(), rule),
            );
        }

        if let Some(entry) = find_protected(command, Some(&shape), whitelist, home) {
            return whitelisted(entry);
        }

        match (allowed_by, self.policy) {
            (Some(rules), _) => ValidationResult::Approved { allowed_by: rules },
            (None, SafetyPolicy::DefaultAllow) => ValidationResult::Approved {
                allowed_by: Vec::new(),
            },
            (None, SafetyPolicy::DefaultDeny) => ValidationResult::rejected(
                RejectionCause::NotAllowListed,
                "command does not match any known-safe cleanup shape",
            ),
        }
    }
}

/// The allow rule for each segment, or `None` if any segment has none.
fn allow_matches(shape: &CommandShape, home: Option<&str>) -> Option<Vec<SafetyRule>> {
    let mut rules = Vec::new();
    for segment in &shape.segments {
        if !segment_is_plain(segment) {
            return None;
        }
        let rule = ALLOW_RULES
            .iter()
            .copied()
            .find(|rule| rule.allows(segment, home))?;
        if !rules.contains(&rule) {
            rules.push(rule);
        }
    }
    Some(rules)
}

fn whitelisted(entry: &WhitelistEntry) -> ValidationResult {
    ValidationResult::rejected(
        RejectionCause::Whitelisted {
            entry_id: entry.id.clone(),
            path: entry.path.clone(),
        },
        format!("command touches protected path '{}'", entry.path),
    )
}
