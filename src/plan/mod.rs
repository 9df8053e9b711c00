//! Cleanup plans.
//!
//! Plans come from an external advisory service and are untrusted. The
//! normalizer accepts whatever text the service produced and always returns
//! a well-typed [`CleanupPlan`]:
//! - A fenced ```` ```json ```` block is preferred
//! - Otherwise the first balanced `{ ... }` object in the text is used
//! - Unparsable input yields an empty plan with an explanatory summary
//!
//! Missing item fields get safe defaults (`checked = true`, `risk_level = low`,
//! `estimated_size_gb = 0`, positional `cleanup_<n>` ids).

mod normalize;
mod types;

#[cfg(test)]
mod tests;

pub use normalize::{PARSE_FAILURE_SUMMARY, extract_payload, normalize};
pub use types::{CleanupItem, CleanupPlan, RiskLevel};
pub(crate) use types::unique_id;
