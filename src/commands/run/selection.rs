//! Plan loading and operator selection for `reclaim run`.

use crate::error::{ReclaimError, Result};
use crate::plan::{CleanupPlan, normalize};
use std::collections::HashSet;
use tracing::debug;

/// Read a plan from JSON written by `reclaim plan`.
///
/// Text that is not a strict plan goes through the normalizer instead, so
/// raw advisory output can be run directly. A text that yields no plan at
/// all is an error rather than an empty run.
pub fn load_plan(text: &str) -> Result<CleanupPlan> {
    match serde_json::from_str::<CleanupPlan>(text) {
        Ok(plan) => Ok(plan),
        Err(e) => {
            debug!(error = %e, "input is not a strict plan, normalizing");
            let plan = normalize(text);
            match plan.parse_error {
                Some(reason) => Err(ReclaimError::UserError(format!(
                    "input is neither a plan nor advisory text with a plan: {}",
                    reason
                ))),
                None => Ok(plan),
            }
        }
    }
}

fn check_strict_plan(mut plan: CleanupPlan) -> Result<CleanupPlan> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<&str> = Vec::new();
    for item in &plan.items {
        if !seen.insert(item.id.as_str()) && !duplicates.contains(&item.id.as_str()) {
            duplicates.push(&item.id);
        }
    }
    if !duplicates.is_empty() {
        return Err(ReclaimError::UserError(format!(
            "plan has duplicate item id(s): {}",
            duplicates.join(", ")
        )));
    }

    for item in &mut plan.items {
        let gb = item.estimated_size_gb;
        item.estimated_size_gb = if gb.is_finite() { gb.max(0.0) } else { 0.0 };
    }
    Ok(plan)
}

/// Apply `--only` and `--skip` to the plan's checked flags.
///
/// `--only` replaces the plan's own selection; `--skip` then unchecks.
/// Unknown ids are an error so a typo never runs the wrong set.
pub fn apply_selection(plan: &mut CleanupPlan, only: &[String], skip: &[String]) -> Result<()> {
    let mut unknown = Vec::new();

    if !only.is_empty() {
        unknown.extend(plan.select_only(only));
    }
    for id in skip {
        if !plan.set_checked(id, false) {
            unknown.push(id.clone());
        }
    }

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ReclaimError::UserError(format!(
            "unknown item id(s): {}",
            unknown.join(", ")
        )))
    }
}
