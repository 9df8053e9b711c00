//! Implementation of the `reclaim plan` command.
//!
//! Turns advisory text into a strict JSON plan that `reclaim run` accepts.

use super::{load_config, read_input, shell_executor, to_json, write_output};
use crate::cli::PlanArgs;
use crate::context::AppContext;
use crate::error::Result;
use crate::plan::normalize;
use crate::snapshot::{SnapshotClassifier, default_snapshot_items};
use tracing::{info, warn};

pub fn cmd_plan(ctx: &AppContext, args: PlanArgs) -> Result<()> {
    let raw = read_input(&args.input)?;
    let mut plan = normalize(&raw);

    if let Some(reason) = &plan.parse_error {
        warn!(reason = %reason, "advisory text produced an empty plan");
    }

    if args.with_snapshots {
        let config = load_config(ctx)?;
        let executor = shell_executor(&config);
        let records = SnapshotClassifier::new(&executor, &config.snapshots).collect();
        let items = default_snapshot_items(&records, &config.snapshots);
        info!(snapshots = records.len(), items = items.len(), "adding snapshot items");
        plan.extend_unique(items);
    }

    write_output(args.output.as_deref(), &to_json(&plan)?)?;

    if let Some(path) = &args.output {
        eprintln!(
            "Wrote {} item(s) ({:.1} GB selected) to {}",
            plan.items.len(),
            plan.estimated_selection_gb(),
            path.display()
        );
    }
    Ok(())
}
