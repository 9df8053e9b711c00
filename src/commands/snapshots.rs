//! Implementation of the `reclaim snapshots` command.

use super::{load_config, shell_executor, to_json};
use crate::cli::SnapshotsArgs;
use crate::context::AppContext;
use crate::error::Result;
use crate::plan::CleanupPlan;
use crate::snapshot::{SnapshotClassifier, SnapshotRecord, SnapshotSummary, default_snapshot_items};

const SNAPSHOT_PLAN_SUMMARY: &str = "Local snapshots found on the boot volume.";

pub fn cmd_snapshots(ctx: &AppContext, args: SnapshotsArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let executor = shell_executor(&config);
    let records = SnapshotClassifier::new(&executor, &config.snapshots).collect();

    if args.emit_plan {
        let plan = CleanupPlan::new(
            SNAPSHOT_PLAN_SUMMARY,
            default_snapshot_items(&records, &config.snapshots),
        );
        println!("{}", to_json(&plan)?);
        return Ok(());
    }

    if args.json {
        println!("{}", to_json(&records)?);
        return Ok(());
    }

    print_records(&records);
    Ok(())
}

fn print_records(records: &[SnapshotRecord]) {
    if records.is_empty() {
        println!("No local snapshots found.");
        return;
    }

    let summary = SnapshotSummary::from_records(records);
    println!(
        "Local snapshots ({}): {} time machine, {} system update, {} unknown",
        summary.total, summary.time_machine, summary.system_update, summary.unknown
    );
    println!();

    for record in records {
        let marker = if record.is_deletable { "deletable" } else { "kept" };
        println!("  {}", record.name);
        println!(
            "    {} | {} ({}) | {}",
            record.kind, record.size, record.size_confidence, marker
        );
        if let Some(created) = &record.created_date {
            println!("    created {}", created);
        }
    }

    println!();
    let approx = if summary.has_estimates { "~" } else { "" };
    println!(
        "Reclaimable by thinning: {}{:.1} GB",
        approx,
        summary.deletable_gb()
    );
}
