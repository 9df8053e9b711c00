//! Output formatting for `reclaim run`.

use crate::orchestrator::{CleanupEvent, CleanupResult, FailureKind};
use crate::plan::CleanupItem;
use crate::validate::ValidationResult;

/// One progress line for an event, or `None` for events not shown.
pub fn format_event(event: &CleanupEvent) -> Option<String> {
    match event {
        CleanupEvent::BatchStarted { total_count } => {
            Some(format!("Running {} cleanup item(s)...", total_count))
        }
        CleanupEvent::Progress(p) if p.completed_count < p.total_count => Some(format!(
            "[{}/{}] {}",
            p.completed_count + 1,
            p.total_count,
            p.current_item
        )),
        CleanupEvent::ItemFinished {
            success: false,
            error: Some(error),
            ..
        } => Some(format!("      failed: {}", error)),
        _ => None,
    }
}

pub fn print_dry_run(items: &[(&CleanupItem, ValidationResult)]) {
    if items.is_empty() {
        println!("No items selected.");
        return;
    }

    println!("Selected items ({}):", items.len());
    for (item, verdict) in items {
        println!(
            "  {} [{}] {:.1} GB: {}",
            item.id, item.risk_level, item.estimated_size_gb, item.label()
        );
        println!("    $ {}", item.command);
        println!("    {}", verdict);
    }

    let approved = items.iter().filter(|(_, v)| v.is_valid()).count();
    println!();
    println!(
        "Dry-run mode: {} of {} item(s) would run. No changes made.",
        approved,
        items.len()
    );
    println!("Run with --yes to perform the cleanup.");
}

pub fn print_summary(result: &CleanupResult) {
    println!();
    println!("Cleanup complete:");
    println!(
        "  Completed: {} of {} item(s)",
        result.completed_count(),
        result.attempted
    );
    println!(
        "  Used:      {} -> {}",
        result.before_disk_info.used, result.after_disk_info.used
    );
    println!("  Freed:     {:.2} GB", result.total_freed_gb);

    if result.cancelled {
        println!("  Cancelled before all items ran.");
    }
    if !result.failures.is_empty() {
        println!("  Not completed:");
        for failure in &result.failures {
            let kind = match failure.kind {
                FailureKind::Rejected => "rejected",
                FailureKind::ExecutionFailed => "failed",
                FailureKind::Cancelled => "cancelled",
            };
            println!("    - [{}] {}", kind, failure);
        }
    }
}
