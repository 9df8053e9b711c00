//! Implementation of the `reclaim disk` command.

use super::{disk_probe, load_config, shell_executor, to_json};
use crate::cli::DiskArgs;
use crate::context::AppContext;
use crate::disk::{DiskInfo, LARGE_FILE_MIN_MB, StorageBreakdown, collect_breakdown, measure};
use crate::size;
use crate::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct DiskReport {
    #[serde(flatten)]
    info: DiskInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    breakdown: Option<StorageBreakdown>,
}

pub fn cmd_disk(ctx: &AppContext, args: DiskArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let info = measure(&disk_probe(&config))?;
    let breakdown = args
        .breakdown
        .then(|| collect_breakdown(&shell_executor(&config)));

    if args.json {
        println!("{}", to_json(&DiskReport { info, breakdown })?);
        return Ok(());
    }

    println!("Disk usage ({}):", config.disk_usage_command);
    println!("  Total:     {}", info.total);
    println!("  Used:      {} ({}%)", info.used, info.usage_percentage);
    println!("  Available: {}", info.available);

    if let Some(breakdown) = &breakdown {
        print_breakdown(breakdown);
    }
    Ok(())
}

fn print_breakdown(breakdown: &StorageBreakdown) {
    println!();
    println!("Cleanup locations:");
    for c in &breakdown.categories {
        if c.unmeasured.is_empty() {
            println!("  {:<10} {}", c.category.to_string(), c.size);
        } else {
            println!(
                "  {:<10} {}  (not measured: {})",
                c.category.to_string(),
                c.size,
                c.unmeasured.join(", ")
            );
        }
    }
    println!("  {:<10} {}", "total", size::format(breakdown.total_bytes()));

    println!();
    if breakdown.large_files.is_empty() {
        println!("No files over {} MB found.", LARGE_FILE_MIN_MB);
    } else {
        println!("Files over {} MB:", LARGE_FILE_MIN_MB);
        for path in &breakdown.large_files {
            println!("  {}", path);
        }
    }
}
