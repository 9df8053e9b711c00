//! Default cleanup items derived from classified snapshots.

use super::types::{SnapshotKind, SnapshotRecord};
use crate::config::SnapshotSettings;
use crate::plan::{CleanupItem, RiskLevel};
use crate::size;

/// Above either threshold the thinning item also suggests revisiting
/// backup settings.
const MANY_SNAPSHOTS: usize = 10;
const LARGE_SNAPSHOT_TOTAL_GB: f64 = 20.0;

pub const THIN_ITEM_ID: &str = "thin_local_snapshots";
pub const SYSTEM_UPDATE_ITEM_ID: &str = "system_update_snapshots_info";
pub const UNKNOWN_ITEM_ID: &str = "unknown_snapshots_info";

/// Cleanup items for the snapshots found on the host.
///
/// - Deletable snapshots get one medium-risk thinning item whose estimate
///   sums their sizes, using `estimate_gb` for any that could not be sized.
/// - System-update and unknown snapshots get informational `echo` items;
///   nothing is ever proposed that would delete them.
pub fn default_snapshot_items(
    records: &[SnapshotRecord],
    settings: &SnapshotSettings,
) -> Vec<CleanupItem> {
    let mut items = Vec::new();

    let deletable: Vec<&SnapshotRecord> = records.iter().filter(|r| r.is_deletable).collect();
    if !deletable.is_empty() {
        let bytes: u64 = deletable
            .iter()
            .map(|r| {
                if r.estimated_bytes > 0 {
                    r.estimated_bytes
                } else {
                    size::gb_to_bytes(settings.estimate_gb)
                }
            })
            .sum();
        let gb = size::bytes_to_gb(bytes);

        let mut description = format!(
            "{} local Time Machine snapshot(s) hold about {}. Thinning them frees space \
             immediately and removes some recent restore points.",
            deletable.len(),
            size::format(bytes)
        );
        if let Some(oldest) = deletable.iter().filter_map(|r| r.created_date.as_deref()).min() {
            description.push_str(&format!(" The oldest was created {}.", oldest));
        }
        if deletable.len() > MANY_SNAPSHOTS || gb > LARGE_SNAPSHOT_TOTAL_GB {
            description.push_str(
                " Consider reducing how often local snapshots are kept in the backup settings.",
            );
        }

        let mut item = CleanupItem::new(
            THIN_ITEM_ID,
            "Thin local Time Machine snapshots",
            settings.thin_command.clone(),
            RiskLevel::Medium,
        )
        .with_description(description)
        .with_estimate_gb(gb);
        item.involves_file_deletion = Some(false);
        items.push(item);
    }

    let system_updates = count(records, SnapshotKind::SystemUpdate);
    if system_updates > 0 {
        items.push(info_item(
            SYSTEM_UPDATE_ITEM_ID,
            "System update snapshots",
            &format!(
                "{} system update snapshot(s) are protected and managed by the operating \
                 system. Restarting usually lets the system clean them up.",
                system_updates
            ),
            "System update snapshots are managed by the OS. Restart to speed up their cleanup.",
        ));
    }

    let unknown = count(records, SnapshotKind::Unknown);
    if unknown > 0 {
        items.push(info_item(
            UNKNOWN_ITEM_ID,
            "Unrecognized snapshots",
            &format!(
                "{} snapshot(s) could not be identified and are kept for system stability.",
                unknown
            ),
            "Unrecognized snapshots are kept for system stability.",
        ));
    }

    items
}

fn count(records: &[SnapshotRecord], kind: SnapshotKind) -> usize {
    records.iter().filter(|r| r.kind == kind).count()
}

fn info_item(id: &str, title: &str, description: &str, message: &str) -> CleanupItem {
    let mut item = CleanupItem::new(
        id,
        title,
        format!("echo {}", shell_words::quote(message)),
        RiskLevel::Low,
    )
    .with_description(description);
    item.involves_file_deletion = Some(false);
    item
}
