//! Local snapshot classification.
//!
//! Snapshot identifiers from the listing command are classified by name
//! into system-update, time-machine, or unknown snapshots. Only
//! time-machine snapshots are deletable. Sizes come from an ordered chain
//! of measurements, each tagged with how far it can be trusted:
//! - exact unique size (`measured`)
//! - directory size of the snapshot mount (`approximate`)
//! - a fixed per-snapshot figure (`estimated`)
//!
//! A failed measurement degrades one record, never the batch.

mod classify;
mod defaults;
mod sizing;
mod types;


// Re-export public API
pub use classify::{
    SYSTEM_UPDATE_MARKER, TIME_MACHINE_MARKER, classify_name, created_date, parse_snapshot_listing,
};
pub use defaults::{THIN_ITEM_ID, default_snapshot_items};
pub use sizing::{SizeStrategy, SnapshotClassifier, UNLISTED_ESTIMATE_GB};
pub use types::{SizeConfidence, SnapshotKind, SnapshotRecord, SnapshotSummary};
