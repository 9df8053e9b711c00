//! Name-based snapshot classification.

use super::types::SnapshotKind;
use regex::Regex;
use std::sync::LazyLock;

pub const SYSTEM_UPDATE_MARKER: &str = "com.apple.os.update";
pub const TIME_MACHINE_MARKER: &str = "com.apple.TimeMachine";

/// `YYYY-MM-DD-HHMMSS` as embedded in time-machine snapshot names.
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})-(\d{2})(\d{2})(\d{2})").expect("Invalid snapshot timestamp regex")
});

/// Classify a snapshot identifier. The first matching rule wins:
/// 1. contains the OS-update marker
/// 2. carries a timestamp or the time-machine marker
/// 3. anything else
pub fn classify_name(name: &str) -> SnapshotKind {
    if name.contains(SYSTEM_UPDATE_MARKER) {
        SnapshotKind::SystemUpdate
    } else if name.contains(TIME_MACHINE_MARKER) || TIMESTAMP_RE.is_match(name) {
        SnapshotKind::TimeMachine
    } else {
        SnapshotKind::Unknown
    }
}

/// Creation timestamp embedded in the name, as `YYYY-MM-DD HH:MM:SS`.
pub fn created_date(name: &str) -> Option<String> {
    let caps = TIMESTAMP_RE.captures(name)?;
    Some(format!("{} {}:{}:{}", &caps[1], &caps[2], &caps[3], &caps[4]))
}

/// Snapshot identifiers from the listing command output.
///
/// Blank lines and the `Snapshots for ...` header are skipped.
pub fn parse_snapshot_listing(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("Snapshots for"))
        .map(str::to_string)
        .collect()
}
