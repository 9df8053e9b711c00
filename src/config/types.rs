//! Configuration types and defaults for reclaim.
//!
//! This module defines nested settings structs, constants, and default
//! value functions used by the Config struct.

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the shell-quoted snapshot path in probe commands.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Commands and tunables for local snapshot inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    /// Lists local snapshots, one identifier per line.
    pub list_command: String,

    /// Directory that exposes snapshots by name.
    pub snapshot_root: String,

    /// Exact unique-size measurement. `{path}` is replaced with the snapshot path.
    pub unique_size_command: String,

    /// Approximate directory-size measurement. `{path}` is replaced with the snapshot path.
    pub directory_size_command: String,

    /// Command proposed for thinning deletable snapshots.
    pub thin_command: String,

    /// Per-snapshot estimate used when no measurement succeeds.
    pub estimate_gb: f64,

    /// Maximum snapshots probed at once.
    pub probe_concurrency: usize,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            list_command: "tmutil listlocalsnapshots /".to_string(),
            snapshot_root: "/.com.apple.TimeMachine.supported".to_string(),
            unique_size_command: "tmutil uniquesize {path}".to_string(),
            directory_size_command: "du -sh {path}".to_string(),
            thin_command: "tmutil thinlocalsnapshots / 100000000000 4".to_string(),
            estimate_gb: default_snapshot_estimate_gb(),
            probe_concurrency: 4,
        }
    }
}

impl SnapshotSettings {
    /// Filesystem path of a snapshot under `snapshot_root`.
    pub fn snapshot_path(&self, name: &str) -> String {
        format!("{}/{}", self.snapshot_root.trim_end_matches('/'), name)
    }

    /// Fill `{path}` in a probe template with the quoted snapshot path.
    pub fn render(&self, template: &str, name: &str) -> String {
        let quoted = shell_words::quote(&self.snapshot_path(name)).into_owned();
        template.replace(PATH_PLACEHOLDER, &quoted)
    }
}

// Default value functions for serde
pub(crate) fn default_snapshot_estimate_gb() -> f64 {
    2.0
}
pub(crate) fn default_command_timeout_seconds() -> u64 {
    300
}
pub(crate) fn default_settle_delay_ms() -> u64 {
    1000
}
pub(crate) fn default_disk_usage_command() -> String {
    "df -h /".to_string()
}
pub(crate) fn default_shell() -> String {
    "/bin/sh".to_string()
}
pub(crate) fn default_true() -> bool {
    true
}
