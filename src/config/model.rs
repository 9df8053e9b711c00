//! Config struct definition and default implementation.

use super::types::*;
use crate::validate::{SafetyPolicy, WhitelistEntry};
use serde::{Deserialize, Serialize};

/// Configuration for reclaim.
///
/// This struct represents the contents of `config.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Safety settings
    // =========================================================================
    /// Paths no cleanup command may touch.
    #[serde(default)]
    pub whitelist: Vec<WhitelistEntry>,

    /// Whether commands matching no allow rule may run.
    #[serde(default)]
    pub safety_policy: SafetyPolicy,

    // =========================================================================
    // Execution settings
    // =========================================================================
    /// Shell used to run cleanup commands.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Seconds before a single cleanup command is killed.
    #[serde(default = "default_command_timeout_seconds")]
    pub command_timeout_seconds: u64,

    /// Pause after the last item before measuring usage again.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Command whose output is the fixed-column usage report.
    #[serde(default = "default_disk_usage_command")]
    pub disk_usage_command: String,

    // =========================================================================
    // Snapshot settings
    // =========================================================================
    #[serde(default)]
    pub snapshots: SnapshotSettings,

    // =========================================================================
    // Audit settings
    // =========================================================================
    /// Append a line to `events.ndjson` for every run and whitelist change.
    #[serde(default = "default_true")]
    pub record_events: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            whitelist: Vec::new(),
            safety_policy: SafetyPolicy::default(),
            shell: default_shell(),
            command_timeout_seconds: default_command_timeout_seconds(),
            settle_delay_ms: default_settle_delay_ms(),
            disk_usage_command: default_disk_usage_command(),
            snapshots: SnapshotSettings::default(),
            record_events: default_true(),
        }
    }
}
