//! Snapshot record types.

use crate::size;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic category of a local snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// Created by the OS updater; managed by the OS and never deleted here.
    SystemUpdate,
    /// A dated backup snapshot; safe to thin.
    TimeMachine,
    Unknown,
}

impl SnapshotKind {
    /// Deletability depends on the kind alone.
    pub fn is_deletable(self) -> bool {
        matches!(self, SnapshotKind::TimeMachine)
    }

    pub fn description(self) -> &'static str {
        match self {
            SnapshotKind::SystemUpdate => {
                "System update snapshot managed by the operating system. It cannot be removed \
                 manually and is cleaned up automatically, usually after a restart."
            }
            SnapshotKind::TimeMachine => {
                "Local Time Machine snapshot used for file version recovery. Thinning it frees \
                 space but removes some recent restore points."
            }
            SnapshotKind::Unknown => {
                "Snapshot of unknown origin. Keep it to avoid affecting system stability."
            }
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotKind::SystemUpdate => write!(f, "system_update"),
            SnapshotKind::TimeMachine => write!(f, "time_machine"),
            SnapshotKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// How a snapshot's size was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeConfidence {
    Measured,
    Approximate,
    Estimated,
    Unavailable,
}

impl fmt::Display for SizeConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeConfidence::Measured => write!(f, "measured"),
            SizeConfidence::Approximate => write!(f, "approximate"),
            SizeConfidence::Estimated => write!(f, "estimated"),
            SizeConfidence::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// A classified snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub name: String,
    /// Display size, or a placeholder such as `unknown` when unmeasurable.
    pub size: String,
    pub kind: SnapshotKind,
    pub is_deletable: bool,
    /// `YYYY-MM-DD HH:MM:SS`, when the name carries a timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    pub estimated_bytes: u64,
    pub size_confidence: SizeConfidence,
    pub description: String,
}

impl SnapshotRecord {
    pub fn estimated_gb(&self) -> f64 {
        size::bytes_to_gb(self.estimated_bytes)
    }
}

/// Aggregate view of a batch of classified snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SnapshotSummary {
    pub total: usize,
    pub time_machine: usize,
    pub system_update: usize,
    pub unknown: usize,
    /// Sum of `estimated_bytes` over deletable snapshots.
    pub deletable_bytes: u64,
    /// Whether any deletable snapshot's size is a fixed estimate or missing.
    pub has_estimates: bool,
}

impl SnapshotSummary {
    pub fn from_records(records: &[SnapshotRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.kind {
                SnapshotKind::TimeMachine => summary.time_machine += 1,
                SnapshotKind::SystemUpdate => summary.system_update += 1,
                SnapshotKind::Unknown => summary.unknown += 1,
            }
            if record.is_deletable {
                summary.deletable_bytes += record.estimated_bytes;
                if matches!(
                    record.size_confidence,
                    SizeConfidence::Estimated | SizeConfidence::Unavailable
                ) {
                    summary.has_estimates = true;
                }
            }
        }
        summary
    }

    pub fn deletable_gb(&self) -> f64 {
        size::bytes_to_gb(self.deletable_bytes)
    }
}
