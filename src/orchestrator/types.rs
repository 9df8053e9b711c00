//! Orchestration state, events, and results.

use crate::disk::DiskInfo;
use crate::error::Result;
use crate::plan::CleanupItem;
use crate::validate::WhitelistEntry;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Lifecycle of one item within a batch.
///
/// `Pending → Validating → {Rejected | Executing} → {Completed | Failed}`,
/// or `Pending → Cancelled` when the batch is cancelled first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    Validating,
    Rejected,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

/// Lifecycle of the orchestrator: `Idle → Running → Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Finished,
}

/// Position within a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    /// Label of the item about to run (or the last item, in the final update).
    pub current_item: String,
    pub completed_count: usize,
    pub total_count: usize,
}

/// Notification sent while a batch runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CleanupEvent {
    BatchStarted {
        total_count: usize,
    },
    Progress(ProgressUpdate),
    ItemStateChanged {
        item_id: String,
        state: ItemState,
    },
    ItemFinished {
        item_id: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    BatchFinished {
        completed_count: usize,
        total_count: usize,
        total_freed_gb: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The safety validator refused the command.
    Rejected,
    /// The executor reported an error.
    ExecutionFailed,
    /// The batch was cancelled before the item ran.
    Cancelled,
}

/// An item that did not complete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub item_id: String,
    pub label: String,
    pub kind: FailureKind,
    pub reason: String,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.reason)
    }
}

/// Outcome of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupResult {
    pub before_disk_info: DiskInfo,
    pub after_disk_info: DiskInfo,
    /// Items whose command ran successfully, in execution order.
    pub completed_items: Vec<CleanupItem>,
    /// Never negative.
    pub total_freed_gb: f64,
    pub failures: Vec<ItemFailure>,
    /// Checked items that reached validation.
    pub attempted: usize,
    pub cancelled: bool,
}

impl CleanupResult {
    pub fn completed_count(&self) -> usize {
        self.completed_items.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Cooperative cancellation shared between the orchestrator and its caller.
///
/// Checked between items; a command that is already running is never
/// interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where the orchestrator reads the whitelist from, once per item.
pub trait WhitelistSource {
    fn snapshot(&self) -> Result<Vec<WhitelistEntry>>;
}

impl WhitelistSource for Vec<WhitelistEntry> {
    fn snapshot(&self) -> Result<Vec<WhitelistEntry>> {
        Ok(self.clone())
    }
}
