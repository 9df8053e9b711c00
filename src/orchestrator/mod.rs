//! Cleanup orchestration.
//!
//! [`CleanupOrchestrator::run`] drives one batch:
//! 1. Measure disk usage (failure aborts the run)
//! 2. Take the checked items in plan order
//! 3. For each item: report progress, validate against the current
//!    whitelist, then execute or reject; a failed item never stops the batch
//! 4. Report final progress
//! 5. Wait for the filesystem to settle and measure again (failure aborts)
//! 6. Report freed space, never negative
//!
//! Commands run one at a time on the calling thread. Events go out over an
//! `mpsc` channel; a receiver that hangs up does not affect the batch.

mod accounting;
mod types;


pub use accounting::freed_gb;
pub use types::{
    BatchState, CancellationToken, CleanupEvent, CleanupResult, FailureKind, ItemFailure,
    ItemState, ProgressUpdate, WhitelistSource,
};

use crate::disk::{DiskProbe, measure};
use crate::error::Result;
use crate::exec::CommandExecutor;
use crate::plan::CleanupItem;
use crate::validate::{CommandSafetyValidator, ValidationResult};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default pause before the final measurement.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Sequences validated cleanup commands and accounts for the space freed.
pub struct CleanupOrchestrator<'a> {
    executor: &'a dyn CommandExecutor,
    probe: &'a dyn DiskProbe,
    validator: CommandSafetyValidator,
    settle_delay: Duration,
    events: Option<Sender<CleanupEvent>>,
    cancel: CancellationToken,
    state: BatchState,
}

impl<'a> CleanupOrchestrator<'a> {
    pub fn new(
        executor: &'a dyn CommandExecutor,
        probe: &'a dyn DiskProbe,
        validator: CommandSafetyValidator,
    ) -> Self {
        Self {
            executor,
            probe,
            validator,
            settle_delay: DEFAULT_SETTLE_DELAY,
            events: None,
            cancel: CancellationToken::new(),
            state: BatchState::Idle,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Send progress and per-item events to `sender`.
    pub fn with_events(mut self, sender: Sender<CleanupEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Stop the batch before its next item once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Run every checked item in `items`.
    ///
    /// Per-item rejections and execution errors are collected in the
    /// result. Only a failed disk measurement is returned as an error.
    pub fn run(
        &mut self,
        items: &[CleanupItem],
        whitelist: &dyn WhitelistSource,
    ) -> Result<CleanupResult> {
        self.state = BatchState::Running;

        let before = match measure(self.probe) {
            Ok(info) => info,
            Err(e) => {
                self.state = BatchState::Idle;
                return Err(e);
            }
        };

        let selected: Vec<&CleanupItem> = items.iter().filter(|i| i.checked).collect();
        let total = selected.len();
        info!(
            total,
            skipped = items.len() - total,
            used = %before.used,
            "starting cleanup batch"
        );
        self.emit(CleanupEvent::BatchStarted { total_count: total });

        let mut completed_items = Vec::new();
        let mut failures = Vec::new();
        let mut attempted = 0;
        let mut cancelled = false;

        for (index, item) in selected.iter().copied().enumerate() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                info!(remaining = total - index, "cleanup batch cancelled");
                for skipped in &selected[index..] {
                    failures.push(self.cancel_item(skipped));
                }
                break;
            }

            self.emit(CleanupEvent::Progress(ProgressUpdate {
                current_item: item.label().to_string(),
                completed_count: index,
                total_count: total,
            }));

            attempted += 1;
            match self.run_item(item, whitelist) {
                Ok(()) => completed_items.push(item.clone()),
                Err(failure) => failures.push(failure),
            }
        }

        self.emit(CleanupEvent::Progress(ProgressUpdate {
            current_item: selected
                .last()
                .map(|i| i.label().to_string())
                .unwrap_or_default(),
            completed_count: total,
            total_count: total,
        }));

        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }

        let after = measure(self.probe);
        self.state = BatchState::Finished;
        let after = after?;

        let total_freed_gb = freed_gb(&before, &after);
        info!(
            completed = completed_items.len(),
            failed = failures.len(),
            total,
            freed_gb = total_freed_gb,
            "cleanup batch finished"
        );
        for failure in &failures {
            warn!(item = %failure.item_id, kind = ?failure.kind, "{}", failure);
        }

        self.emit(CleanupEvent::BatchFinished {
            completed_count: completed_items.len(),
            total_count: total,
            total_freed_gb,
        });

        Ok(CleanupResult {
            before_disk_info: before,
            after_disk_info: after,
            completed_items,
            total_freed_gb,
            failures,
            attempted,
            cancelled,
        })
    }

    fn run_item(
        &mut self,
        item: &CleanupItem,
        whitelist: &dyn WhitelistSource,
    ) -> std::result::Result<(), ItemFailure> {
        self.set_state(item, ItemState::Validating);

        // Read the whitelist now, not at batch start, so edits made during
        // the batch still protect the remaining items.
        let verdict = match whitelist.snapshot() {
            Ok(entries) => self.validator.validate(&item.command, &entries),
            Err(e) => {
                return Err(self.fail_item(
                    item,
                    ItemState::Rejected,
                    FailureKind::Rejected,
                    format!("whitelist could not be loaded: {}", e),
                ));
            }
        };

        if let ValidationResult::Rejected(rejection) = verdict {
            warn!(item = %item.id, command = %item.command, reason = %rejection.reason, "skipping unsafe command");
            return Err(self.fail_item(
                item,
                ItemState::Rejected,
                FailureKind::Rejected,
                rejection.reason,
            ));
        }

        self.set_state(item, ItemState::Executing);
        info!(item = %item.id, command = %item.command, "executing cleanup command");

        match self.executor.execute(&item.command) {
            Ok(output) => {
                debug!(item = %item.id, output = %output.trim(), "cleanup command succeeded");
                self.set_state(item, ItemState::Completed);
                self.emit(CleanupEvent::ItemFinished {
                    item_id: item.id.clone(),
                    success: true,
                    error: None,
                });
                Ok(())
            }
            Err(e) => Err(self.fail_item(
                item,
                ItemState::Failed,
                FailureKind::ExecutionFailed,
                format!("execution failed: {}", e),
            )),
        }
    }

    fn cancel_item(&mut self, item: &CleanupItem) -> ItemFailure {
        self.fail_item(
            item,
            ItemState::Cancelled,
            FailureKind::Cancelled,
            "batch cancelled before this item ran".to_string(),
        )
    }

    fn fail_item(
        &mut self,
        item: &CleanupItem,
        state: ItemState,
        kind: FailureKind,
        reason: String,
    ) -> ItemFailure {
        let failure = ItemFailure {
            item_id: item.id.clone(),
            label: item.label().to_string(),
            kind,
            reason,
        };
        self.set_state(item, state);
        self.emit(CleanupEvent::ItemFinished {
            item_id: item.id.clone(),
            success: false,
            error: Some(failure.to_string()),
        });
        failure
    }

    fn set_state(&mut self, item: &CleanupItem, state: ItemState) {
        self.emit(CleanupEvent::ItemStateChanged {
            item_id: item.id.clone(),
            state,
        });
    }

    fn emit(&mut self, event: CleanupEvent) {
        if let Some(sender) = &self.events
            && sender.send(event).is_err()
        {
            debug!("progress receiver disconnected, continuing without events");
            self.events = None;
        }
    }
}
