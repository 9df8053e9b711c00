//! Implementation of the `reclaim run` command.
//!
//! # Safety
//!
//! - Default behavior is a dry run that prints each item's verdict
//! - `--yes` is required to execute anything
//! - Every command is validated again immediately before it runs, against
//!   the whitelist as it is on disk at that moment
//!
//! # Logging
//!
//! Appends a `run` event with counts and freed space after execution,
//! unless `record_events` is off.

mod display;
mod selection;


use super::{disk_probe, load_config, read_input, shell_executor, to_json, validator};
use crate::cli::RunArgs;
use crate::config::ConfigFileWhitelist;
use crate::context::AppContext;
use crate::error::{ReclaimError, Result};
use crate::events::{Event, append_event};
use crate::orchestrator::{CancellationToken, CleanupOrchestrator, CleanupResult, FailureKind};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use display::{format_event, print_dry_run, print_summary};
use selection::{apply_selection, load_plan};

pub fn cmd_run(ctx: &AppContext, args: RunArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let mut plan = load_plan(&read_input(&args.plan)?)?;
    apply_selection(&mut plan, &args.only, &args.skip)?;

    let validator = validator(&config);

    if !args.yes {
        let verdicts: Vec<_> = plan
            .checked_items()
            .map(|item| (item, validator.validate(&item.command, &config.whitelist)))
            .collect();
        print_dry_run(&verdicts);
        return Ok(());
    }

    let executor = shell_executor(&config);
    let probe = disk_probe(&config);
    let whitelist = ConfigFileWhitelist::new(&ctx.config_path);

    let (tx, rx) = mpsc::channel();
    let printer = thread::spawn(move || {
        for event in rx {
            if let Some(line) = format_event(&event) {
                eprintln!("{}", line);
            }
        }
    });

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let mut orchestrator = CleanupOrchestrator::new(&executor, &probe, validator)
        .with_settle_delay(Duration::from_millis(config.settle_delay_ms))
        .with_events(tx)
        .with_cancellation(cancel);
    let outcome = orchestrator.run(&plan.items, &whitelist);
    drop(orchestrator);

    if printer.join().is_err() {
        warn!("progress printer panicked");
    }

    let result = outcome?;

    if config.record_events
        && let Err(e) = append_event(ctx, &Event::for_run(&result))
    {
        warn!(error = %e, "failed to record run event");
    }

    if args.json {
        println!("{}", to_json(&result)?);
    } else {
        print_summary(&result);
    }

    exit_status(&result)
}

/// Cancel the batch on Ctrl-C. The item already running finishes first.
///
/// The listener thread is left detached; it ends with the process.
fn cancel_on_interrupt(token: CancellationToken) {
    let spawned = thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!(error = %e, "cannot listen for Ctrl-C");
                    return;
                }
            };
            runtime.block_on(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "cannot listen for Ctrl-C");
                    return;
                }
                warn!("interrupted, stopping after the current item");
                token.cancel();
            });
        });
    if let Err(e) = spawned {
        debug!(error = %e, "interrupt listener not started");
    }
}

/// Map a finished batch to the command's exit status.
///
/// Execution failures and cancellation outrank rejections.
fn exit_status(result: &CleanupResult) -> Result<()> {
    if result.all_succeeded() && !result.cancelled {
        return Ok(());
    }
    let count = |kind: FailureKind| result.failures.iter().filter(|f| f.kind == kind).count();

    let failed = count(FailureKind::ExecutionFailed);
    if failed > 0 {
        return Err(ReclaimError::Incomplete(format!(
            "{} item(s) failed to execute",
            failed
        )));
    }
    if result.cancelled {
        return Err(ReclaimError::Incomplete(format!(
            "cancelled with {} item(s) not run",
            count(FailureKind::Cancelled)
        )));
    }
    let rejected = count(FailureKind::Rejected);
    if rejected > 0 {
        return Err(ReclaimError::ValidationRejected(format!(
            "{} item(s) skipped as unsafe",
            rejected
        )));
    }
    Ok(())
}
