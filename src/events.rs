//! Append-only audit log.
//!
//! Every cleanup run and every whitelist change appends one NDJSON line to
//! `events.ndjson` next to the configuration file.
//!
//! # Event Format
//!
//! - `ts`: RFC3339 timestamp
//! - `action`: `run`, `whitelist_add` or `whitelist_remove`
//! - `actor`: `user@HOST`
//! - `details`: action-specific object (counts, freed space, paths)

use crate::context::AppContext;
use crate::error::{ReclaimError, Result};
use crate::orchestrator::CleanupResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs::{self, OpenOptions};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// A cleanup batch was executed.
    Run,
    WhitelistAdd,
    WhitelistRemove,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Run => write!(f, "run"),
            EventAction::WhitelistAdd => write!(f, "whitelist_add"),
            EventAction::WhitelistRemove => write!(f, "whitelist_remove"),
        }
    }
}

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,
    pub action: EventAction,
    /// `user@HOST` of whoever ran the command.
    pub actor: String,
    pub details: Value,
}

impl Event {
    /// New event stamped with the current time and actor.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor_string(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Summary event for a finished cleanup batch.
    pub fn for_run(result: &CleanupResult) -> Self {
        let failures: Vec<Value> = result
            .failures
            .iter()
            .map(|f| json!({"item": f.item_id, "kind": f.kind, "reason": f.reason}))
            .collect();
        let completed: Vec<&str> = result.completed_items.iter().map(|i| i.id.as_str()).collect();
        Self::new(EventAction::Run).with_details(json!({
            "completed": result.completed_count(),
            "attempted": result.attempted,
            "cancelled": result.cancelled,
            "freed_gb": result.total_freed_gb,
            "used_before": result.before_disk_info.used,
            "used_after": result.after_disk_info.used,
            "completed_items": completed,
            "failures": failures,
        }))
    }

    /// Serialize to a single JSON line.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ReclaimError::UserError(format!("failed to serialize event to JSON: {}", e)))
    }
}

fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to the log, creating the file and its directory if needed.
pub fn append_event(ctx: &AppContext, event: &Event) -> Result<()> {
    let path = &ctx.events_path;
    let line = event.to_ndjson_line()?;

    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
        && !dir.exists()
    {
        fs::create_dir_all(dir).map_err(|e| {
            ReclaimError::UserError(format!(
                "failed to create events directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            ReclaimError::UserError(format!(
                "failed to open events file '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", line).map_err(|e| {
        ReclaimError::UserError(format!(
            "failed to write event to '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        ReclaimError::UserError(format!(
            "failed to sync events file '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Read every event in the log. A missing log is empty.
pub fn read_events(ctx: &AppContext) -> Result<Vec<Event>> {
    let path = &ctx.events_path;
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ReclaimError::UserError(format!(
                "failed to read events file '{}': {}",
                path.display(),
                e
            )));
        }
    };

    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .enumerate()
        .map(|(n, line)| {
            serde_json::from_str(line).map_err(|e| {
                ReclaimError::UserError(format!(
                    "malformed event on line {} of '{}': {}",
                    n + 1,
                    path.display(),
                    e
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::DiskInfo;
    use crate::orchestrator::{FailureKind, ItemFailure};
    use crate::plan::{CleanupItem, RiskLevel};
    use tempfile::TempDir;

    fn temp_ctx() -> (TempDir, AppContext) {
        let dir = TempDir::new().unwrap();
        let ctx = AppContext::in_dir(dir.path().join("state"));
        (dir, ctx)
    }

    fn disk(used: &str) -> DiskInfo {
        DiskInfo {
            total: "500G".to_string(),
            used: used.to_string(),
            available: "100G".to_string(),
            usage_percentage: 80,
        }
    }

    #[test]
    fn test_event_creation() {
        let event = Event::new(EventAction::Run);

        assert_eq!(event.action, EventAction::Run);
        assert!(event.actor.contains('@'));
        let age = Utc::now().signed_duration_since(event.ts);
        assert!(age.num_minutes() < 1);
    }

    #[test]
    fn test_action_serializes_snake_case() {
        let line = Event::new(EventAction::WhitelistRemove)
            .to_ndjson_line()
            .unwrap();
        assert!(line.contains("\"whitelist_remove\""));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_run_event_summarizes_result() {
        let result = CleanupResult {
            before_disk_info: disk("120G"),
            after_disk_info: disk("115G"),
            completed_items: vec![CleanupItem::new("trash", "Trash", "rm -rf ~/.Trash/*", RiskLevel::Low)],
            total_freed_gb: 5.0,
            failures: vec![ItemFailure {
                item_id: "docs".to_string(),
                label: "Docs".to_string(),
                kind: FailureKind::Rejected,
                reason: "command touches protected path '~/Documents'".to_string(),
            }],
            attempted: 2,
            cancelled: false,
        };

        let event = Event::for_run(&result);

        assert_eq!(event.details["completed"], 1);
        assert_eq!(event.details["attempted"], 2);
        assert_eq!(event.details["freed_gb"], 5.0);
        assert_eq!(event.details["used_before"], "120G");
        assert_eq!(event.details["completed_items"][0], "trash");
        assert_eq!(event.details["failures"][0]["kind"], "rejected");
    }

    #[test]
    fn test_append_creates_directory_and_file() {
        let (_dir, ctx) = temp_ctx();
        assert!(!ctx.events_path.exists());

        append_event(&ctx, &Event::new(EventAction::Run)).unwrap();

        let content = fs::read_to_string(&ctx.events_path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_append_preserves_order() {
        let (_dir, ctx) = temp_ctx();

        append_event(
            &ctx,
            &Event::new(EventAction::WhitelistAdd).with_details(json!({"path": "~/Projects"})),
        )
        .unwrap();
        append_event(&ctx, &Event::new(EventAction::Run)).unwrap();

        let events = read_events(&ctx).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, EventAction::WhitelistAdd);
        assert_eq!(events[0].details["path"], "~/Projects");
        assert_eq!(events[1].action, EventAction::Run);
    }

    #[test]
    fn test_read_missing_log_is_empty() {
        let (_dir, ctx) = temp_ctx();
        assert!(read_events(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_read_reports_malformed_line() {
        let (_dir, ctx) = temp_ctx();
        append_event(&ctx, &Event::new(EventAction::Run)).unwrap();
        let mut file = OpenOptions::new().append(true).open(&ctx.events_path).unwrap();
        writeln!(file, "not json").unwrap();

        let err = read_events(&ctx).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
