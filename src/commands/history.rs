//! Implementation of the `reclaim history` command.

use super::to_json;
use crate::cli::HistoryArgs;
use crate::context::AppContext;
use crate::error::Result;
use crate::events::{Event, EventAction, read_events};

pub fn cmd_history(ctx: &AppContext, args: HistoryArgs) -> Result<()> {
    let events = last_events(read_events(ctx)?, args.tail);

    if args.json {
        println!("{}", to_json(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No events recorded in {}.", ctx.events_path.display());
        return Ok(());
    }

    println!("Recent events (last {}):", events.len());
    for event in &events {
        println!("  {}", format_event(event));
    }
    Ok(())
}

/// The `tail` most recent events in log order; all of them when `tail` is 0.
fn last_events(mut events: Vec<Event>, tail: usize) -> Vec<Event> {
    if tail > 0 && events.len() > tail {
        events.drain(..events.len() - tail);
    }
    events
}

fn format_event(event: &Event) -> String {
    let details = &event.details;
    let summary = match event.action {
        EventAction::Run => format!(
            "{}/{} completed, {:.2} GB freed{}",
            details["completed"],
            details["attempted"],
            details["freed_gb"].as_f64().unwrap_or(0.0),
            if details["cancelled"].as_bool() == Some(true) {
                ", cancelled"
            } else {
                ""
            }
        ),
        EventAction::WhitelistAdd | EventAction::WhitelistRemove => {
            match (details["path"].as_str(), details["entries"].as_array()) {
                (Some(path), _) => path.to_string(),
                (None, Some(entries)) => format!("{} path(s)", entries.len()),
                (None, None) => String::new(),
            }
        }
    };
    format!(
        "{}  {:16}  {:20}  {}",
        event.ts.format("%Y-%m-%d %H:%M:%S"),
        event.action.to_string(),
        event.actor,
        summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(action: EventAction, details: serde_json::Value) -> Event {
        Event::new(action).with_details(details)
    }

    #[test]
    fn tail_keeps_most_recent_in_order() {
        let events: Vec<Event> = (0..5)
            .map(|n| event(EventAction::Run, json!({"completed": n})))
            .collect();

        let last = last_events(events.clone(), 2);
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].details["completed"], 3);
        assert_eq!(last[1].details["completed"], 4);

        assert_eq!(last_events(events.clone(), 0).len(), 5);
        assert_eq!(last_events(events, 10).len(), 5);
    }

    #[test]
    fn run_event_line_shows_counts_and_freed_space() {
        let line = format_event(&event(
            EventAction::Run,
            json!({"completed": 2, "attempted": 3, "freed_gb": 5.0, "cancelled": true}),
        ));
        assert!(line.contains("run"));
        assert!(line.ends_with("2/3 completed, 5.00 GB freed, cancelled"));
    }

    #[test]
    fn whitelist_event_line_shows_path_or_count() {
        let add = format_event(&event(
            EventAction::WhitelistAdd,
            json!({"id": "wl_1", "path": "~/Projects"}),
        ));
        assert!(add.contains("whitelist_add"));
        assert!(add.ends_with("~/Projects"));

        let suggest = format_event(&event(
            EventAction::WhitelistAdd,
            json!({"entries": [{"id": "wl_1"}, {"id": "wl_2"}]}),
        ));
        assert!(suggest.ends_with("2 path(s)"));
    }
}
