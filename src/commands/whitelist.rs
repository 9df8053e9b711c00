//! Implementation of the `reclaim whitelist` commands.
//!
//! Changes are written atomically and logged as `whitelist_add` /
//! `whitelist_remove` events. A running batch picks them up before its next
//! item.

use super::load_config;
use crate::cli::{WhitelistAddArgs, WhitelistRemoveArgs, WhitelistSuggestArgs};
use crate::config::Config;
use crate::context::AppContext;
use crate::error::Result;
use crate::events::{Event, EventAction, append_event};
use crate::validate::{WhitelistEntry, suggested_whitelist};
use serde_json::json;
use tracing::warn;

pub fn cmd_whitelist_list(ctx: &AppContext) -> Result<()> {
    let config = load_config(ctx)?;

    if config.whitelist.is_empty() {
        println!("No protected paths.");
        println!("Run `reclaim whitelist suggest` for common choices.");
        return Ok(());
    }

    println!("Protected paths ({}):", config.whitelist.len());
    for entry in &config.whitelist {
        print_entry(entry);
    }
    Ok(())
}

pub fn cmd_whitelist_add(ctx: &AppContext, args: WhitelistAddArgs) -> Result<()> {
    let mut config = load_config(ctx)?;
    let before = config.whitelist.len();

    let id = config.add_whitelist_path(&args.path, args.description)?;
    if config.whitelist.len() == before {
        println!("Already protected as {}.", id);
        return Ok(());
    }

    config.save(&ctx.config_path)?;
    record(
        ctx,
        &config,
        Event::new(EventAction::WhitelistAdd).with_details(json!({"id": &id, "path": args.path.trim()})),
    );
    println!("Protected {} as {}.", args.path.trim(), id);
    Ok(())
}

pub fn cmd_whitelist_remove(ctx: &AppContext, args: WhitelistRemoveArgs) -> Result<()> {
    let mut config = load_config(ctx)?;

    let removed = config.remove_whitelist_entry(&args.entry)?;
    config.save(&ctx.config_path)?;
    record(
        ctx,
        &config,
        Event::new(EventAction::WhitelistRemove)
            .with_details(json!({"id": removed.id, "path": removed.path})),
    );
    println!("Removed {} ({}).", removed.id, removed.path);
    Ok(())
}

pub fn cmd_whitelist_suggest(ctx: &AppContext, args: WhitelistSuggestArgs) -> Result<()> {
    let mut config = load_config(ctx)?;
    let missing: Vec<WhitelistEntry> = suggested_whitelist()
        .into_iter()
        .filter(|s| !config.whitelist.iter().any(|e| e.path == s.path))
        .collect();

    if missing.is_empty() {
        println!("All suggested paths are already protected.");
        return Ok(());
    }

    if !args.apply {
        println!("Suggested protected paths ({}):", missing.len());
        for entry in &missing {
            print_entry(entry);
        }
        println!();
        println!("Run with --apply to protect them.");
        return Ok(());
    }

    let mut added = Vec::new();
    for entry in &missing {
        let id = config.add_whitelist_path(&entry.path, entry.description.clone())?;
        added.push(json!({"id": id, "path": entry.path}));
    }
    config.save(&ctx.config_path)?;
    record(
        ctx,
        &config,
        Event::new(EventAction::WhitelistAdd).with_details(json!({"entries": added})),
    );
    println!("Protected {} suggested path(s).", added.len());
    Ok(())
}

fn print_entry(entry: &WhitelistEntry) {
    match &entry.description {
        Some(description) => println!("  {:<14} {}  ({})", entry.id, entry.path, description),
        None => println!("  {:<14} {}", entry.id, entry.path),
    }
}

/// The config change is already saved, so a logging failure only warns.
fn record(ctx: &AppContext, config: &Config, event: Event) {
    if !config.record_events {
        return;
    }
    if let Err(e) = append_event(ctx, &event) {
        warn!(error = %e, action = %event.action, "failed to record whitelist event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::read_events;
    use tempfile::TempDir;

    fn temp_ctx() -> (TempDir, AppContext) {
        let dir = TempDir::new().unwrap();
        let ctx = AppContext::in_dir(dir.path());
        (dir, ctx)
    }

    fn add(ctx: &AppContext, path: &str) {
        cmd_whitelist_add(
            ctx,
            WhitelistAddArgs {
                path: path.to_string(),
                description: None,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_add_saves_config_and_logs_event() {
        let (_dir, ctx) = temp_ctx();

        add(&ctx, "~/Projects");

        let config = Config::load(&ctx.config_path).unwrap();
        assert_eq!(config.whitelist, vec![WhitelistEntry::new("wl_1", "~/Projects")]);
        let events = read_events(&ctx).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, EventAction::WhitelistAdd);
        assert_eq!(events[0].details["path"], "~/Projects");
    }

    #[test]
    fn test_adding_twice_is_a_no_op() {
        let (_dir, ctx) = temp_ctx();

        add(&ctx, "~/Projects");
        add(&ctx, "~/Projects");

        assert_eq!(Config::load(&ctx.config_path).unwrap().whitelist.len(), 1);
        assert_eq!(read_events(&ctx).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_by_path() {
        let (_dir, ctx) = temp_ctx();
        add(&ctx, "~/Projects");
        add(&ctx, "~/Music");

        cmd_whitelist_remove(
            &ctx,
            WhitelistRemoveArgs {
                entry: "~/Projects".to_string(),
            },
        )
        .unwrap();

        let config = Config::load(&ctx.config_path).unwrap();
        assert_eq!(config.whitelist.len(), 1);
        assert_eq!(config.whitelist[0].path, "~/Music");
        let events = read_events(&ctx).unwrap();
        assert_eq!(events.last().unwrap().action, EventAction::WhitelistRemove);
    }

    #[test]
    fn test_remove_unknown_entry_fails() {
        let (_dir, ctx) = temp_ctx();
        let err = cmd_whitelist_remove(
            &ctx,
            WhitelistRemoveArgs {
                entry: "wl_9".to_string(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("wl_9"));
        assert!(!ctx.config_path.exists());
    }

    #[test]
    fn test_suggest_without_apply_changes_nothing() {
        let (_dir, ctx) = temp_ctx();

        cmd_whitelist_suggest(&ctx, WhitelistSuggestArgs { apply: false }).unwrap();

        assert!(!ctx.config_path.exists());
    }

    #[test]
    fn test_suggest_apply_skips_existing_paths() {
        let (_dir, ctx) = temp_ctx();
        add(&ctx, "/System");

        cmd_whitelist_suggest(&ctx, WhitelistSuggestArgs { apply: true }).unwrap();

        let config = Config::load(&ctx.config_path).unwrap();
        assert_eq!(config.whitelist.len(), suggested_whitelist().len());
        assert_eq!(
            config.whitelist.iter().filter(|e| e.path == "/System").count(),
            1
        );
    }

    #[test]
    fn test_events_can_be_disabled() {
        let (_dir, ctx) = temp_ctx();
        let config = Config {
            record_events: false,
            ..Config::default()
        };
        config.save(&ctx.config_path).unwrap();

        add(&ctx, "~/Projects");

        assert!(read_events(&ctx).unwrap().is_empty());
    }
}
