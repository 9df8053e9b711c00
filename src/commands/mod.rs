//! Command implementations for reclaim.
//!
//! This module routes CLI commands to their handlers and holds the small
//! amount of wiring they share: loading the config, building the shell
//! executor and disk probe, and reading plan input from a file or stdin.

mod check;
mod config_cmd;
mod disk;
mod history;
mod plan;
mod run;
mod snapshots;
mod whitelist;

use crate::cli::{Cli, Command, ConfigAction, WhitelistAction};
use crate::config::Config;
use crate::context::AppContext;
use crate::disk::CommandDiskProbe;
use crate::error::{ReclaimError, Result};
use crate::exec::ShellExecutor;
use crate::fs::atomic_write_file;
use crate::validate::CommandSafetyValidator;
use std::io::Read;
use std::path::Path;

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let ctx = AppContext::resolve(cli.config.as_deref())?;

    match cli.command {
        Command::Disk(args) => disk::cmd_disk(&ctx, args),
        Command::Snapshots(args) => snapshots::cmd_snapshots(&ctx, args),
        Command::Plan(args) => plan::cmd_plan(&ctx, args),
        Command::Check(args) => check::cmd_check(&ctx, args),
        Command::Run(args) => run::cmd_run(&ctx, args),
        Command::Whitelist(cmd) => match cmd.action {
            WhitelistAction::List => whitelist::cmd_whitelist_list(&ctx),
            WhitelistAction::Add(args) => whitelist::cmd_whitelist_add(&ctx, args),
            WhitelistAction::Remove(args) => whitelist::cmd_whitelist_remove(&ctx, args),
            WhitelistAction::Suggest(args) => whitelist::cmd_whitelist_suggest(&ctx, args),
        },
        Command::Config(cmd) => match cmd.action {
            ConfigAction::Show => config_cmd::cmd_config_show(&ctx),
            ConfigAction::Init(args) => config_cmd::cmd_config_init(&ctx, args),
        },
        Command::History(args) => history::cmd_history(&ctx, args),
    }
}

// ============================================================================
// Shared wiring
// ============================================================================

/// Load the config, treating a missing file as the defaults.
fn load_config(ctx: &AppContext) -> Result<Config> {
    Config::load_or_default(&ctx.config_path)
}

fn shell_executor(config: &Config) -> ShellExecutor {
    ShellExecutor::new(config.command_timeout_seconds).with_shell(config.shell.clone())
}

fn disk_probe(config: &Config) -> CommandDiskProbe<ShellExecutor> {
    CommandDiskProbe::new(shell_executor(config), config.disk_usage_command.clone())
}

fn validator(config: &Config) -> CommandSafetyValidator {
    CommandSafetyValidator::for_current_user(config.safety_policy)
}

/// Read a whole input file, or stdin when the path is `-`.
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| ReclaimError::UserError(format!("failed to read stdin: {}", e)))?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).map_err(|e| {
        ReclaimError::UserError(format!("failed to read '{}': {}", path.display(), e))
    })
}

/// Write to a file atomically, or to stdout when no path is given.
fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => atomic_write_file(path, content),
        None => {
            println!("{}", content.trim_end());
            Ok(())
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ReclaimError::UserError(format!("failed to serialize output: {}", e)))
}
