//! CLI argument parsing for reclaim.
//!
//! Uses clap derive macros for declarative argument definitions.
//! Implementations live in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reclaim: inspect disk usage and run operator-approved cleanup plans.
///
/// Every command in a plan is checked against safety rules and the
/// protected-path whitelist immediately before it runs.
#[derive(Parser, Debug)]
#[command(name = "reclaim")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: <user config dir>/reclaim/config.yaml).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show current disk usage of the root volume.
    Disk(DiskArgs),

    /// List local snapshots with their kind and measured size.
    Snapshots(SnapshotsArgs),

    /// Normalize planner output into a cleanup plan.
    ///
    /// Reads free-form advisory text (with or without a fenced JSON block)
    /// and writes the strict plan as JSON.
    Plan(PlanArgs),

    /// Check a single command against the safety rules and whitelist.
    Check(CheckArgs),

    /// Execute the checked items of a plan.
    ///
    /// Without `--yes` this is a dry run that only prints each verdict.
    Run(RunArgs),

    /// Manage protected paths.
    Whitelist(WhitelistCommand),

    /// Show or create the configuration file.
    Config(ConfigCommand),

    /// Show recent audit events (runs and whitelist changes).
    History(HistoryArgs),
}

#[derive(Parser, Debug)]
pub struct DiskArgs {
    /// Print the measurement as JSON.
    #[arg(long)]
    pub json: bool,

    /// Also measure caches, downloads, trash, logs, temp files and list
    /// large files.
    #[arg(long)]
    pub breakdown: bool,
}

#[derive(Parser, Debug)]
pub struct SnapshotsArgs {
    /// Print snapshot records as JSON.
    #[arg(long)]
    pub json: bool,

    /// Print the snapshot cleanup items as a plan instead of the records.
    #[arg(long, conflicts_with = "json")]
    pub emit_plan: bool,
}

#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Advisory text file, or `-` for stdin.
    pub input: PathBuf,

    /// Append the default snapshot items to the plan.
    #[arg(long)]
    pub with_snapshots: bool,

    /// Write the plan here instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Command line to validate, quoted as one argument.
    pub command: String,

    /// Print the verdict as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Plan JSON produced by `reclaim plan`, or `-` for stdin.
    pub plan: PathBuf,

    /// Execute approved commands instead of only reporting verdicts.
    #[arg(long)]
    pub yes: bool,

    /// Run only these item ids (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip these item ids (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Print the batch result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct WhitelistCommand {
    #[command(subcommand)]
    pub action: WhitelistAction,
}

#[derive(Subcommand, Debug)]
pub enum WhitelistAction {
    /// List protected paths.
    List,

    /// Protect a path (literal or glob).
    Add(WhitelistAddArgs),

    /// Stop protecting a path, by id or by path.
    Remove(WhitelistRemoveArgs),

    /// Show commonly protected system and user paths.
    Suggest(WhitelistSuggestArgs),
}

#[derive(Parser, Debug)]
pub struct WhitelistAddArgs {
    pub path: String,

    /// Note shown in `whitelist list`.
    #[arg(short, long)]
    pub description: Option<String>,
}

#[derive(Parser, Debug)]
pub struct WhitelistRemoveArgs {
    /// Entry id or exact path.
    pub entry: String,
}

#[derive(Parser, Debug)]
pub struct WhitelistSuggestArgs {
    /// Add every suggestion that is not already protected.
    #[arg(long)]
    pub apply: bool,
}

#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Number of most recent events to show (0 shows all).
    #[arg(long, default_value_t = 20)]
    pub tail: usize,

    /// Print the events as a JSON array.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration and its location.
    Show,

    /// Write a default configuration file.
    Init(ConfigInitArgs),
}

#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_disk() {
        let cli = Cli::try_parse_from(["reclaim", "disk"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Disk(DiskArgs {
                json: false,
                breakdown: false
            })
        ));
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["reclaim", "disk", "--config", "/tmp/r.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/r.yaml")));
    }

    #[test]
    fn parse_snapshots_flags_conflict() {
        assert!(Cli::try_parse_from(["reclaim", "snapshots", "--json", "--emit-plan"]).is_err());
        let cli = Cli::try_parse_from(["reclaim", "snapshots", "--emit-plan"]).unwrap();
        if let Command::Snapshots(args) = cli.command {
            assert!(args.emit_plan);
        } else {
            panic!("Expected Snapshots command");
        }
    }

    #[test]
    fn parse_plan_from_stdin() {
        let cli =
            Cli::try_parse_from(["reclaim", "plan", "-", "--with-snapshots", "-o", "plan.json"])
                .unwrap();
        if let Command::Plan(args) = cli.command {
            assert_eq!(args.input, PathBuf::from("-"));
            assert!(args.with_snapshots);
            assert_eq!(args.output, Some(PathBuf::from("plan.json")));
        } else {
            panic!("Expected Plan command");
        }
    }

    #[test]
    fn parse_history_tail() {
        let cli = Cli::try_parse_from(["reclaim", "history"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::History(HistoryArgs { tail: 20, json: false })
        ));
        let cli = Cli::try_parse_from(["reclaim", "history", "--tail", "0", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::History(HistoryArgs { tail: 0, json: true })
        ));
    }

    #[test]
    fn parse_check_takes_one_command() {
        let cli = Cli::try_parse_from(["reclaim", "check", "rm -rf ~/.Trash/*"]).unwrap();
        if let Command::Check(args) = cli.command {
            assert_eq!(args.command, "rm -rf ~/.Trash/*");
        } else {
            panic!("Expected Check command");
        }
    }

    #[test]
    fn parse_run_defaults_to_dry_run() {
        let cli = Cli::try_parse_from(["reclaim", "run", "plan.json"]).unwrap();
        if let Command::Run(args) = cli.command {
            assert!(!args.yes);
            assert!(args.only.is_empty());
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_selection() {
        let cli = Cli::try_parse_from([
            "reclaim",
            "run",
            "plan.json",
            "--yes",
            "--only",
            "caches,trash",
            "--skip",
            "logs",
        ])
        .unwrap();
        if let Command::Run(args) = cli.command {
            assert!(args.yes);
            assert_eq!(args.only, vec!["caches", "trash"]);
            assert_eq!(args.skip, vec!["logs"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_whitelist_add() {
        let cli = Cli::try_parse_from([
            "reclaim",
            "whitelist",
            "add",
            "~/Projects",
            "-d",
            "active work",
        ])
        .unwrap();
        if let Command::Whitelist(WhitelistCommand {
            action: WhitelistAction::Add(args),
        }) = cli.command
        {
            assert_eq!(args.path, "~/Projects");
            assert_eq!(args.description.as_deref(), Some("active work"));
        } else {
            panic!("Expected Whitelist Add command");
        }
    }

    #[test]
    fn parse_whitelist_list_and_remove() {
        let cli = Cli::try_parse_from(["reclaim", "whitelist", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Whitelist(WhitelistCommand {
                action: WhitelistAction::List
            })
        ));

        let cli = Cli::try_parse_from(["reclaim", "whitelist", "remove", "wl_2"]).unwrap();
        if let Command::Whitelist(WhitelistCommand {
            action: WhitelistAction::Remove(args),
        }) = cli.command
        {
            assert_eq!(args.entry, "wl_2");
        } else {
            panic!("Expected Whitelist Remove command");
        }
    }

    #[test]
    fn parse_config_init_force() {
        let cli = Cli::try_parse_from(["reclaim", "config", "init", "--force"]).unwrap();
        if let Command::Config(ConfigCommand {
            action: ConfigAction::Init(args),
        }) = cli.command
        {
            assert!(args.force);
        } else {
            panic!("Expected Config Init command");
        }
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["reclaim", "claim"]).is_err());
    }
}
