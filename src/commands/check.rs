//! Implementation of the `reclaim check` command.

use super::{load_config, to_json, validator};
use crate::cli::CheckArgs;
use crate::context::AppContext;
use crate::error::{ReclaimError, Result};

/// Validate one command against the current whitelist.
///
/// A rejected command exits with the validation failure code, so the
/// command can gate scripts.
pub fn cmd_check(ctx: &AppContext, args: CheckArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let verdict = validator(&config).validate(&args.command, &config.whitelist);

    if args.json {
        println!("{}", to_json(&verdict)?);
    } else {
        println!("{}", verdict);
    }

    match verdict.reason() {
        None => Ok(()),
        Some(reason) => Err(ReclaimError::ValidationRejected(reason.to_string())),
    }
}
