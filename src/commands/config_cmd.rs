//! Implementation of the `reclaim config` commands.

use super::load_config;
use crate::cli::ConfigInitArgs;
use crate::config::Config;
use crate::context::AppContext;
use crate::error::{ReclaimError, Result};

pub fn cmd_config_show(ctx: &AppContext) -> Result<()> {
    let config = load_config(ctx)?;
    let origin = if ctx.config_path.exists() {
        "file"
    } else {
        "defaults, file not found"
    };

    println!("# {} ({})", ctx.config_path.display(), origin);
    println!("# events: {}", ctx.events_path.display());
    print!("{}", config.to_yaml()?);
    Ok(())
}

pub fn cmd_config_init(ctx: &AppContext, args: ConfigInitArgs) -> Result<()> {
    if ctx.config_path.exists() && !args.force {
        return Err(ReclaimError::UserError(format!(
            "'{}' already exists; pass --force to overwrite",
            ctx.config_path.display()
        )));
    }

    Config::default().save(&ctx.config_path)?;
    println!("Wrote default configuration to {}", ctx.config_path.display());
    Ok(())
}
