//! Location of reclaim's on-disk state.
//!
//! Everything lives in one directory: the configuration file and the
//! append-only event log beside it. The directory defaults to
//! `<user config dir>/reclaim/` and follows `--config` when given.

use crate::error::{ReclaimError, Result};
use std::path::{Path, PathBuf};

/// Directory name under the user's configuration directory.
pub const APP_DIR: &str = "reclaim";

pub const CONFIG_FILE: &str = "config.yaml";

pub const EVENTS_FILE: &str = "events.ndjson";

/// Resolved paths for one invocation. All paths are absolute or exactly as
/// given on the command line.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config_path: PathBuf,
    pub events_path: PathBuf,
}

impl AppContext {
    /// Resolve from an optional `--config` override.
    pub fn resolve(config_override: Option<&Path>) -> Result<Self> {
        match config_override {
            Some(path) => Ok(Self::from_config_path(path)),
            None => {
                let base = dirs::config_dir().ok_or_else(|| {
                    ReclaimError::Config(
                        "cannot determine the user configuration directory; pass --config"
                            .to_string(),
                    )
                })?;
                Ok(Self::in_dir(base.join(APP_DIR)))
            }
        }
    }

    /// Context rooted in `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::from_config_path(dir.as_ref().join(CONFIG_FILE))
    }

    /// Context for an explicit configuration file; the event log sits in
    /// the same directory.
    pub fn from_config_path(path: impl AsRef<Path>) -> Self {
        let config_path = path.as_ref().to_path_buf();
        let events_path = config_path
            .parent()
            .map(|dir| dir.join(EVENTS_FILE))
            .unwrap_or_else(|| PathBuf::from(EVENTS_FILE));
        Self {
            config_path,
            events_path,
        }
    }
}
