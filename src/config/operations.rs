//! Config loading, validation, persistence, and whitelist edits.

use super::model::Config;
use crate::error::{ReclaimError, Result};
use crate::fs::atomic_write_file;
use crate::orchestrator::WhitelistSource;
use crate::plan::unique_id;
use crate::validate::{WhitelistEntry, is_glob};
use std::path::{Path, PathBuf};
use tracing::debug;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            ReclaimError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config, falling back to defaults when the file does not exist.
    ///
    /// A file that exists but cannot be parsed is still an error: silently
    /// dropping a user's whitelist would be worse than refusing to start.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file is a valid, all-defaults config.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| ReclaimError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| ReclaimError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate and atomically write the config to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate()?;
        atomic_write_file(path, &self.to_yaml()?)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - whitelist ids must be unique, paths non-empty, and globs well-formed
    /// - `command_timeout_seconds` must be positive
    /// - `shell` and `disk_usage_command` must be non-empty
    /// - `snapshots.estimate_gb` must be finite and non-negative
    /// - `snapshots.probe_concurrency` must be positive
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for entry in &self.whitelist {
            if entry.path.trim().is_empty() {
                return Err(ReclaimError::Config(format!(
                    "config validation failed: whitelist entry '{}' has an empty path",
                    entry.id
                )));
            }
            if is_glob(&entry.path)
                && let Err(e) = globset::Glob::new(entry.path.trim())
            {
                return Err(ReclaimError::Config(format!(
                    "config validation failed: whitelist entry '{}' has an invalid glob: {}",
                    entry.id, e
                )));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(ReclaimError::Config(format!(
                    "config validation failed: duplicate whitelist id '{}'",
                    entry.id
                )));
            }
        }

        if self.command_timeout_seconds == 0 {
            return Err(ReclaimError::Config(
                "config validation failed: command_timeout_seconds must be greater than 0"
                    .to_string(),
            ));
        }

        if self.shell.trim().is_empty() {
            return Err(ReclaimError::Config(
                "config validation failed: shell must not be empty".to_string(),
            ));
        }

        if self.disk_usage_command.trim().is_empty() {
            return Err(ReclaimError::Config(
                "config validation failed: disk_usage_command must not be empty".to_string(),
            ));
        }

        let estimate = self.snapshots.estimate_gb;
        if !estimate.is_finite() || estimate < 0.0 {
            return Err(ReclaimError::Config(format!(
                "config validation failed: snapshots.estimate_gb must be a non-negative number (found {})",
                estimate
            )));
        }

        if self.snapshots.probe_concurrency == 0 {
            return Err(ReclaimError::Config(
                "config validation failed: snapshots.probe_concurrency must be greater than 0"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Add a protected path. Returns the id assigned to the new entry.
    ///
    /// Adding a path that is already protected is a no-op that returns the
    /// existing entry's id.
    pub fn add_whitelist_path(&mut self, path: &str, description: Option<String>) -> Result<String> {
        let path = path.trim();
        if path.is_empty() {
            return Err(ReclaimError::UserError(
                "whitelist path must not be empty".to_string(),
            ));
        }

        if let Some(existing) = self.whitelist.iter().find(|e| e.path == path) {
            return Ok(existing.id.clone());
        }

        let id = unique_id(&format!("wl_{}", self.whitelist.len() + 1), |candidate| {
            self.whitelist.iter().any(|e| e.id == candidate)
        });
        self.whitelist.push(WhitelistEntry {
            id: id.clone(),
            path: path.to_string(),
            description,
        });
        Ok(id)
    }

    /// Remove a whitelist entry by id or by exact path.
    pub fn remove_whitelist_entry(&mut self, id_or_path: &str) -> Result<WhitelistEntry> {
        let position = self
            .whitelist
            .iter()
            .position(|e| e.id == id_or_path || e.path == id_or_path)
            .ok_or_else(|| {
                ReclaimError::UserError(format!("no whitelist entry matches '{}'", id_or_path))
            })?;
        Ok(self.whitelist.remove(position))
    }
}

/// Whitelist read from the config file each time it is asked for.
///
/// The orchestrator asks once per item, so edits made while a batch is
/// running take effect for the remaining items.
#[derive(Debug, Clone)]
pub struct ConfigFileWhitelist {
    path: PathBuf,
}

impl ConfigFileWhitelist {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WhitelistSource for ConfigFileWhitelist {
    fn snapshot(&self) -> Result<Vec<WhitelistEntry>> {
        Ok(Config::load_or_default(&self.path)?.whitelist)
    }
}
