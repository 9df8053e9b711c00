//! Configuration model for reclaim.
//!
//! This module defines the Config struct that represents
//! `~/.config/reclaim/config.yaml`. It supports forward-compatible YAML
//! parsing (unknown fields are ignored), sensible defaults for optional
//! fields, and validation of config values.
//!
//! The whitelist lives here because the configuration store owns it; the
//! engine only reads it, once per validation.

mod model;
mod operations;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::Config;
pub use operations::ConfigFileWhitelist;
pub use types::SnapshotSettings;
