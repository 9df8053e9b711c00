//! Disk usage probe collaborator.

use super::DiskInfo;
use crate::error::{ReclaimError, Result};
use crate::exec::CommandExecutor;
use tracing::debug;

/// Source of raw disk usage reports.
pub trait DiskProbe {
    /// Return the usage report text (header line plus data line).
    fn usage_report(&self) -> Result<String>;
}

impl<T: DiskProbe + ?Sized> DiskProbe for &T {
    fn usage_report(&self) -> Result<String> {
        (**self).usage_report()
    }
}

/// Probe that obtains the report by running a command (default `df -h /`).
#[derive(Debug, Clone)]
pub struct CommandDiskProbe<E> {
    executor: E,
    command: String,
}

impl<E: CommandExecutor> CommandDiskProbe<E> {
    pub fn new(executor: E, command: impl Into<String>) -> Self {
        Self {
            executor,
            command: command.into(),
        }
    }
}

impl<E: CommandExecutor> DiskProbe for CommandDiskProbe<E> {
    fn usage_report(&self) -> Result<String> {
        self.executor.execute(&self.command).map_err(|e| {
            ReclaimError::MeasurementParse(format!("usage probe '{}' failed: {}", self.command, e))
        })
    }
}

/// Take one measurement and parse it.
pub fn measure(probe: &dyn DiskProbe) -> Result<DiskInfo> {
    let report = probe.usage_report()?;
    let info = DiskInfo::parse(&report)?;
    debug!(
        total = %info.total,
        used = %info.used,
        available = %info.available,
        usage_percentage = info.usage_percentage,
        "measured disk usage"
    );
    Ok(info)
}
