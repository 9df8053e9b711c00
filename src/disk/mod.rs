//! Disk usage measurement.
//!
//! A [`DiskProbe`] returns the raw usage report (the output of `df -h /`);
//! [`DiskInfo::parse`] reads it positionally. Parsing fails fast rather
//! than defaulting, because a guessed measurement would make the freed-space
//! figure of a cleanup run meaningless.

mod breakdown;
mod probe;

pub use breakdown::{LARGE_FILE_MIN_MB, StorageBreakdown, collect_breakdown};
pub use probe::{CommandDiskProbe, DiskProbe, measure};

use crate::error::{ReclaimError, Result};
use serde::{Deserialize, Serialize};

/// Minimum columns in a usage report data row:
/// filesystem, size, used, available, use%, mount point.
const MIN_FIELDS: usize = 6;

/// Point-in-time snapshot of a volume's usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub total: String,
    pub used: String,
    pub available: String,
    /// Percentage of the volume in use, 0–100.
    pub usage_percentage: u8,
}

impl DiskInfo {
    /// Parse a fixed-column usage report.
    ///
    /// The first line is the header; the second line carries the data.
    pub fn parse(report: &str) -> Result<Self> {
        let mut lines = report.trim().lines();
        let _header = lines.next();
        let data = lines
            .next()
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| {
                ReclaimError::MeasurementParse("usage report has no data line".to_string())
            })?;

        let fields: Vec<&str> = data.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            return Err(ReclaimError::MeasurementParse(format!(
                "expected at least {} fields in usage report, found {}: '{}'",
                MIN_FIELDS,
                fields.len(),
                data.trim()
            )));
        }

        let used = fields[2];
        if crate::size::try_parse(used).is_none() {
            return Err(ReclaimError::MeasurementParse(format!(
                "used column '{}' is not a size: '{}'",
                used,
                data.trim()
            )));
        }

        Ok(Self {
            total: fields[1].to_string(),
            used: used.to_string(),
            available: fields[3].to_string(),
            usage_percentage: parse_percentage(fields[4]),
        })
    }

    /// Used space in bytes.
    pub fn used_bytes(&self) -> u64 {
        crate::size::parse(&self.used)
    }
}

fn parse_percentage(field: &str) -> u8 {
    field
        .trim_end_matches('%')
        .parse::<u32>()
        .map(|p| p.min(100) as u8)
        .unwrap_or(0)
}
