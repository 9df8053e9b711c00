//! Snapshot size measurement and batch classification.

use super::classify::{classify_name, created_date, parse_snapshot_listing};
use super::types::{SizeConfidence, SnapshotKind, SnapshotRecord};
use crate::config::SnapshotSettings;
use crate::exec::CommandExecutor;
use crate::size;
use regex::Regex;
use std::sync::LazyLock;
use std::thread;
use tracing::{debug, warn};

/// Per-snapshot figure used when the snapshot cannot even be confirmed in
/// the listing.
pub const UNLISTED_ESTIMATE_GB: f64 = 1.5;

const SYSTEM_SNAPSHOT_PLACEHOLDER: &str = "system snapshot";
const UNKNOWN_PLACEHOLDER: &str = "unknown";

/// A size with an explicit unit, so digits inside paths and timestamps
/// are never mistaken for a measurement.
static MEASURED_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(bytes|[KMGT]i?B?|B)\b")
        .expect("Invalid measured size regex")
});

/// Steps of the time-machine size chain, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeStrategy {
    UniqueSize,
    DirectorySize,
    ExperientialEstimate,
}

impl SizeStrategy {
    pub const CHAIN: [SizeStrategy; 3] = [
        SizeStrategy::UniqueSize,
        SizeStrategy::DirectorySize,
        SizeStrategy::ExperientialEstimate,
    ];

    pub fn confidence(self) -> SizeConfidence {
        match self {
            SizeStrategy::UniqueSize => SizeConfidence::Measured,
            SizeStrategy::DirectorySize => SizeConfidence::Approximate,
            SizeStrategy::ExperientialEstimate => SizeConfidence::Estimated,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SizeReading {
    size: String,
    bytes: u64,
    confidence: SizeConfidence,
}

impl SizeReading {
    fn unavailable(placeholder: &str) -> Self {
        Self {
            size: placeholder.to_string(),
            bytes: 0,
            confidence: SizeConfidence::Unavailable,
        }
    }

    fn estimate(gb: f64) -> Self {
        let bytes = size::gb_to_bytes(gb);
        Self {
            size: format!("~{}", size::format(bytes)),
            bytes,
            confidence: SizeConfidence::Estimated,
        }
    }
}

/// Classifies snapshots and measures their sizes through a command executor.
///
/// Probes are read-only, so a batch is measured concurrently.
pub struct SnapshotClassifier<'a> {
    executor: &'a (dyn CommandExecutor + Sync),
    settings: &'a SnapshotSettings,
}

impl<'a> SnapshotClassifier<'a> {
    pub fn new(executor: &'a (dyn CommandExecutor + Sync), settings: &'a SnapshotSettings) -> Self {
        Self { executor, settings }
    }

    /// List and classify every local snapshot.
    ///
    /// A failing listing command means there is nothing to classify.
    pub fn collect(&self) -> Vec<SnapshotRecord> {
        match self.executor.execute(&self.settings.list_command) {
            Ok(output) => self.classify_batch(&parse_snapshot_listing(&output)),
            Err(e) => {
                warn!(error = %e, "snapshot listing failed, reporting no snapshots");
                Vec::new()
            }
        }
    }

    /// Classify many snapshots, probing up to `probe_concurrency` at once.
    ///
    /// Output order matches input order.
    pub fn classify_batch(&self, names: &[String]) -> Vec<SnapshotRecord> {
        let width = self.settings.probe_concurrency.max(1);
        let mut records = Vec::with_capacity(names.len());

        for chunk in names.chunks(width) {
            thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|name| (name, scope.spawn(move || self.classify(name))))
                    .collect();
                for (name, handle) in handles {
                    match handle.join() {
                        Ok(record) => records.push(record),
                        Err(_) => {
                            warn!(snapshot = %name, "snapshot probe panicked, degrading record");
                            records.push(degraded_record(name));
                        }
                    }
                }
            });
        }

        records
    }

    /// Classify one snapshot and measure its size.
    pub fn classify(&self, name: &str) -> SnapshotRecord {
        let kind = classify_name(name);
        let reading = match kind {
            SnapshotKind::SystemUpdate => self
                .directory_size(name)
                .unwrap_or_else(|| SizeReading::unavailable(SYSTEM_SNAPSHOT_PLACEHOLDER)),
            SnapshotKind::TimeMachine => self.time_machine_size(name),
            SnapshotKind::Unknown => self
                .directory_size(name)
                .unwrap_or_else(|| SizeReading::unavailable(UNKNOWN_PLACEHOLDER)),
        };

        debug!(
            snapshot = %name,
            %kind,
            size = %reading.size,
            confidence = ?reading.confidence,
            "classified snapshot"
        );

        SnapshotRecord {
            name: name.to_string(),
            size: reading.size,
            kind,
            is_deletable: kind.is_deletable(),
            created_date: created_date(name),
            estimated_bytes: reading.bytes,
            size_confidence: reading.confidence,
            description: kind.description().to_string(),
        }
    }

    fn time_machine_size(&self, name: &str) -> SizeReading {
        for strategy in SizeStrategy::CHAIN {
            let reading = match strategy {
                SizeStrategy::UniqueSize => self.unique_size(name),
                SizeStrategy::DirectorySize => match self.still_listed(name) {
                    Some(true) => self.directory_size(name),
                    // Gone since the listing was taken.
                    Some(false) => return SizeReading::unavailable(UNKNOWN_PLACEHOLDER),
                    None => return SizeReading::estimate(UNLISTED_ESTIMATE_GB),
                },
                SizeStrategy::ExperientialEstimate => {
                    Some(SizeReading::estimate(self.settings.estimate_gb))
                }
            };
            if let Some(reading) = reading {
                return reading;
            }
        }
        SizeReading::unavailable(UNKNOWN_PLACEHOLDER)
    }

    /// Exact exclusive size from the unique-size command.
    fn unique_size(&self, name: &str) -> Option<SizeReading> {
        let command = self.settings.render(&self.settings.unique_size_command, name);
        let output = self.run_probe(&command)?;

        let lowered = output.to_ascii_lowercase();
        if lowered.contains("error") || lowered.contains("failed") {
            return None;
        }

        let last_line = output.lines().rev().find(|l| !l.trim().is_empty())?;
        let matched = MEASURED_SIZE_RE.find_iter(last_line).last()?;
        let bytes = size::try_parse(matched.as_str())?;
        Some(SizeReading {
            size: size::format(bytes),
            bytes,
            confidence: SizeConfidence::Measured,
        })
    }

    /// Approximate size from a `du -sh` style command.
    fn directory_size(&self, name: &str) -> Option<SizeReading> {
        let command = self.settings.render(&self.settings.directory_size_command, name);
        let output = self.run_probe(&command)?;

        if output.contains("No such file") {
            return None;
        }
        let field = output.split_whitespace().next()?;
        // Bare numbers from `du` are kibibytes.
        let bytes = if field.chars().all(|c| c.is_ascii_digit()) {
            field.parse::<u64>().ok()?.saturating_mul(1024)
        } else {
            size::try_parse(field)?
        };
        Some(SizeReading {
            size: field.to_string(),
            bytes,
            confidence: SizeConfidence::Approximate,
        })
    }

    /// `None` when the listing command itself fails.
    fn still_listed(&self, name: &str) -> Option<bool> {
        match self.executor.execute(&self.settings.list_command) {
            Ok(output) => Some(parse_snapshot_listing(&output).iter().any(|n| n == name)),
            Err(e) => {
                debug!(snapshot = %name, error = %e, "snapshot re-listing failed");
                None
            }
        }
    }

    fn run_probe(&self, command: &str) -> Option<String> {
        match self.executor.execute(command) {
            Ok(output) if !output.trim().is_empty() => Some(output),
            Ok(_) => None,
            Err(e) => {
                debug!(command, error = %e, "snapshot size probe failed");
                None
            }
        }
    }
}

/// Record for a snapshot whose probe could not complete at all.
pub(super) fn degraded_record(name: &str) -> SnapshotRecord {
    let kind = match classify_name(name) {
        SnapshotKind::SystemUpdate => SnapshotKind::SystemUpdate,
        _ => SnapshotKind::Unknown,
    };
    let placeholder = match kind {
        SnapshotKind::SystemUpdate => SYSTEM_SNAPSHOT_PLACEHOLDER,
        _ => UNKNOWN_PLACEHOLDER,
    };
    SnapshotRecord {
        name: name.to_string(),
        size: placeholder.to_string(),
        kind,
        is_deletable: kind.is_deletable(),
        created_date: created_date(name),
        estimated_bytes: 0,
        size_confidence: SizeConfidence::Unavailable,
        description: "Snapshot details could not be retrieved.".to_string(),
    }
}
