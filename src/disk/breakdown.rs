//! Read-only storage breakdown: how much space the usual cleanup locations
//! hold, plus the largest files under the home directory.
//!
//! Every location is probed with `du -sh` and the large-file search with
//! `find`, all at once on scoped threads. A location that cannot be measured
//! is reported as unmeasured instead of as zero.

use crate::exec::CommandExecutor;
use crate::size;
use serde::Serialize;
use std::fmt;
use std::thread;
use tracing::{debug, warn};

/// Files at least this large are listed.
pub const LARGE_FILE_MIN_MB: u64 = 100;
/// At most this many large files are listed.
pub const LARGE_FILE_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageCategory {
    Caches,
    Downloads,
    Trash,
    Logs,
    Temp,
}

impl StorageCategory {
    pub const ALL: [StorageCategory; 5] = [
        StorageCategory::Caches,
        StorageCategory::Downloads,
        StorageCategory::Trash,
        StorageCategory::Logs,
        StorageCategory::Temp,
    ];

    /// Locations summed into this category.
    pub fn paths(self) -> &'static [&'static str] {
        match self {
            StorageCategory::Caches => &["~/Library/Caches"],
            StorageCategory::Downloads => &["~/Downloads"],
            StorageCategory::Trash => &["~/.Trash"],
            StorageCategory::Logs => &["~/Library/Logs", "/var/log"],
            StorageCategory::Temp => &["/tmp", "/var/tmp"],
        }
    }
}

impl fmt::Display for StorageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageCategory::Caches => "caches",
            StorageCategory::Downloads => "downloads",
            StorageCategory::Trash => "trash",
            StorageCategory::Logs => "logs",
            StorageCategory::Temp => "temp",
        };
        f.write_str(name)
    }
}

/// Measured size of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySize {
    pub category: StorageCategory,
    /// Sum over the measured paths.
    pub bytes: u64,
    /// `bytes` formatted for display.
    pub size: String,
    /// Paths whose probe failed or printed no size.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmeasured: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageBreakdown {
    pub categories: Vec<CategorySize>,
    /// Paths of files of at least [`LARGE_FILE_MIN_MB`], at most [`LARGE_FILE_LIMIT`].
    pub large_files: Vec<String>,
}

impl StorageBreakdown {
    /// Bytes across every category.
    pub fn total_bytes(&self) -> u64 {
        self.categories.iter().map(|c| c.bytes).sum()
    }
}

/// Command measuring one location.
fn du_command(path: &str) -> String {
    format!("du -sh {} 2>/dev/null", path)
}

/// Command listing large files under the home directory.
fn large_files_command() -> String {
    format!(
        "find ~ -type f -size +{}M 2>/dev/null | head -{}",
        LARGE_FILE_MIN_MB, LARGE_FILE_LIMIT
    )
}

/// Measure every category and search for large files concurrently.
///
/// Output order follows [`StorageCategory::ALL`].
pub fn collect_breakdown(executor: &(dyn CommandExecutor + Sync)) -> StorageBreakdown {
    thread::scope(|scope| {
        let large = scope.spawn(|| large_files(executor));
        let handles: Vec<_> = StorageCategory::ALL
            .iter()
            .map(|&category| (category, scope.spawn(move || measure_category(executor, category))))
            .collect();

        let categories = handles
            .into_iter()
            .map(|(category, handle)| {
                handle.join().unwrap_or_else(|_| {
                    warn!(%category, "category probe panicked");
                    CategorySize {
                        category,
                        bytes: 0,
                        size: size::format(0),
                        unmeasured: category.paths().iter().map(|p| p.to_string()).collect(),
                    }
                })
            })
            .collect();

        let large_files = large.join().unwrap_or_else(|_| {
            warn!("large file search panicked");
            Vec::new()
        });

        StorageBreakdown {
            categories,
            large_files,
        }
    })
}

fn measure_category(executor: &dyn CommandExecutor, category: StorageCategory) -> CategorySize {
    let mut bytes = 0;
    let mut unmeasured = Vec::new();

    for path in category.paths() {
        match measure_path(executor, path) {
            Some(b) => bytes += b,
            None => unmeasured.push(path.to_string()),
        }
    }

    debug!(%category, bytes, unmeasured = unmeasured.len(), "measured category");
    CategorySize {
        category,
        bytes,
        size: size::format(bytes),
        unmeasured,
    }
}

/// Size from the first field of `du -sh` output.
fn measure_path(executor: &dyn CommandExecutor, path: &str) -> Option<u64> {
    let output = match executor.execute(&du_command(path)) {
        Ok(output) => output,
        Err(e) => {
            debug!(path, error = %e, "location not measured");
            return None;
        }
    };
    output.split_whitespace().next().and_then(size::try_parse)
}

fn large_files(executor: &dyn CommandExecutor) -> Vec<String> {
    match executor.execute(&large_files_command()) {
        Ok(output) => output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(LARGE_FILE_LIMIT)
            .map(str::to_string)
            .collect(),
        Err(e) => {
            warn!(error = %e, "large file search failed");
            Vec::new()
        }
    }
}
