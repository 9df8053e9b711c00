//! Freed-space accounting.

use crate::disk::DiskInfo;
use crate::size;

/// Space freed between two measurements, in binary gigabytes.
///
/// Usage that grew during the batch counts as nothing freed rather than a
/// negative amount.
pub fn freed_gb(before: &DiskInfo, after: &DiskInfo) -> f64 {
    let freed = before.used_bytes().saturating_sub(after.used_bytes());
    size::bytes_to_gb(freed)
}
