//! Human-readable size strings.
//!
//! Sizes use binary multiples (1 KB = 1024 B). Both the long form emitted by
//! planners (`10.5 GB`) and the single-letter suffixes printed by `df -h`
//! and `du -sh` (`228Gi`, `512M`) are accepted.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Bytes in one binary gigabyte.
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*([kmgt])?(?:i?b)?").expect("size regex is valid")
});

/// Parse a size string into a byte count.
///
/// Unrecognized input yields `0` and a warning; accounting downstream must
/// still be able to complete.
///
/// # Example
///
/// ```ignore
/// assert_eq!(parse("1 KB"), 1024);
/// assert_eq!(parse("garbage"), 0);
/// ```
pub fn parse(text: &str) -> u64 {
    try_parse(text).unwrap_or_else(|| {
        warn!(input = %text, "unrecognized size string, treating as 0 bytes");
        0
    })
}

/// Parse a size string, returning `None` instead of warning when it has no
/// recognizable `<number><unit>`.
///
/// Used where the caller has a fallback for unmeasurable values.
pub fn try_parse(text: &str) -> Option<u64> {
    let caps = SIZE_RE.captures(text)?;
    let value: f64 = caps[1].parse().ok()?;

    let exponent = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        None => 0,
        Some(prefix) => match prefix.as_str() {
            "K" => 1,
            "M" => 2,
            "G" => 3,
            _ => 4,
        },
    };

    Some((value * 1024f64.powi(exponent)).round() as u64)
}

/// Format a byte count using the largest unit whose value is at least 1,
/// always with one decimal place.
pub fn format(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Convert a byte count to binary gigabytes.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}

/// Convert binary gigabytes to a byte count, clamping negatives to zero.
pub fn gb_to_bytes(gb: f64) -> u64 {
    if gb.is_finite() && gb > 0.0 {
        (gb * BYTES_PER_GB).round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fractional_gigabytes() {
        let expected = 10.5 * BYTES_PER_GB;
        assert!((parse("10.5 GB") as f64 - expected).abs() < 1.0);
    }

    #[test]
    fn parse_is_case_insensitive_and_whitespace_tolerant() {
        assert_eq!(parse("512mb"), 512 * 1024 * 1024);
        assert_eq!(parse("512 Mb"), 512 * 1024 * 1024);
        assert_eq!(parse("2TB"), 2 * 1024u64.pow(4));
        assert_eq!(parse("7 KB"), 7 * 1024);
        assert_eq!(parse("0 B"), 0);
        assert_eq!(parse("300B"), 300);
    }

    #[test]
    fn parses_df_style_suffixes() {
        assert_eq!(parse("228Gi"), 228 * 1024u64.pow(3));
        assert_eq!(parse("11G"), 11 * 1024u64.pow(3));
        assert_eq!(parse("640K"), 640 * 1024);
    }

    #[test]
    fn parses_approximate_markers() {
        assert_eq!(parse("~2.0GB"), 2 * 1024u64.pow(3));
    }

    #[test]
    fn unrecognized_input_is_zero() {
        assert_eq!(parse("unknown"), 0);
        assert_eq!(parse(""), 0);
        assert_eq!(parse("system snapshot"), 0);
    }

    #[test]
    fn try_parse_distinguishes_missing_sizes_from_zero() {
        assert_eq!(try_parse("0 B"), Some(0));
        assert_eq!(try_parse("Total: 3.5 GB"), Some(3_758_096_384));
        assert_eq!(try_parse("system snapshot"), None);
    }

    #[test]
    fn format_selects_largest_unit() {
        assert_eq!(format(0), "0.0 B");
        assert_eq!(format(1023), "1023.0 B");
        assert_eq!(format(1024), "1.0 KB");
        assert_eq!(format(1536 * 1024 * 1024), "1.5 GB");
        assert_eq!(format(3 * 1024u64.pow(4)), "3.0 TB");
    }

    #[test]
    fn format_caps_at_terabytes() {
        assert_eq!(format(2048 * 1024u64.pow(4)), "2048.0 TB");
    }

    #[test]
    fn representative_sizes_round_trip() {
        for input in ["512 MB", "2 TB", "0 B", "10.5 GB"] {
            let bytes = parse(input);
            assert_eq!(parse(&format(bytes)), bytes, "round trip of {input}");
        }
        assert_eq!(format(parse("512 MB")), "512.0 MB");
        assert_eq!(format(parse("2 TB")), "2.0 TB");
        assert_eq!(format(parse("0 B")), "0.0 B");
    }

    #[test]
    fn gigabyte_conversions() {
        assert_eq!(bytes_to_gb(1024u64.pow(3)), 1.0);
        assert_eq!(gb_to_bytes(1.5), 1536 * 1024 * 1024);
        assert_eq!(gb_to_bytes(-3.0), 0);
        assert_eq!(gb_to_bytes(f64::NAN), 0);
    }
}
