/// Formatting utilities: human-readable byte counts and timestamps.
///
/// All internal sizes are `u64` bytes. Floating point is only used
/// at the display-formatting boundary.
use chrono::{DateTime, Local};
use std::time::SystemTime;

/// Shown in place of a timestamp that could not be read.
pub const UNKNOWN_TIMESTAMP: &str = "??:??:?? ??.??.??";

/// Format a byte count into a human-readable string.
///
/// Binary units (1024) with lowercase labels and one decimal, rounded half
/// away from zero. Picks the largest of b/kb/mb/gb whose value is at least 1;
/// anything under 1024 bytes is printed as a whole number of bytes.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        return format!("{bytes} b");
    }
    let (divisor, unit) = if bytes < MB {
        (KB, "kb")
    } else if bytes < GB {
        (MB, "mb")
    } else {
        (GB, "gb")
    };

    // `{:.1}` alone rounds ties to even; round explicitly first.
    let scaled = (bytes as f64 / divisor as f64 * 10.0).round() / 10.0;
    format!("{scaled:.1} {unit}")
}

/// Format a file count with thousand separators.
pub fn format_count(count: u64) -> String {
    if count < 1_000 {
        return count.to_string();
    }
    let s = count.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Format a timestamp in local time as `HH:MM:SS dd.mm.yy`.
pub fn format_timestamp(time: Option<SystemTime>) -> String {
    match time {
        Some(time) => DateTime::<Local>::from(time)
            .format("%H:%M:%S %d.%m.%y")
            .to_string(),
        None => UNKNOWN_TIMESTAMP.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_bytes() {
        assert_eq!(format_size(0), "0 b");
        assert_eq!(format_size(512), "512 b");
        assert_eq!(format_size(1023), "1023 b");
    }

    #[test]
    fn test_format_size_kb() {
        assert_eq!(format_size(1024), "1.0 kb");
        assert_eq!(format_size(1536), "1.5 kb");
        assert_eq!(format_size(782_634), "764.3 kb");
    }

    #[test]
    fn test_format_size_rounds_half_away_from_zero() {
        // 1280 / 1024 = 1.25 exactly.
        assert_eq!(format_size(1280), "1.3 kb");
    }

    #[test]
    fn test_format_size_mb() {
        assert_eq!(format_size(1_048_576), "1.0 mb");
        assert_eq!(format_size(5 * 1_048_576 + 524_288), "5.5 mb");
    }

    #[test]
    fn test_format_size_gb() {
        assert_eq!(format_size(1_073_741_824), "1.0 gb");
        // No terabyte unit: large values stay in gb.
        assert_eq!(format_size(1_099_511_627_776), "1024.0 gb");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_timestamp_missing() {
        assert_eq!(format_timestamp(None), UNKNOWN_TIMESTAMP);
    }

    #[test]
    fn test_format_timestamp_shape() {
        let text = format_timestamp(Some(SystemTime::now()));
        assert_eq!(text.len(), "00:00:00 01.01.24".len());
        assert_eq!(&text[2..3], ":");
        assert_eq!(&text[11..12], ".");
    }
}
