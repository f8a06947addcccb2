use chrono::{Local, TimeZone};

/// Render an uptime in seconds: `-` for zero, `Xd Yh Zm` past a day, else `Yh Zm`.
pub fn format_uptime(seconds: u64) -> String {
    if seconds == 0 {
        return "-".to_string();
    }
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else {
        format!("{}h {}m", hours, minutes)
    }
}

/// Render a unix timestamp in local time, `-` when absent or invalid.
pub fn format_unix_timestamp(ts: Option<i64>) -> String {
    ts.and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Bytes to GiB with one decimal, as shown in the tables.
pub fn bytes_to_gib(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 / 1024.0 / 1024.0 * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime_zero() {
        assert_eq!(format_uptime(0), "-");
    }

    #[test]
    fn test_format_uptime_hours() {
        assert_eq!(format_uptime(3_660), "1h 1m");
        assert_eq!(format_uptime(59), "0h 0m");
    }

    #[test]
    fn test_format_uptime_days() {
        assert_eq!(format_uptime(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5), "2d 3h 4m");
    }

    #[test]
    fn test_format_unix_timestamp() {
        assert_eq!(format_unix_timestamp(None), "-");
        let ts = format_unix_timestamp(Some(1_700_000_000));
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[13..14], ":");
    }

    #[test]
    fn test_bytes_to_gib() {
        assert_eq!(bytes_to_gib(0), 0.0);
        assert_eq!(bytes_to_gib(4 * 1024 * 1024 * 1024), 4.0);
        assert_eq!(bytes_to_gib(1_610_612_736), 1.5);
    }
}
