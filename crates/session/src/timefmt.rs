//! Local-time formatting for log lines and file names.

use chrono::{DateTime, Local};

fn local(unix_ms: i64) -> Option<DateTime<Local>> {
    DateTime::from_timestamp_millis(unix_ms).map(|t| t.with_timezone(&Local))
}

/// `14.10.2026 18:03:11.274`
pub fn log_timestamp(unix_ms: i64) -> String {
    match local(unix_ms) {
        Some(t) => t.format("%d.%m.%Y %H:%M:%S%.3f").to_string(),
        None => unix_ms.to_string(),
    }
}

/// `14-10-2026 18-03-11`
pub fn file_timestamp(unix_ms: i64) -> String {
    match local(unix_ms) {
        Some(t) => t.format("%d-%m-%Y %H-%M-%S").to_string(),
        None => unix_ms.to_string(),
    }
}

/// `01:02:03.004`. Negative durations clamp to zero.
pub fn duration(ms: i64) -> String {
    let ms = ms.max(0);
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        ms / 3_600_000,
        ms / 60_000 % 60,
        ms / 1000 % 60,
        ms % 1000
    )
}
