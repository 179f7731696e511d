//! Time and timestamp utilities

use chrono::Utc;

/// Current Unix timestamp in seconds
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Render a number of seconds as `HH:MM:SS`
///
/// Hours are not wrapped at 24, so long-running totals stay readable:
/// `90061` renders as `25:01:01`.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}
