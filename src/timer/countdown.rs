// Countdown display helpers
// Pure observation of the armed timer; the stop itself is driven by the engine tick

use std::time::Duration;

use chrono::{DateTime, Local};

/// Format remaining time as "M:SS"; minutes are not capped at an hour
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

/// Wall-clock instant the armed timer will stop at, for display
pub fn end_clock(remaining: Duration) -> DateTime<Local> {
    Local::now() + chrono::Duration::from_std(remaining).unwrap_or_else(|_| chrono::Duration::zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_remaining(Duration::from_secs(0)), "0:00");
        assert_eq!(format_remaining(Duration::from_secs(5)), "0:05");
        assert_eq!(format_remaining(Duration::from_secs(90)), "1:30");
        assert_eq!(format_remaining(Duration::from_secs(600)), "10:00");
    }

    #[test]
    fn long_timers_keep_counting_in_minutes() {
        // 2h05m -> 125 minutes, matching the player's countdown style
        assert_eq!(format_remaining(Duration::from_secs(125 * 60 + 9)), "125:09");
    }
}
