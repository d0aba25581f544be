//! Human-readable durations and timestamps.

use chrono::{DateTime, Duration, Utc};

/// Format a job duration as `MMm SSs` (minutes keep growing past an hour).
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.num_seconds().max(0);
    format!("{:02}m {:02}s", seconds / 60, seconds % 60)
}

/// Relative time such as "3 minutes ago".
pub fn time_ago(when: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - when).num_seconds();
    if seconds < 60 {
        return "less than a minute ago".to_string();
    }

    let (value, unit) = if seconds < 3600 {
        (seconds / 60, "minute")
    } else if seconds < 86_400 {
        (seconds / 3600, "hour")
    } else {
        (seconds / 86_400, "day")
    };

    if value == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", value, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(0)), "00m 00s");
        assert_eq!(format_duration(Duration::seconds(65)), "01m 05s");
        assert_eq!(format_duration(Duration::seconds(3725)), "62m 05s");
        assert_eq!(format_duration(Duration::seconds(-4)), "00m 00s");
    }

    #[test]
    fn test_time_ago() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(time_ago(now - Duration::seconds(30), now), "less than a minute ago");
        assert_eq!(time_ago(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(time_ago(now - Duration::minutes(42), now), "42 minutes ago");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(time_ago(now - Duration::days(2), now), "2 days ago");
    }
}
