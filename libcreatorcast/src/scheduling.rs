//! Scheduling and time parsing utilities
//!
//! Turns the human-readable time a creator types into a UTC instant. Whether
//! that instant is in the future is the scheduler's call, not the parser's.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};

use crate::error::{CreatorcastError, Result};

/// Parse a schedule string into a DateTime
///
/// Supports:
/// - RFC 3339: "2025-11-20T15:00:00Z"
/// - Absolute UTC: "2025-11-20 15:00"
/// - Relative durations: "1h", "+30m", "2 days"
/// - Natural language: "tomorrow", "next monday 10am"
pub fn parse_schedule(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CreatorcastError::Validation(
            "Schedule time cannot be empty".to_string(),
        ));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    if let Ok(duration) = parse_duration(input.strip_prefix('+').unwrap_or(input)) {
        return Ok(now + duration);
    }

    chrono_english::parse_date_string(input, now, chrono_english::Dialect::Us).map_err(|_| {
        CreatorcastError::Validation(format!(
            "Could not parse schedule time '{}'. Try '2h', '2025-11-20 15:00' or 'tomorrow'",
            input
        ))
    })
}

fn parse_duration(input: &str) -> Result<Duration> {
    let std_duration = humantime::parse_duration(input)
        .map_err(|e| CreatorcastError::Validation(format!("Could not parse duration: {}", e)))?;

    Duration::from_std(std_duration)
        .map_err(|_| CreatorcastError::Validation("Duration out of range".to_string()))
}

/// Describe how far away a timestamp is, e.g. "in 2h 15m" or "overdue"
pub fn format_time_until(scheduled_at: i64, now: i64) -> String {
    let diff = scheduled_at - now;
    if diff <= 0 {
        return "overdue".to_string();
    }

    let days = diff / 86_400;
    let hours = (diff % 86_400) / 3600;
    let minutes = (diff % 3600) / 60;

    if days > 0 {
        format!("in {}d {}h", days, hours)
    } else if hours > 0 {
        format!("in {}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("in {}m", minutes)
    } else {
        "in <1m".to_string()
    }
}
