//! Human-readable play time and date strings.

use chrono::{DateTime, TimeZone, Utc};

/// Play time shown in the ROM library, from whole minutes.
///
/// Under two hours the total is shown in minutes; from two hours on it is
/// split into hours and remaining minutes.
pub fn format_time_played(total_minutes: i64) -> String {
    if total_minutes <= 0 {
        return "Less than a minute".to_string();
    }

    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    match (hours >= 2, minutes > 0) {
        (true, true) => format!("{hours} hours {minutes} minutes"),
        (true, false) => format!("{hours} hours"),
        (false, _) => format!("{total_minutes} minutes"),
    }
}

/// Play time stored in a save-state header, in seconds.
pub fn format_slot_time_played(seconds: f64) -> String {
    let total_minutes = (seconds.max(0.0) / 60.0) as i64;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    match (hours, minutes) {
        (0, m) => format!("{m} minutes"),
        (h, 0) => format!("{h} hours"),
        (h, m) => format!("{h} hours {m} minutes"),
    }
}

/// `yyyy/MM/dd` for a header's Unix-seconds timestamp.
pub fn format_slot_date<Tz: TimeZone>(unix_seconds: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match DateTime::<Utc>::from_timestamp(unix_seconds, 0) {
        Some(dt) => dt.with_timezone(tz).format("%Y/%m/%d").to_string(),
        None => "Unknown".to_string(),
    }
}

/// `dd/MM/yyyy` for the library's last-played column.
pub fn format_last_played<Tz: TimeZone>(last_played: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    last_played.with_timezone(tz).format("%d/%m/%Y").to_string()
}
