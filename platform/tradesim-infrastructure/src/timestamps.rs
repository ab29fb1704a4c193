use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, bare dates and epoch seconds.
pub(crate) fn parse_timestamp(value: &str) -> Result<i64, String> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%z") {
        return Ok(dt.timestamp());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive).timestamp());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(start_of_day(date));
    }
    if let Ok(epoch) = value.parse::<i64>() {
        return Ok(epoch);
    }

    Err(format!("unsupported timestamp format: {}", value))
}

pub(crate) fn start_of_day(date: NaiveDate) -> i64 {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).timestamp()
}

/// Inclusive `[from 00:00:00, to 23:59:59]` window in epoch seconds.
pub(crate) fn day_window(from: NaiveDate, to: NaiveDate) -> (i64, i64) {
    (start_of_day(from), start_of_day(to) + 86_399)
}
