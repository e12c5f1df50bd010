//! Local-date helpers. Due dates are stored as epoch milliseconds at local midnight.

use chrono::{Local, NaiveDate, TimeZone, Utc};

const INPUT_FORMAT: &str = "%Y-%m-%d";

/// Current time as epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parses `YYYY-MM-DD` into local midnight. Empty or malformed input yields `None`.
pub fn parse_date_local(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let date = NaiveDate::parse_from_str(raw, INPUT_FORMAT).ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

/// Formats epoch milliseconds as a local `YYYY-MM-DD`.
pub fn to_date_input(ms: i64) -> String {
    match Local.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format(INPUT_FORMAT).to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_through_input_format() {
        let ms = parse_date_local("2024-03-09").unwrap();
        assert_eq!(to_date_input(ms), "2024-03-09");
    }

    #[test]
    fn test_parse_lands_on_local_midnight() {
        let ms = parse_date_local("2024-03-09").unwrap();
        let dt = Local.timestamp_millis_opt(ms).single().unwrap();
        assert_eq!(dt.format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_date_local(""), None);
        assert_eq!(parse_date_local("   "), None);
        assert_eq!(parse_date_local("tomorrow"), None);
        assert_eq!(parse_date_local("2024-13-40"), None);
    }
}
