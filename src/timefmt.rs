use chrono::{DateTime, Local, Utc};

/// Format a UTC timestamp in the local timezone.
pub fn format_datetime(datetime: &DateTime<Utc>) -> String {
    datetime
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Format an optional timestamp, using '-' when missing.
pub fn format_datetime_opt(datetime: Option<&DateTime<Utc>>) -> String {
    datetime.map(format_datetime).unwrap_or_else(|| "-".to_string())
}

/// Format a UTC timestamp as UTC, for reports shared across timezones.
pub fn format_utc(datetime: &DateTime<Utc>) -> String {
    datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_utc() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(format_utc(&ts), "2024-03-09 07:05:00 UTC");
    }

    #[test]
    fn test_missing_timestamp() {
        assert_eq!(format_datetime_opt(None), "-");
    }
}
