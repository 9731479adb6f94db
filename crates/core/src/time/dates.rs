use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const OFFSET_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
];

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a user- or file-supplied ISO-8601 date/time into a UTC timestamp.
///
/// Accepts RFC 3339 and other offset forms (`Z`, `+hh`, `+hhmm`, `+hh:mm`,
/// normalized to UTC), naive date-times down to hour precision which are
/// taken as UTC, and bare `YYYY-MM-DD` / `YYYYMMDD` dates (midnight UTC).
pub fn parse_query_date(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    parse_hour_only(s)
        .or_else(|| parse_day(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
        .map(|naive| naive.and_utc())
}

/// `YYYY-MM-DDTHH` (or with a space separator).
fn parse_hour_only(s: &str) -> Option<NaiveDateTime> {
    let (day, hour) = s.split_once(['T', ' '])?;
    if hour.len() != 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(hour.parse().ok()?, 0, 0)
}

/// Extended `YYYY-MM-DD` or basic `YYYYMMDD`.
fn parse_day(s: &str) -> Option<NaiveDate> {
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = s[0..4].parse().ok()?;
        let month = s[4..6].parse().ok()?;
        let day = s[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

pub fn format_day(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}
