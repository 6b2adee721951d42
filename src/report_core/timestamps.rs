//! Lenient timestamp parsing for the store's TEXT timestamp columns

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 style timestamp.
///
/// Accepts values with an explicit offset (or `Z`), naive date-times and bare
/// dates. Naive values are taken as UTC. Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    let with_offset = match raw.strip_suffix('Z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => raw.to_string(),
    };
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, fmt) {
            return Some(dt);
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

pub fn parse_opt_timestamp(raw: Option<&str>) -> Option<DateTime<FixedOffset>> {
    raw.and_then(parse_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_variants() {
        let dt = parse_timestamp("2025-03-04T10:20:30").unwrap();
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (10, 20, 30));

        let dt = parse_timestamp("2025-03-04 10:20:30.123456").unwrap();
        assert_eq!(dt.day(), 4);

        let dt = parse_timestamp("2025-03-04T23:30:00+03:00").unwrap();
        // Calendar date stays in the timestamp's own offset
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());

        assert!(parse_timestamp("2025-03-04T10:20:30Z").is_some());
        assert!(parse_timestamp("2025-03-04 10:20:30Z").is_some());
        assert!(parse_timestamp("2025-03-04").is_some());
        assert!(parse_timestamp("2025-03-04T10:20").is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2025-13-40").is_none());
        assert!(parse_opt_timestamp(None).is_none());
    }
}
