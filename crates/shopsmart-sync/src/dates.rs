//! Lenient date parsing for date-like attributes.
//!
//! Accepts calendar dates (`2025-06-22`), RFC 3339 timestamps and naive
//! `YYYY-MM-DDTHH:MM[:SS]` timestamps. Anything else, including the empty
//! string, is treated as "no date".

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse a date-like attribute value
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Check whether a non-empty value parses
#[inline]
#[must_use]
pub fn is_valid_date(raw: &str) -> bool {
    parse_date(raw).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_calendar_dates() {
        let parsed = parse_date("2025-06-22").unwrap();
        assert_eq!(parsed.to_string(), "2025-06-22 00:00:00");
    }

    #[test]
    fn parses_timestamps() {
        assert!(parse_date("2025-06-22T10:30:00Z").is_some());
        assert!(parse_date("2025-06-22T10:30:00+02:00").is_some());
        assert!(parse_date("2025-06-22T10:30").is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_date("").is_none());
        assert!(parse_date("   ").is_none());
        assert!(parse_date("next tuesday").is_none());
        assert!(parse_date("2025-13-45").is_none());
    }

    #[test]
    fn orders_chronologically() {
        let earlier = parse_date("2024-01-15").unwrap();
        let later = parse_date("2025-06-22").unwrap();
        assert!(earlier < later);
    }
}
