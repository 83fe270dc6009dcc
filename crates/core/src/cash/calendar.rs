//! Business-date resolution.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Calendar date of `now` in the branch's time zone.
#[must_use]
pub fn business_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Parses an IANA time zone name such as `America/Guayaquil`.
pub fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| format!("Invalid time zone '{name}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_business_date_crosses_midnight_west_of_utc() {
        // 03:30 UTC is still the previous evening in Guayaquil (UTC-5).
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 3, 30, 0).unwrap();
        let tz = parse_timezone("America/Guayaquil").unwrap();
        assert_eq!(
            business_date(now, tz),
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
        );
        assert_eq!(
            business_date(now, Tz::UTC),
            NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_parse_timezone_rejects_unknown_names() {
        assert!(parse_timezone("Mars/Olympus").is_err());
        assert_eq!(parse_timezone(" UTC ").unwrap(), Tz::UTC);
    }
}
