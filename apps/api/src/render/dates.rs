use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const PRESENT: &str = "Present";
pub const INVALID_DATE: &str = "Invalid date";

/// Renders a stored date as "January 2020".
///
/// Absent or blank input means an ongoing period and renders as "Present".
/// Anything unparseable renders as "Invalid date". Never fails.
pub fn format_month_year(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return PRESENT.to_string();
    };
    match parse_date(raw) {
        Some(date) => date.format("%B %Y").to_string(),
        None => INVALID_DATE.to_string(),
    }
}

/// "January 2020 - Present"
pub fn format_range(start: Option<&str>, end: Option<&str>) -> String {
    format!("{} - {}", format_month_year(start), format_month_year(end))
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS[.fff]`, `YYYY-MM-DD` and `YYYY-MM`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.date());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_end_date_is_present() {
        assert_eq!(format_month_year(None), "Present");
        assert_eq!(format_month_year(Some("  ")), "Present");
    }

    #[test]
    fn test_iso_date_renders_month_year() {
        assert_eq!(format_month_year(Some("2020-01-15")), "January 2020");
        assert_eq!(format_month_year(Some("2019-11")), "November 2019");
        assert_eq!(
            format_month_year(Some("2021-03-01T00:00:00.000Z")),
            "March 2021"
        );
        assert_eq!(
            format_month_year(Some("2018-07-04T09:30:00")),
            "July 2018"
        );
    }

    #[test]
    fn test_malformed_date_is_placeholder() {
        assert_eq!(format_month_year(Some("not a date")), "Invalid date");
        assert_eq!(format_month_year(Some("2020-13-01")), "Invalid date");
        assert_eq!(format_month_year(Some("2020-02-30")), "Invalid date");
    }

    #[test]
    fn test_range_formatting() {
        assert_eq!(
            format_range(Some("2020-01-01"), None),
            "January 2020 - Present"
        );
    }
}
