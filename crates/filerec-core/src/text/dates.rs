//! Recognition of tokens that read as a date or time expression

use chrono::{Month, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%d.%m.%y", "%m/%d/%Y", "%d/%m/%Y", "%m/%d/%y",
    "%d-%m-%Y",
];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%H.%M"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d.%H:%M"];

const RELATIVE_WORDS: &[&str] = &["today", "tomorrow", "yesterday", "now", "midnight", "noon"];

/// Full weekday and month names only; three-letter abbreviations collide
/// with ordinary words ("sat", "mar", "may" excepted as a full name)
fn is_calendar_name(token: &str) -> bool {
    let lower = token.to_lowercase();
    if lower.len() <= 3 && lower != "may" {
        return false;
    }
    lower.parse::<Weekday>().is_ok() || lower.parse::<Month>().is_ok()
}

/// Whether a single token parses as a date, time or date-time
pub fn is_date_like(token: &str) -> bool {
    if RELATIVE_WORDS
        .iter()
        .any(|w| token.eq_ignore_ascii_case(w))
    {
        return true;
    }
    if is_calendar_name(token) {
        return true;
    }
    if !token.bytes().any(|b| b.is_ascii_digit()) {
        return false;
    }
    DATE_FORMATS
        .iter()
        .any(|f| NaiveDate::parse_from_str(token, f).is_ok())
        || TIME_FORMATS
            .iter()
            .any(|f| NaiveTime::parse_from_str(token, f).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(token, f).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_dates() {
        assert!(is_date_like("2024-01-05"));
        assert!(is_date_like("05.01.2024"));
        assert!(is_date_like("1/5/2024"));
        assert!(is_date_like("2024-01-05T08:15:00"));
    }

    #[test]
    fn test_times() {
        assert!(is_date_like("12:30"));
        assert!(is_date_like("08:15:59"));
        assert!(!is_date_like("25:99"));
    }

    #[test]
    fn test_names_and_relative_words() {
        assert!(is_date_like("Monday"));
        assert!(is_date_like("march"));
        assert!(is_date_like("May"));
        assert!(is_date_like("Tomorrow"));
    }

    #[test]
    fn test_ordinary_words_are_not_dates() {
        assert!(!is_date_like("budget"));
        assert!(!is_date_like("sat"));
        assert!(!is_date_like("v1.2"));
        assert!(!is_date_like("2024-99-99"));
    }
}
