use chrono::{DateTime, NaiveDate};

/// Parse a date out of the loosely formatted strings remote sources emit:
/// RFC 3339 timestamps, bare ISO dates, or a couple of common site formats.
/// Returns `None` rather than erroring; callers substitute their own default.
pub fn parse_date_loose(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    // ESPN scoreboard style: 2025-09-01T18:00Z
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%MZ") {
        return Some(dt.date());
    }
    for format in ["%Y-%m-%d", "%Y%m%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_iso() {
        let expected = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        assert_eq!(parse_date_loose("2025-09-01T18:00:00Z"), Some(expected));
        assert_eq!(parse_date_loose("2025-09-01T18:00Z"), Some(expected));
        assert_eq!(parse_date_loose("2025-09-01"), Some(expected));
        assert_eq!(parse_date_loose("20250901"), Some(expected));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_date_loose(""), None);
        assert_eq!(parse_date_loose("next Tuesday"), None);
    }
}
