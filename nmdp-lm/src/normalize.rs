//! Field normalization
//!
//! Pure, total functions that coerce legacy field representations into
//! target-typed values. None of these return errors: unparseable input
//! degrades to the neutral value (`false`, `None`, empty list) and the
//! caller supplies any fallback.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Affirmative tokens accepted by the legacy exports. `tak` is the
/// localized form the original platform used alongside the English ones.
const TRUE_TOKENS: [&str; 4] = ["yes", "tak", "true", "1"];

/// Legacy boolean: true iff the trimmed value case-insensitively matches
/// one of the known affirmative tokens. Absent is false.
pub fn normalize_boolean(raw: Option<&str>) -> bool {
    match raw {
        Some(value) => {
            let token = value.trim();
            TRUE_TOKENS.iter().any(|t| token.eq_ignore_ascii_case(t))
        }
        None => false,
    }
}

/// Legacy date string to UTC timestamp.
///
/// One deterministic attempt chain: RFC 3339, then `%Y-%m-%d %H:%M:%S`,
/// then a bare `%Y-%m-%d` (midnight). Any failure yields `None`.
pub fn normalize_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let value = raw?.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    None
}

/// Delimited multi-value string: split, trim, drop empties
pub fn normalize_multi_value(raw: &str, delimiter: char) -> Vec<String> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Natural-key normalization: trim and lowercase.
///
/// Applied uniformly to every key on both lookup and registration so the
/// identity registry cannot fragment on casing or whitespace.
pub fn normalize_identity_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn boolean_accepts_known_tokens() {
        for token in ["yes", "YES", " Tak ", "true", "1"] {
            assert!(normalize_boolean(Some(token)), "{token:?} should be true");
        }
    }

    #[test]
    fn boolean_rejects_everything_else() {
        for token in ["no", "nie", "0", "", "  ", "y", "2", "yes please"] {
            assert!(!normalize_boolean(Some(token)), "{token:?} should be false");
        }
        assert!(!normalize_boolean(None));
    }

    #[test]
    fn date_parses_rfc3339() {
        let dt = normalize_date(Some("2019-04-02T10:30:00Z")).expect("parse");
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn date_parses_legacy_formats() {
        assert!(normalize_date(Some("2019-04-02 10:30:00")).is_some());
        assert!(normalize_date(Some("2019-04-02")).is_some());
    }

    #[test]
    fn date_failure_is_none_not_error() {
        assert_eq!(normalize_date(Some("02.04.2019")), None);
        assert_eq!(normalize_date(Some("soon")), None);
        assert_eq!(normalize_date(Some("")), None);
        assert_eq!(normalize_date(None), None);
    }

    #[test]
    fn multi_value_drops_empties() {
        assert_eq!(
            normalize_multi_value("gluten; lactose ; ;nuts", ';'),
            vec!["gluten", "lactose", "nuts"]
        );
        assert!(normalize_multi_value("  ", ';').is_empty());
    }

    #[test]
    fn identity_key_is_case_and_whitespace_insensitive() {
        assert_eq!(normalize_identity_key("A@B.com"), "a@b.com");
        assert_eq!(normalize_identity_key(" a@b.com "), "a@b.com");
        assert_eq!(normalize_identity_key("a@b.com"), "a@b.com");
    }
}
