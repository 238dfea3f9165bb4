//! Date of birth normalization.

use super::patterns::{date_patterns, NON_DATE_CHARS};

/// Normalize raw OCR text into a date of birth.
///
/// Only digits, `/` and `-` are kept. The first match of `DD/MM/YYYY`,
/// `DD/MM/YY` or a four-digit year wins and is returned with `/`
/// separators. Text matching none of these is returned cleaned, since cards
/// sometimes carry partial dates.
pub fn normalize_dob(text: &str) -> Option<String> {
    let cleaned = NON_DATE_CHARS.replace_all(text, "");

    if cleaned.is_empty() {
        return None;
    }

    for pattern in date_patterns() {
        if let Some(m) = pattern.find(&cleaned) {
            return Some(m.as_str().replace('-', "/"));
        }
    }

    Some(cleaned.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_dates() {
        assert_eq!(normalize_dob("DOB: 12/05/1990"), Some("12/05/1990".to_string()));
        assert_eq!(normalize_dob("12-05-1990"), Some("12/05/1990".to_string()));
        assert_eq!(normalize_dob("Birth 01-01/2001"), Some("01/01/2001".to_string()));
    }

    #[test]
    fn test_short_year() {
        assert_eq!(normalize_dob("12-05-90"), Some("12/05/90".to_string()));
    }

    #[test]
    fn test_year_only() {
        assert_eq!(normalize_dob("Year of Birth : 1985"), Some("1985".to_string()));
    }

    #[test]
    fn test_lenient_fallback() {
        assert_eq!(normalize_dob("1-2-3"), Some("1-2-3".to_string()));
        assert_eq!(normalize_dob("12 05"), Some("1205".to_string()));
    }

    #[test]
    fn test_non_ascii_digits_dropped() {
        assert_eq!(normalize_dob("१२/०५/१९९०"), Some("//".to_string()));
        assert_eq!(normalize_dob("जन्म तिथि: 12/05/1990"), Some("12/05/1990".to_string()));
        assert_eq!(normalize_dob("١٢٣٤"), None);
    }

    #[test]
    fn test_no_date_characters() {
        assert_eq!(normalize_dob(""), None);
        assert_eq!(normalize_dob("DOB"), None);
    }
}
