//! Regex patterns for card field normalization.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Anything that is not a digit
    pub static ref NON_DIGIT: Regex = Regex::new(r"\D").unwrap();

    // Characters a name may contain
    pub static ref NON_NAME_CHARS: Regex = Regex::new(r"[^a-zA-Z\s'\-.]").unwrap();

    // Characters a date may contain
    pub static ref NON_DATE_CHARS: Regex = Regex::new(r"[^0-9/\-]").unwrap();

    // Characters a gender word may contain
    pub static ref NON_GENDER_CHARS: Regex = Regex::new(r"[^a-zA-Z\s]").unwrap();

    // Dates, most specific first
    pub static ref DATE_DMY_FULL: Regex = Regex::new(r"\d{2}[/-]\d{2}[/-]\d{4}").unwrap();

    pub static ref DATE_DMY_SHORT: Regex = Regex::new(r"\d{2}[/-]\d{2}[/-]\d{2}").unwrap();

    pub static ref YEAR_ONLY: Regex = Regex::new(r"\d{4}").unwrap();
}

/// Date patterns in search order.
pub fn date_patterns() -> [&'static Regex; 3] {
    [&DATE_DMY_FULL, &DATE_DMY_SHORT, &YEAR_ONLY]
}

/// Collapse whitespace runs to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
