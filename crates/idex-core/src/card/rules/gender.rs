//! Gender normalization.

use super::patterns::NON_GENDER_CHARS;

/// Normalize raw OCR text into `Male` or `Female`.
///
/// Text that is not recognized is returned lowercased with non-letters
/// removed, so reviewers can see what was read.
pub fn normalize_gender(text: &str) -> Option<String> {
    let cleaned = NON_GENDER_CHARS.replace_all(text, "");
    let cleaned = cleaned.trim().to_lowercase();

    if cleaned.is_empty() {
        return None;
    }

    // "female" contains "male", so it is checked first
    let canonical = if cleaned.contains("female") || cleaned.contains("femal") {
        Some("Female")
    } else if cleaned.contains("male") {
        Some("Male")
    } else {
        match cleaned.as_str() {
            "m" | "man" => Some("Male"),
            "f" | "woman" => Some("Female"),
            _ => None,
        }
    };

    Some(canonical.map(str::to_string).unwrap_or(cleaned))
}
