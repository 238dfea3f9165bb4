//! Cardholder name normalization.

use super::patterns::{collapse_whitespace, NON_NAME_CHARS};

/// Characters stripped from the end of a name.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', '\'', '-'];

/// Normalize raw OCR text into a cardholder name.
///
/// Keeps ASCII letters, whitespace, `'`, `-` and `.`; collapses whitespace;
/// strips trailing punctuation; capitalizes the first letter of each word
/// and lowercases the rest.
pub fn normalize_name(text: &str) -> Option<String> {
    let cleaned = NON_NAME_CHARS.replace_all(text, "");
    let collapsed = collapse_whitespace(&cleaned);
    let trimmed =
        collapsed.trim_end_matches(|c: char| TRAILING_PUNCTUATION.contains(&c) || c == ' ');

    if trimmed.is_empty() {
        return None;
    }

    Some(
        trimmed
            .split(' ')
            .map(capitalize_word)
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Upper-case the first letter of a word and lower-case everything after it.
fn capitalize_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut seen_letter = false;

    for c in word.chars() {
        if c.is_ascii_alphabetic() && !seen_letter {
            out.push(c.to_ascii_uppercase());
            seen_letter = true;
        } else {
            out.push(c.to_ascii_lowercase());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  joHN   o'brien-- "), Some("John O'brien".to_string()));
        assert_eq!(normalize_name("RAHUL KUMAR"), Some("Rahul Kumar".to_string()));
        assert_eq!(normalize_name("Name: Priya_Sharma3"), Some("Name Priyasharma".to_string()));
        assert_eq!(normalize_name("mary-jane s."), Some("Mary-jane S".to_string()));
    }

    #[test]
    fn test_empty_names() {
        assert_eq!(normalize_name(""), None);
        assert_eq!(normalize_name("1234 !!"), None);
        assert_eq!(normalize_name(" .,-' "), None);
    }

    #[test]
    fn test_non_ascii_input() {
        assert_eq!(normalize_name("राहुल kumar"), Some("Kumar".to_string()));
        assert_eq!(normalize_name("JOHN\u{00a0}DOE"), Some("John Doe".to_string()));
        assert_eq!(normalize_name("ANIL\u{3000}\u{2003}SHARMA"), Some("Anil Sharma".to_string()));
        assert_eq!(normalize_name("José Müller"), Some("Jos Mller".to_string()));
        assert_eq!(normalize_name("O\u{2019}BRIEN"), Some("Obrien".to_string()));
        assert_eq!(normalize_name("राहुल"), None);
        assert_eq!(normalize_name("\u{3000}\u{00a0}"), None);
    }

    #[test]
    fn test_idempotent() {
        for raw in ["  joHN   o'brien-- ", "a.b. c", "'quote", "SINGH, AMAN."] {
            let once = normalize_name(raw);
            let twice = once.as_deref().and_then(normalize_name);
            assert_eq!(once, twice, "input {:?}", raw);
        }
    }
}
