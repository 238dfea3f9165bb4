//! Aadhaar number normalization and checksum validation.

use super::patterns::NON_DIGIT;

/// Length of an Aadhaar number in digits.
pub const AADHAAR_LEN: usize = 12;

// Verhoeff multiplication table (dihedral group D5)
const D: [[u8; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

// Verhoeff permutation table
const P: [[u8; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
    [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
    [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
    [9, 4, 5, 3, 1, 2, 0, 7, 6, 8],
    [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
    [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
    [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
];

/// Normalize raw OCR text into an Aadhaar number.
///
/// Non-digits are removed. Twelve digits are grouped as `DDDD DDDD DDDD`;
/// longer runs are cut to the first twelve and grouped; shorter runs are
/// returned as bare digits. No digits at all yields `None`.
///
/// Any Unicode decimal digit counts, so lengths are measured in characters.
pub fn normalize_aadhaar(text: &str) -> Option<String> {
    let digits: Vec<char> = NON_DIGIT.replace_all(text, "").chars().collect();

    if digits.is_empty() {
        return None;
    }

    if digits.len() < AADHAAR_LEN {
        return Some(digits.into_iter().collect());
    }

    Some(format_aadhaar(&digits[..AADHAAR_LEN]))
}

/// Group twelve digits as `DDDD DDDD DDDD`.
fn format_aadhaar(digits: &[char]) -> String {
    digits
        .chunks(4)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validate an Aadhaar number with the Verhoeff checksum.
///
/// Separators are ignored; anything other than twelve digits is invalid.
pub fn validate_aadhaar(number: &str) -> bool {
    let digits: Vec<u8> = number
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| d as u8)
        .collect();

    if digits.len() != AADHAAR_LEN || digits[0] < 2 {
        return false;
    }

    let check = digits
        .iter()
        .rev()
        .enumerate()
        .fold(0u8, |c, (i, &d)| D[c as usize][P[i % 8][d as usize] as usize]);

    check == 0
}
