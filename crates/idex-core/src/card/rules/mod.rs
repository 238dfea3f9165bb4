//! Per-field normalization rules for Aadhaar card text.
//!
//! Every rule is a total function from raw OCR text to an optional
//! canonical value.

pub mod aadhaar;
pub mod dates;
pub mod gender;
pub mod name;
pub mod patterns;

pub use aadhaar::{normalize_aadhaar, validate_aadhaar};
pub use dates::normalize_dob;
pub use gender::normalize_gender;
pub use name::normalize_name;
pub use patterns::collapse_whitespace;

use crate::models::FieldKind;

/// Normalize raw text with the rule for its field.
pub fn normalize_field(kind: FieldKind, raw: &str) -> Option<String> {
    match kind {
        FieldKind::AadharNumber => normalize_aadhaar(raw),
        FieldKind::Name => normalize_name(raw),
        FieldKind::DateOfBirth => normalize_dob(raw),
        FieldKind::Gender => normalize_gender(raw),
    }
}
