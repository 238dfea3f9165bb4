//! Aadhaar card data models: field kinds, detections, and extracted values.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::card::rules::validate_aadhaar;

/// The identity fields the pipeline extracts.
///
/// Detector labels outside this set are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldKind {
    /// 12-digit Aadhaar number.
    #[serde(rename = "AADHAR_NUMBER")]
    AadharNumber,
    /// Cardholder name.
    #[serde(rename = "NAME")]
    Name,
    /// Date of birth (output key `DOB`).
    #[serde(rename = "DATE_OF_BIRTH")]
    DateOfBirth,
    /// Gender.
    #[serde(rename = "GENDER")]
    Gender,
}

impl FieldKind {
    /// All field kinds in output order.
    pub const ALL: [FieldKind; 4] = [
        FieldKind::AadharNumber,
        FieldKind::Name,
        FieldKind::DateOfBirth,
        FieldKind::Gender,
    ];

    /// Parse a detector class label. Matching is exact.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "AADHAR_NUMBER" => Some(FieldKind::AadharNumber),
            "NAME" => Some(FieldKind::Name),
            "DATE_OF_BIRTH" => Some(FieldKind::DateOfBirth),
            "GENDER" => Some(FieldKind::Gender),
            _ => None,
        }
    }

    /// Detector class label.
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::AadharNumber => "AADHAR_NUMBER",
            FieldKind::Name => "NAME",
            FieldKind::DateOfBirth => "DATE_OF_BIRTH",
            FieldKind::Gender => "GENDER",
        }
    }

    /// Key used in the extracted data record.
    pub fn output_key(&self) -> &'static str {
        match self {
            FieldKind::DateOfBirth => "DOB",
            other => other.label(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Axis-aligned box in image pixel coordinates.
///
/// Detectors are not required to produce ordered or in-bounds corners.
/// Serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Width, or zero for an inverted box.
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    /// Height, or zero for an inverted box.
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(b: [f32; 4]) -> Self {
        Self::new(b[0], b[1], b[2], b[3])
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// A labeled, confidence-scored box produced by a field detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector class label.
    pub label: String,
    /// Detection confidence (0.0 - 1.0).
    pub confidence: f32,
    /// Box in source image pixels.
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    /// The field kind for this detection's label, if it is one we extract.
    pub fn field_kind(&self) -> Option<FieldKind> {
        FieldKind::from_label(&self.label)
    }
}

/// Evidence for one accepted detection: the box and its raw OCR text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Detector class label.
    pub label: String,
    /// Detection confidence score.
    pub confidence: f32,
    /// Bounding box `[x1, y1, x2, y2]`.
    pub bbox: BoundingBox,
    /// Whitespace-cleaned OCR text before normalization.
    pub text: Option<String>,
}

/// Normalized card fields.
///
/// Every key is always serialized; fields that could not be extracted are
/// `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AadhaarData {
    /// Aadhaar number, `DDDD DDDD DDDD` when 12 digits were read.
    #[serde(rename = "AADHAR_NUMBER")]
    pub aadhar_number: Option<String>,

    /// Cardholder name, title-cased.
    #[serde(rename = "NAME")]
    pub name: Option<String>,

    /// Date of birth with `/` separators.
    #[serde(rename = "DOB")]
    pub dob: Option<String>,

    /// `Male`, `Female`, or the cleaned OCR text.
    #[serde(rename = "GENDER")]
    pub gender: Option<String>,
}

impl AadhaarData {
    /// Value for a field kind.
    pub fn get(&self, kind: FieldKind) -> Option<&str> {
        match kind {
            FieldKind::AadharNumber => self.aadhar_number.as_deref(),
            FieldKind::Name => self.name.as_deref(),
            FieldKind::DateOfBirth => self.dob.as_deref(),
            FieldKind::Gender => self.gender.as_deref(),
        }
    }

    /// Replace the value for a field kind.
    pub fn set(&mut self, kind: FieldKind, value: Option<String>) {
        let slot = match kind {
            FieldKind::AadharNumber => &mut self.aadhar_number,
            FieldKind::Name => &mut self.name,
            FieldKind::DateOfBirth => &mut self.dob,
            FieldKind::Gender => &mut self.gender,
        };
        *slot = value;
    }

    /// Number of fields that have a value.
    pub fn found_count(&self) -> usize {
        FieldKind::ALL
            .iter()
            .filter(|kind| self.get(**kind).is_some())
            .count()
    }

    /// True when no field has a value.
    pub fn is_empty(&self) -> bool {
        self.found_count() == 0
    }

    /// List issues a reviewer should look at. Values are not modified.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for kind in FieldKind::ALL {
            if self.get(kind).is_none() {
                issues.push(format!("Missing {}", kind.output_key()));
            }
        }

        if let Some(number) = &self.aadhar_number {
            let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.len() != 12 {
                issues.push(format!(
                    "Aadhaar number has {} digits, expected 12",
                    digits.len()
                ));
            } else if !validate_aadhaar(&digits) {
                issues.push("Aadhaar number fails Verhoeff checksum".to_string());
            }
        }

        if let Some(dob) = &self.dob {
            if NaiveDate::parse_from_str(dob, "%d/%m/%Y").is_err() {
                issues.push(format!("DOB '{}' is not a full DD/MM/YYYY date", dob));
            }
        }

        if let Some(gender) = &self.gender {
            if gender != "Male" && gender != "Female" {
                issues.push(format!("Unrecognized gender '{}'", gender));
            }
        }

        issues
    }
}

/// Result of processing one card image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResponse {
    /// Whether the image was processed. Missing fields still count as success.
    pub success: bool,

    /// Normalized card fields.
    pub data: AadhaarData,

    /// Accepted detections with raw OCR text, in detector order.
    pub detections: Vec<DetectionRecord>,

    /// Processing time in seconds, rounded to milliseconds.
    pub processing_time: f64,

    /// When processing finished.
    pub processed_at: DateTime<Utc>,

    /// Human-readable summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
