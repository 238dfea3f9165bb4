//! Card field detection.
//!
//! Detectors find labeled boxes on a card image; the [`RegionSelector`]
//! decides which of them the extractor reads.

mod selector;
mod yolo;

pub use selector::{select, RegionSelector, TieBreak, DEFAULT_CONFIDENCE_THRESHOLD};
pub use yolo::YoloFieldDetector;

use crate::error::DetectionError;
use crate::models::{CardImage, Detection};

/// An object detector producing labeled boxes for card fields.
pub trait FieldDetector: Send + Sync {
    /// Detect field boxes scoring at least `confidence_threshold`.
    ///
    /// Boxes are in source image pixels. Labels are the detector's class
    /// names and may include classes the extractor ignores.
    fn detect(
        &self,
        image: &CardImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, DetectionError>;
}

impl<D: FieldDetector + ?Sized> FieldDetector for Box<D> {
    fn detect(
        &self,
        image: &CardImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, DetectionError> {
        (**self).detect(image, confidence_threshold)
    }
}
