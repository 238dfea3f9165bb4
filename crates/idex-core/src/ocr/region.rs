//! Reads the text inside one detected field region.

use tracing::{debug, error, warn};

use crate::card::rules::collapse_whitespace;
use crate::error::RegionError;
use crate::models::{BoundingBox, CardImage};

use super::LineRecognizer;

/// Crop `bbox` from the image, run single-line OCR on it and clean the
/// result.
///
/// Returns `Ok(None)` when the engine read nothing but whitespace.
pub fn try_recognize_field<R: LineRecognizer + ?Sized>(
    recognizer: &R,
    image: &CardImage,
    bbox: &BoundingBox,
    label: &str,
) -> Result<Option<String>, RegionError> {
    let rect = image.clamp(bbox).ok_or_else(|| RegionError::EmptyRegion {
        label: label.to_string(),
    })?;

    let region = image.crop_gray(rect);
    debug!(
        "OCR on {} region {}x{} at ({}, {})",
        label,
        rect.width(),
        rect.height(),
        rect.x1,
        rect.y1
    );

    let raw = recognizer
        .recognize_line(&region)
        .map_err(|source| RegionError::OcrEngine {
            label: label.to_string(),
            source,
        })?;

    let text = collapse_whitespace(&raw);
    debug!("Extracted text for {}: '{}'", label, text);

    Ok(if text.is_empty() { None } else { Some(text) })
}

/// Like [`try_recognize_field`], but failures are logged and become `None`.
pub fn recognize_field<R: LineRecognizer + ?Sized>(
    recognizer: &R,
    image: &CardImage,
    bbox: &BoundingBox,
    label: &str,
) -> Option<String> {
    match try_recognize_field(recognizer, image, bbox, label) {
        Ok(text) => text,
        Err(e @ RegionError::EmptyRegion { .. }) => {
            warn!("{} (box {:?}, image {}x{})", e, bbox, image.width(), image.height());
            None
        }
        Err(e) => {
            error!("{}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::models::ChannelOrder;
    use image::GrayImage;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Records what it was shown and answers with a fixed result.
    struct Recording {
        answer: Result<&'static str, &'static str>,
        seen: Mutex<Vec<GrayImage>>,
    }

    impl Recording {
        fn new(answer: Result<&'static str, &'static str>) -> Self {
            Self {
                answer,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl LineRecognizer for Recording {
        fn recognize_line(&self, image: &GrayImage) -> Result<String, OcrError> {
            self.seen.lock().unwrap().push(image.clone());
            self.answer
                .map(str::to_string)
                .map_err(|e| OcrError::Recognition(e.to_string()))
        }
    }

    fn blue_bgr(width: u32, height: u32) -> CardImage {
        let data = [255u8, 0, 0]
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        CardImage::from_raw(width, height, ChannelOrder::Bgr, data).unwrap()
    }

    #[test]
    fn test_crops_clamped_gray_region() {
        let image = blue_bgr(100, 60);
        let ocr = Recording::new(Ok("  1234\n 5678\t9012 "));

        let text = recognize_field(&ocr, &image, &BoundingBox::new(-5.0, 10.9, 40.2, 80.0), "AADHAR_NUMBER");
        assert_eq!(text, Some("1234 5678 9012".to_string()));

        let seen = ocr.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].dimensions(), (40, 50));
        assert_eq!(seen[0].get_pixel(0, 0)[0], 29);
    }

    #[test]
    fn test_box_outside_image_is_none() {
        let image = blue_bgr(100, 60);
        let ocr = Recording::new(Ok("text"));

        let bbox = BoundingBox::new(150.0, 70.0, 200.0, 90.0);
        assert_eq!(recognize_field(&ocr, &image, &bbox, "NAME"), None);
        assert!(ocr.seen.lock().unwrap().is_empty());

        let err = try_recognize_field(&ocr, &image, &bbox, "NAME").unwrap_err();
        assert!(matches!(err, RegionError::EmptyRegion { .. }));
    }

    #[test]
    fn test_engine_failure_is_none() {
        let image = blue_bgr(10, 10);
        let ocr = Recording::new(Err("engine crashed"));
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);

        assert_eq!(recognize_field(&ocr, &image, &bbox, "GENDER"), None);

        let err = try_recognize_field(&ocr, &image, &bbox, "GENDER").unwrap_err();
        assert!(err.to_string().contains("GENDER"));
        assert!(err.to_string().contains("engine crashed"));
    }

    #[test]
    fn test_whitespace_only_is_none() {
        let image = blue_bgr(10, 10);
        let ocr = Recording::new(Ok(" \n\t "));
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);

        assert_eq!(try_recognize_field(&ocr, &image, &bbox, "DATE_OF_BIRTH").unwrap(), None);
    }
}
