//! End-to-end card processing: detection followed by extraction.

use std::time::Instant;

use chrono::Utc;
use tracing::info;

use crate::detection::{FieldDetector, RegionSelector};
use crate::error::Result;
use crate::models::{CardImage, ExtractionResponse, IdexConfig};
use crate::ocr::LineRecognizer;

use super::extractor::CardExtractor;

/// Runs an injected detector and recognizer over card images.
pub struct CardPipeline<D: FieldDetector, R: LineRecognizer> {
    detector: D,
    extractor: CardExtractor<R>,
}

impl<D: FieldDetector, R: LineRecognizer> CardPipeline<D, R> {
    /// Create a pipeline with the default selector.
    pub fn new(detector: D, recognizer: R) -> Self {
        Self {
            detector,
            extractor: CardExtractor::new(recognizer),
        }
    }

    /// Create a pipeline using the threshold and tie-break from config.
    pub fn from_config(detector: D, recognizer: R, config: &IdexConfig) -> Self {
        let selector = RegionSelector::new(config.detection.confidence_threshold)
            .with_tie_break(config.detection.tie_break);

        Self {
            detector,
            extractor: CardExtractor::new(recognizer).with_selector(selector),
        }
    }

    /// Override the minimum detection confidence.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.extractor = self.extractor.with_confidence_threshold(threshold);
        self
    }

    pub fn extractor(&self) -> &CardExtractor<R> {
        &self.extractor
    }

    /// Detect fields on one image and extract them.
    ///
    /// A detector failure fails the image. Missing fields do not: the
    /// response is successful with those fields set to `None`.
    pub fn process(&self, image: &CardImage) -> Result<ExtractionResponse> {
        let start = Instant::now();
        let threshold = self.extractor.selector().confidence_threshold();

        let detections = self.detector.detect(image, threshold)?;
        let extraction = self.extractor.extract(image, &detections);

        let elapsed = start.elapsed().as_secs_f64();
        let processing_time = (elapsed * 1000.0).round() / 1000.0;

        let message = if extraction.data.is_empty() {
            "No data detected"
        } else {
            "Data extracted successfully"
        };

        info!(
            "Processed {}x{} image in {:.3}s. Found {} detections.",
            image.width(),
            image.height(),
            elapsed,
            extraction.detections.len()
        );

        Ok(ExtractionResponse {
            success: true,
            data: extraction.data,
            detections: extraction.detections,
            processing_time,
            processed_at: Utc::now(),
            message: Some(message.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::TieBreak;
    use crate::error::{DetectionError, IdexError, OcrError};
    use crate::models::{BoundingBox, ChannelOrder, Detection};
    use image::GrayImage;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct FixedDetector {
        result: std::result::Result<Vec<Detection>, String>,
        thresholds: Mutex<Vec<f32>>,
    }

    impl FixedDetector {
        fn ok(detections: Vec<Detection>) -> Self {
            Self {
                result: Ok(detections),
                thresholds: Mutex::new(Vec::new()),
            }
        }
    }

    impl FieldDetector for FixedDetector {
        fn detect(
            &self,
            _image: &CardImage,
            confidence_threshold: f32,
        ) -> std::result::Result<Vec<Detection>, DetectionError> {
            self.thresholds.lock().unwrap().push(confidence_threshold);
            self.result.clone().map_err(DetectionError::Inference)
        }
    }

    struct Echo(&'static str);

    impl LineRecognizer for Echo {
        fn recognize_line(&self, _image: &GrayImage) -> std::result::Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    fn card() -> CardImage {
        CardImage::from_raw(64, 32, ChannelOrder::Rgb, vec![0; 64 * 32 * 3]).unwrap()
    }

    #[test]
    fn test_process_success() {
        let detector = FixedDetector::ok(vec![Detection::new(
            "GENDER",
            0.9,
            BoundingBox::new(0.0, 0.0, 30.0, 10.0),
        )]);
        let pipeline = CardPipeline::new(detector, Echo("female"));

        let response = pipeline.process(&card()).unwrap();

        assert!(response.success);
        assert_eq!(response.data.gender.as_deref(), Some("Female"));
        assert_eq!(response.detections.len(), 1);
        assert_eq!(response.message.as_deref(), Some("Data extracted successfully"));
        assert!(response.processing_time >= 0.0);
    }

    #[test]
    fn test_nothing_found_is_still_success() {
        let pipeline = CardPipeline::new(FixedDetector::ok(Vec::new()), Echo("x"));

        let response = pipeline.process(&card()).unwrap();

        assert!(response.success);
        assert!(response.data.is_empty());
        assert_eq!(response.message.as_deref(), Some("No data detected"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"]["DOB"], serde_json::Value::Null);
        assert!(json["detections"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_detector_failure_propagates() {
        let detector = FixedDetector {
            result: Err("model crashed".to_string()),
            thresholds: Mutex::new(Vec::new()),
        };
        let pipeline = CardPipeline::new(detector, Echo("x"));

        let err = pipeline.process(&card()).unwrap_err();
        assert!(matches!(err, IdexError::Detection(DetectionError::Inference(_))));
    }

    #[test]
    fn test_config_threshold_reaches_detector() {
        let mut config = IdexConfig::default();
        config.detection.confidence_threshold = 0.35;
        config.detection.tie_break = TieBreak::HighestConfidence;

        let pipeline =
            CardPipeline::from_config(FixedDetector::ok(Vec::new()), Echo("x"), &config);
        pipeline.process(&card()).unwrap();

        assert_eq!(*pipeline.detector.thresholds.lock().unwrap(), vec![0.35]);
        assert_eq!(pipeline.extractor().selector().tie_break(), TieBreak::HighestConfidence);
    }
}
