//! Turns detections on a card image into normalized field values.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::detection::{RegionSelector, TieBreak};
use crate::models::{AadhaarData, CardImage, Detection, DetectionRecord, FieldKind};
use crate::ocr::{recognize_field, LineRecognizer};

use super::rules::normalize_field;

/// Normalized fields plus the evidence they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Normalized values, one per field.
    pub data: AadhaarData,
    /// Every accepted detection with its raw OCR text, in detector order.
    pub detections: Vec<DetectionRecord>,
}

/// Reads and normalizes card fields from detector boxes.
pub struct CardExtractor<R: LineRecognizer> {
    recognizer: R,
    selector: RegionSelector,
}

impl<R: LineRecognizer> CardExtractor<R> {
    /// Create an extractor with the default selector.
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            selector: RegionSelector::default(),
        }
    }

    /// Replace the region selector.
    pub fn with_selector(mut self, selector: RegionSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Set the minimum detection confidence.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.selector = RegionSelector::new(threshold).with_tie_break(self.selector.tie_break());
        self
    }

    /// Set the duplicate resolution policy.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.selector = self.selector.with_tie_break(tie_break);
        self
    }

    pub fn selector(&self) -> &RegionSelector {
        &self.selector
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Extract all fields.
    ///
    /// Every accepted detection is read, in order, so the evidence list is
    /// complete; each field's value comes from the detection the selector
    /// keeps. Fields without a usable detection are `None`.
    pub fn extract(&self, image: &CardImage, detections: &[Detection]) -> Extraction {
        let accepted = self.selector.accepted(detections);

        if accepted.is_empty() {
            info!(
                "No field detections above {:.2} among {} boxes",
                self.selector.confidence_threshold(),
                detections.len()
            );
            return Extraction::default();
        }

        let selected = self.selector.select(detections);
        let mut raw: BTreeMap<FieldKind, String> = BTreeMap::new();
        let mut records = Vec::with_capacity(accepted.len());

        for (kind, detection) in accepted {
            let text = recognize_field(&self.recognizer, image, &detection.bbox, &detection.label);

            let is_selected = selected
                .get(&kind)
                .is_some_and(|chosen| std::ptr::eq(*chosen, detection));
            if is_selected {
                if let Some(text) = &text {
                    raw.insert(kind, text.clone());
                }
            }

            records.push(DetectionRecord {
                label: detection.label.clone(),
                confidence: detection.confidence,
                bbox: detection.bbox,
                text,
            });
        }

        let mut data = AadhaarData::default();
        for kind in FieldKind::ALL {
            let value = raw.get(&kind).and_then(|text| normalize_field(kind, text));
            debug!("{} -> {:?}", kind.output_key(), value);
            data.set(kind, value);
        }

        info!(
            "Extracted {}/{} fields from {} detections",
            data.found_count(),
            FieldKind::ALL.len(),
            records.len()
        );

        Extraction {
            data,
            detections: records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::models::{BoundingBox, ChannelOrder};
    use image::GrayImage;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers recognize calls from a queue, in order.
    struct Scripted {
        answers: Mutex<VecDeque<Result<String, String>>>,
        calls: Mutex<usize>,
    }

    impl Scripted {
        fn new(answers: &[Result<&str, &str>]) -> Self {
            Self {
                answers: Mutex::new(
                    answers
                        .iter()
                        .map(|a| a.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl LineRecognizer for Scripted {
        fn recognize_line(&self, _image: &GrayImage) -> Result<String, OcrError> {
            *self.calls.lock().unwrap() += 1;
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
                .map_err(OcrError::Recognition)
        }
    }

    fn card() -> CardImage {
        CardImage::from_raw(200, 100, ChannelOrder::Bgr, vec![255; 200 * 100 * 3]).unwrap()
    }

    fn det(label: &str, confidence: f32, y: f32) -> Detection {
        Detection::new(label, confidence, BoundingBox::new(10.0, y, 150.0, y + 15.0))
    }

    #[test]
    fn test_no_detections_gives_all_keys_none() {
        let ocr = Scripted::new(&[]);
        let extraction = CardExtractor::new(&ocr).extract(&card(), &[]);

        assert_eq!(extraction.data, AadhaarData::default());
        assert!(extraction.detections.is_empty());
        assert_eq!(ocr.calls(), 0);

        let json = serde_json::to_value(&extraction.data).unwrap();
        for key in ["AADHAR_NUMBER", "NAME", "DOB", "GENDER"] {
            assert_eq!(json[key], serde_json::Value::Null, "{}", key);
        }
    }

    #[test]
    fn test_full_card() {
        let ocr = Scripted::new(&[
            Ok("  joHN   o'brien-- "),
            Ok("DOB: 12-05-1990"),
            Ok("MALE"),
            Ok("1234 5678 9012 "),
        ]);
        let detections = vec![
            det("NAME", 0.9, 10.0),
            det("DATE_OF_BIRTH", 0.8, 30.0),
            det("GENDER", 0.7, 50.0),
            det("AADHAR_NUMBER", 0.95, 70.0),
        ];

        let extraction = CardExtractor::new(&ocr).extract(&card(), &detections);

        assert_eq!(
            extraction.data,
            AadhaarData {
                aadhar_number: Some("1234 5678 9012".to_string()),
                name: Some("John O'brien".to_string()),
                dob: Some("12/05/1990".to_string()),
                gender: Some("Male".to_string()),
            }
        );

        let raw: Vec<Option<&str>> = extraction
            .detections
            .iter()
            .map(|r| r.text.as_deref())
            .collect();
        assert_eq!(
            raw,
            vec![
                Some("joHN o'brien--"),
                Some("DOB: 12-05-1990"),
                Some("MALE"),
                Some("1234 5678 9012"),
            ]
        );
    }

    #[test]
    fn test_devanagari_text_does_not_abort_extraction() {
        let ocr = Scripted::new(&[Ok("१२३४५"), Ok("राहुल कुमार"), Ok("पुरुष / Male")]);
        let detections = vec![
            det("AADHAR_NUMBER", 0.9, 10.0),
            det("NAME", 0.9, 30.0),
            det("GENDER", 0.9, 50.0),
        ];

        let extraction = CardExtractor::new(&ocr).extract(&card(), &detections);

        assert_eq!(
            extraction.data,
            AadhaarData {
                aadhar_number: Some("१२३४५".to_string()),
                name: None,
                dob: None,
                gender: Some("Male".to_string()),
            }
        );
        assert_eq!(extraction.detections.len(), 3);
    }

    #[test]
    fn test_filtered_detections_are_not_read() {
        let ocr = Scripted::new(&[Ok("F")]);
        let detections = vec![
            det("ADDRESS", 0.99, 10.0),
            det("NAME", 0.2, 30.0),
            det("GENDER", 0.6, 50.0),
        ];

        let extraction = CardExtractor::new(&ocr).extract(&card(), &detections);

        assert_eq!(ocr.calls(), 1);
        assert_eq!(extraction.detections.len(), 1);
        assert_eq!(extraction.detections[0].label, "GENDER");
        assert_eq!(extraction.data.gender.as_deref(), Some("Female"));
        assert_eq!(extraction.data.name, None);
    }

    #[test]
    fn test_duplicate_numbers_last_seen() {
        let ocr = Scripted::new(&[Ok("111122223333"), Ok("444455556666")]);
        let detections = vec![
            det("AADHAR_NUMBER", 0.95, 10.0),
            det("AADHAR_NUMBER", 0.6, 40.0),
        ];

        let extraction = CardExtractor::new(&ocr).extract(&card(), &detections);

        assert_eq!(extraction.data.aadhar_number.as_deref(), Some("4444 5555 6666"));
        assert_eq!(extraction.detections.len(), 2);
    }

    #[test]
    fn test_duplicate_numbers_highest_confidence() {
        let ocr = Scripted::new(&[Ok("111122223333"), Ok("444455556666")]);
        let detections = vec![
            det("AADHAR_NUMBER", 0.95, 10.0),
            det("AADHAR_NUMBER", 0.6, 40.0),
        ];

        let extraction = CardExtractor::new(&ocr)
            .with_tie_break(TieBreak::HighestConfidence)
            .extract(&card(), &detections);

        assert_eq!(extraction.data.aadhar_number.as_deref(), Some("1111 2222 3333"));
    }

    #[test]
    fn test_failures_do_not_abort_other_fields() {
        let ocr = Scripted::new(&[Err("tesseract crashed"), Ok("Priya Sharma")]);
        let detections = vec![
            det("GENDER", 0.9, 10.0),
            // Entirely outside the image: never reaches the engine
            Detection::new("DATE_OF_BIRTH", 0.9, BoundingBox::new(500.0, 500.0, 600.0, 520.0)),
            det("NAME", 0.9, 40.0),
        ];

        let extraction = CardExtractor::new(&ocr).extract(&card(), &detections);

        assert_eq!(ocr.calls(), 2);
        assert_eq!(extraction.data.gender, None);
        assert_eq!(extraction.data.dob, None);
        assert_eq!(extraction.data.name.as_deref(), Some("Priya Sharma"));
        assert_eq!(extraction.detections.len(), 3);
        assert_eq!(extraction.detections[1].text, None);
    }

    #[test]
    fn test_threshold_override() {
        let ocr = Scripted::new(&[Ok("Asha")]);
        let detections = vec![det("NAME", 0.3, 10.0)];

        let extraction = CardExtractor::new(&ocr)
            .with_confidence_threshold(0.25)
            .extract(&card(), &detections);

        assert_eq!(extraction.data.name.as_deref(), Some("Asha"));
    }
}
