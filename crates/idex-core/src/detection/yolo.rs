//! YOLOv8 card field detector.

use ndarray::{ArrayD, Ix3};
use tracing::{debug, trace};

use crate::error::DetectionError;
use crate::models::{BoundingBox, CardImage, Detection, DetectionConfig};
use crate::ocr::{ImagePreprocessor, Letterbox};
use idex_inference::{InferenceBackend, InputTensor, OutputTensor};

use super::FieldDetector;

/// Field detector running a YOLOv8 ONNX export.
pub struct YoloFieldDetector<B: InferenceBackend> {
    backend: B,
    preprocessor: ImagePreprocessor,
    class_names: Vec<String>,
    iou_threshold: f32,
}

impl<B: InferenceBackend> YoloFieldDetector<B> {
    /// Create a detector; class ids index into `class_names`.
    pub fn new(backend: B, class_names: Vec<String>) -> Self {
        Self {
            backend,
            preprocessor: ImagePreprocessor::new(),
            class_names,
            iou_threshold: 0.7,
        }
    }

    /// Create a detector from detection configuration.
    pub fn from_config(backend: B, config: &DetectionConfig) -> Self {
        Self::new(backend, config.class_names.clone())
            .with_input_size(config.input_size)
            .with_iou_threshold(config.iou_threshold)
    }

    /// Set the square model input size.
    pub fn with_input_size(mut self, size: u32) -> Self {
        self.preprocessor = self.preprocessor.with_det_input_size(size);
        self
    }

    /// Set the IoU threshold for non-maximum suppression.
    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    fn class_name(&self, class_id: usize) -> String {
        self.class_names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }

    fn post_process(
        &self,
        output: &ArrayD<f32>,
        letterbox: Letterbox,
        threshold: f32,
        (orig_width, orig_height): (u32, u32),
    ) -> Result<Vec<Detection>, DetectionError> {
        let arr = output
            .view()
            .into_dimensionality::<Ix3>()
            .map_err(|_| {
                DetectionError::InvalidOutput(format!("expected rank 3, got {:?}", output.shape()))
            })?;

        // [1, 4 + nc, N] is the usual export; some tools emit [1, N, 4 + nc]
        let expected = 4 + self.class_names.len();
        let channels_first = match (arr.shape()[1] == expected, arr.shape()[2] == expected) {
            (true, _) => true,
            (false, true) => false,
            (false, false) => arr.shape()[1] <= arr.shape()[2],
        };
        let arr = if channels_first {
            arr
        } else {
            arr.permuted_axes([0, 2, 1])
        };

        let channels = arr.shape()[1];
        let anchors = arr.shape()[2];
        if channels < 5 {
            return Err(DetectionError::InvalidOutput(format!(
                "need at least 5 channels, got {}",
                channels
            )));
        }

        let mut candidates: Vec<(usize, Detection)> = Vec::new();

        for i in 0..anchors {
            let mut best_class = 0;
            let mut best_score = f32::NEG_INFINITY;
            for c in 4..channels {
                let score = arr[[0, c, i]];
                if score > best_score {
                    best_score = score;
                    best_class = c - 4;
                }
            }

            if best_score.is_nan() || best_score < threshold {
                continue;
            }

            let (cx, cy, w, h) = (arr[[0, 0, i]], arr[[0, 1, i]], arr[[0, 2, i]], arr[[0, 3, i]]);
            let (x1, y1) = letterbox.unmap(cx - w / 2.0, cy - h / 2.0);
            let (x2, y2) = letterbox.unmap(cx + w / 2.0, cy + h / 2.0);

            let bbox = BoundingBox::new(
                x1.clamp(0.0, orig_width as f32),
                y1.clamp(0.0, orig_height as f32),
                x2.clamp(0.0, orig_width as f32),
                y2.clamp(0.0, orig_height as f32),
            );

            candidates.push((
                best_class,
                Detection::new(self.class_name(best_class), best_score, bbox),
            ));
        }

        trace!("{} candidates above {:.2}", candidates.len(), threshold);
        Ok(self.nms(candidates))
    }

    /// Per-class non-maximum suppression; output is sorted by confidence.
    fn nms(&self, mut candidates: Vec<(usize, Detection)>) -> Vec<Detection> {
        candidates.sort_by(|a, b| {
            b.1.confidence
                .partial_cmp(&a.1.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut keep: Vec<(usize, Detection)> = Vec::new();

        for (class_id, detection) in candidates {
            let suppressed = keep.iter().any(|(kept_class, kept)| {
                *kept_class == class_id && detection.bbox.iou(&kept.bbox) > self.iou_threshold
            });

            if !suppressed {
                keep.push((class_id, detection));
            }
        }

        keep.into_iter().map(|(_, d)| d).collect()
    }
}

impl<B: InferenceBackend> FieldDetector for YoloFieldDetector<B> {
    fn detect(
        &self,
        image: &CardImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, DetectionError> {
        if image.is_empty() {
            return Err(DetectionError::Preprocessing(
                "image has zero width or height".to_string(),
            ));
        }

        let (tensor, letterbox) = self.preprocessor.preprocess_for_detection(&image.to_rgb());

        let input_name = self
            .backend
            .input_names()
            .first()
            .cloned()
            .unwrap_or_else(|| "images".to_string());

        let outputs = self
            .backend
            .run(&[(input_name.as_str(), InputTensor::Float32(tensor.into_dyn()))])
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let output = outputs
            .into_iter()
            .next()
            .map(|(_, tensor)| tensor)
            .ok_or_else(|| DetectionError::InvalidOutput("no output tensor".to_string()))?;

        let arr = match output {
            OutputTensor::Float32(arr) => arr,
            _ => {
                return Err(DetectionError::InvalidOutput(
                    "unexpected output tensor type".to_string(),
                ))
            }
        };

        let detections =
            self.post_process(&arr, letterbox, confidence_threshold, image.dimensions())?;

        debug!("Detected {} field boxes", detections.len());
        Ok(detections)
    }
}
