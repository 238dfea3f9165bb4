//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::detection::TieBreak;

/// Main configuration for the idex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdexConfig {
    /// Field detector configuration.
    pub detection: DetectionConfig,

    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// Input file validation.
    pub input: InputConfig,

    /// Model configuration.
    pub models: ModelConfig,
}

/// Field detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum detection confidence (0.0 - 1.0).
    pub confidence_threshold: f32,

    /// IoU threshold for non-maximum suppression.
    pub iou_threshold: f32,

    /// Square model input size in pixels.
    pub input_size: u32,

    /// Detector class names, indexed by class id.
    pub class_names: Vec<String>,

    /// How duplicate detections of one field are resolved.
    pub tie_break: TieBreak,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            iou_threshold: 0.7,
            input_size: 640,
            class_names: ["AADHAR_NUMBER", "DATE_OF_BIRTH", "GENDER", "NAME", "ADDRESS"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tie_break: TieBreak::LastSeen,
        }
    }
}

/// Which OCR collaborator reads field regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrEngineKind {
    /// External `tesseract` binary.
    #[default]
    Tesseract,
    /// CRNN ONNX line recognizer.
    Crnn,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Engine used for field regions.
    pub engine: OcrEngineKind,

    /// Path to the tesseract binary (searched on `PATH` when unset).
    pub tesseract_cmd: Option<PathBuf>,

    /// Tesseract language.
    pub language: String,

    /// Tesseract OCR engine mode.
    pub oem: u8,

    /// Tesseract page segmentation mode (7 = single text line).
    pub psm: u8,

    /// Number of CPU threads for ONNX models.
    pub num_threads: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: OcrEngineKind::Tesseract,
            tesseract_cmd: None,
            language: "eng".to_string(),
            oem: 3,
            psm: 7,
            num_threads: 4,
        }
    }
}

/// Input file validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Maximum accepted file size in megabytes.
    pub max_file_size_mb: u64,

    /// Accepted file extensions, lowercase without the dot.
    pub allowed_extensions: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
            allowed_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
        }
    }
}

impl InputConfig {
    /// Size limit in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Whether an extension is accepted. Case-insensitive.
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.allowed_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
    }
}

/// Model file paths and download source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Field detector model file name.
    pub detector_model: String,

    /// CRNN recognition model file name.
    pub recognition_model: String,

    /// Character dictionary for the recognition model (optional).
    pub dictionary: Option<String>,

    /// Hugging Face repository hosting the detector model.
    pub detector_repo_id: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detector_model: "model.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: None,
            detector_repo_id: "arnabdhar/YOLOv8-nano-aadhar-card".to_string(),
        }
    }
}

impl IdexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.models.model_dir.join(model_name)
    }

    /// Full path to the detector model.
    pub fn detector_model_path(&self) -> PathBuf {
        self.model_path(&self.models.detector_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = IdexConfig::default();
        assert_eq!(config.detection.confidence_threshold, 0.5);
        assert_eq!(config.detection.tie_break, TieBreak::LastSeen);
        assert_eq!(config.ocr.psm, 7);
        assert_eq!(
            config.detector_model_path(),
            PathBuf::from("models").join("model.onnx")
        );
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{"detection": {"confidence_threshold": 0.3, "tie_break": "highest_confidence"}, "ocr": {"engine": "crnn"}}"#;
        let config: IdexConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.detection.confidence_threshold, 0.3);
        assert_eq!(config.detection.tie_break, TieBreak::HighestConfidence);
        assert_eq!(config.detection.input_size, 640);
        assert_eq!(config.ocr.engine, OcrEngineKind::Crnn);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.input.max_file_size_mb, 10);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idex.json");

        let mut config = IdexConfig::default();
        config.models.model_dir = PathBuf::from("/opt/idex/models");
        config.save(&path).unwrap();

        let loaded = IdexConfig::from_file(&path).unwrap();
        assert_eq!(loaded.models.model_dir, PathBuf::from("/opt/idex/models"));
    }

    #[test]
    fn test_extension_check() {
        let input = InputConfig::default();
        assert!(input.is_allowed_extension("JPG"));
        assert!(input.is_allowed_extension("png"));
        assert!(!input.is_allowed_extension("gif"));
    }
}
