//! Core library for Aadhaar card field extraction.
//!
//! This crate provides:
//! - Field detection with a YOLOv8 ONNX model
//! - Single-line region OCR (Tesseract or a CRNN ONNX model)
//! - Per-field normalization (Aadhaar number, name, date of birth, gender)
//! - The extraction pipeline tying these together

pub mod card;
pub mod detection;
pub mod error;
pub mod models;
pub mod ocr;

pub use card::{CardExtractor, CardPipeline, Extraction};
pub use detection::{FieldDetector, RegionSelector, TieBreak, YoloFieldDetector};
pub use error::{DetectionError, ExtractionError, IdexError, OcrError, RegionError, Result};
pub use models::{
    AadhaarData, BoundingBox, CardImage, ChannelOrder, Detection, DetectionRecord,
    ExtractionResponse, FieldKind, IdexConfig,
};
pub use ocr::{CrnnRecognizer, LineRecognizer, TesseractRecognizer};

/// Re-export inference types.
pub use idex_inference::{InferenceBackend, InputTensor, OutputTensor};

#[cfg(feature = "native")]
pub use idex_inference::{OrtBackend, OrtOptions};
