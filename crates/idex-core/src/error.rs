//! Error types for the idex-core library.

use thiserror::Error;

/// Main error type for the idex library.
#[derive(Error, Debug)]
pub enum IdexError {
    /// Field detection error.
    #[error("detection error: {0}")]
    Detection(#[from] DetectionError),

    /// OCR collaborator error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Card extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Inference error from the inference layer.
    #[error("inference error: {0}")]
    Inference(#[from] idex_inference::InferenceError),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by a field detector.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// Failed to load the detector model.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// The model run failed.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The model produced output of an unexpected shape or type.
    #[error("unexpected model output: {0}")]
    InvalidOutput(String),
}

/// Errors raised by an OCR collaborator.
///
/// An engine that runs and finds no text returns `Ok` with an empty string;
/// these variants are reserved for the engine itself failing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load recognition models or dictionaries.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The engine is not installed or cannot be started.
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine ran but reported a failure.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Region preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// The region could not be handed to the engine.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// I/O error while exchanging data with the engine.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to card extraction inputs.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Raw pixel buffer length does not match the declared dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} 3-channel image")]
    InvalidBuffer {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// The image has no pixels.
    #[error("image has zero width or height")]
    EmptyImage,
}

/// Per-field failures inside the region OCR adapter.
///
/// These never escape extraction: the adapter logs them and the field's
/// value becomes `None`.
#[derive(Error, Debug)]
pub enum RegionError {
    /// The bounding box clamped to a zero-area region.
    #[error("empty region for {label}")]
    EmptyRegion { label: String },

    /// The OCR collaborator failed on this region.
    #[error("OCR failed for {label}: {source}")]
    OcrEngine {
        label: String,
        #[source]
        source: OcrError,
    },
}

/// Result type for the idex library.
pub type Result<T> = std::result::Result<T, IdexError>;
