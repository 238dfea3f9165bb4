//! ONNX inference layer for idex.
//!
//! The card field detector (YOLOv8) and the CRNN line recognizer both run
//! through the [`InferenceBackend`] trait, so the core crate never touches
//! the runtime directly and tests can substitute canned outputs.
//!
//! The native backend is ONNX Runtime (`ort`) with the XNNPACK execution
//! provider.

mod backend;
mod error;
mod tensor;

pub use backend::InferenceBackend;
pub use error::InferenceError;
pub use tensor::{InputTensor, OutputTensor, TensorType};

#[cfg(feature = "native")]
pub use backend::ort::{OrtBackend, OrtOptions};

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
