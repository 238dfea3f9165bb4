//! Inference backend implementations.

#[cfg(feature = "native")]
pub mod ort;

use crate::{InputTensor, OutputTensor, Result};

/// A loaded ONNX model that can be run on named inputs.
///
/// Implementations must be shareable across threads; a backend that wraps a
/// non-reentrant session serializes calls internally.
pub trait InferenceBackend: Send + Sync {
    /// Run the model on named input tensors and return named outputs in
    /// model order.
    fn run(&self, inputs: &[(&str, InputTensor)]) -> Result<Vec<(String, OutputTensor)>>;

    /// Input names declared by the model.
    fn input_names(&self) -> &[String];

    /// Output names declared by the model.
    fn output_names(&self) -> &[String];
}
