//! Error types for the inference layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading the detector or recognizer model, or running it.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The model file could not be read.
    #[error("cannot read model {}: {source}", .path.display())]
    ModelFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Session builder options (execution provider, threads, optimization)
    /// were rejected by the runtime.
    #[error("session setup failed: {0}")]
    SessionSetup(String),

    /// The model bytes are not a loadable ONNX graph.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Flat tensor data does not fill the requested shape.
    #[error("tensor data does not fit shape {shape:?}: {reason}")]
    InputShape { shape: Vec<usize>, reason: String },

    /// An input tensor could not be handed to the runtime.
    #[error("invalid input '{name}': {reason}")]
    InvalidInput { name: String, reason: String },

    /// A previous run panicked while holding the session.
    #[error("session unusable after an earlier panic")]
    SessionPoisoned,

    /// The runtime reported a failure during execution.
    #[error("inference failed: {0}")]
    Run(String),

    /// An output tensor was neither `f32` nor `i64`.
    #[error("unsupported element type for output '{0}'")]
    UnsupportedOutput(String),

    /// An output tensor's data did not match its reported shape.
    #[error("malformed output '{name}': {reason}")]
    MalformedOutput { name: String, reason: String },
}
