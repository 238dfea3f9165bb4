//! ONNX Runtime (ort) backend with the XNNPACK execution provider.

use std::path::Path;
use std::sync::Mutex;

use ndarray::{ArrayD, IxDyn};
use ort::ep::XNNPACK;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputValue};
use ort::value::Tensor;
use tracing::debug;

use crate::error::InferenceError;
use crate::tensor::{InputTensor, OutputTensor};
use crate::{InferenceBackend, Result};

/// Session options for [`OrtBackend`].
#[derive(Debug, Clone, Copy)]
pub struct OrtOptions {
    /// Intra-op thread count.
    pub intra_threads: usize,
}

impl Default for OrtOptions {
    fn default() -> Self {
        Self { intra_threads: 4 }
    }
}

/// Backend using ONNX Runtime for native inference.
///
/// The session is not reentrant, so runs are serialized behind a mutex.
pub struct OrtBackend {
    session: Mutex<Session>,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

impl OrtBackend {
    /// Load a model from a file path with default options.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with_options(path, OrtOptions::default())
    }

    /// Load a model from a file path.
    pub fn from_file_with_options<P: AsRef<Path>>(path: P, options: OrtOptions) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading ONNX model from: {}", path.display());

        let bytes = std::fs::read(path).map_err(|source| InferenceError::ModelFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes_with_options(&bytes, options)
    }

    /// Load a model from bytes with default options.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(bytes, OrtOptions::default())
    }

    /// Load a model from bytes.
    pub fn from_bytes_with_options(bytes: &[u8], options: OrtOptions) -> Result<Self> {
        debug!(
            "Creating ONNX session from {} bytes ({} threads)",
            bytes.len(),
            options.intra_threads
        );

        let session = Session::builder()
            .map_err(|e| InferenceError::SessionSetup(e.to_string()))?
            .with_execution_providers([XNNPACK::default().build()])
            .map_err(|e| InferenceError::SessionSetup(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::SessionSetup(e.to_string()))?
            .with_intra_threads(options.intra_threads.max(1))
            .map_err(|e| InferenceError::SessionSetup(e.to_string()))?
            .commit_from_memory(bytes)
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|i| i.name().to_string())
            .collect();

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        debug!("Model inputs: {:?}, outputs: {:?}", input_names, output_names);

        Ok(Self {
            session: Mutex::new(session),
            input_names,
            output_names,
        })
    }
}

fn to_session_input(name: &str, tensor: &InputTensor) -> Result<SessionInputValue<'static>> {
    let invalid = |reason: String| InferenceError::InvalidInput {
        name: name.to_string(),
        reason,
    };

    match tensor {
        InputTensor::Float32(arr) => {
            let shape: Vec<i64> = arr.shape().iter().map(|&s| s as i64).collect();
            let data: Vec<f32> = arr.iter().copied().collect();
            Tensor::from_array((shape, data))
                .map(Into::into)
                .map_err(|e| invalid(e.to_string()))
        }
        InputTensor::Int64(arr) => {
            let shape: Vec<i64> = arr.shape().iter().map(|&s| s as i64).collect();
            let data: Vec<i64> = arr.iter().copied().collect();
            Tensor::from_array((shape, data))
                .map(Into::into)
                .map_err(|e| invalid(e.to_string()))
        }
    }
}

fn to_array<'a, T: Clone>(
    name: &str,
    shape: impl IntoIterator<Item = &'a i64>,
    data: &[T],
) -> Result<ArrayD<T>> {
    let shape: Vec<usize> = shape.into_iter().map(|&s| s as usize).collect();
    ArrayD::from_shape_vec(IxDyn(&shape), data.to_vec()).map_err(|e| {
        InferenceError::MalformedOutput {
            name: name.to_string(),
            reason: e.to_string(),
        }
    })
}

impl InferenceBackend for OrtBackend {
    fn run(&self, inputs: &[(&str, InputTensor)]) -> Result<Vec<(String, OutputTensor)>> {
        let ort_inputs: Vec<(&str, SessionInputValue<'static>)> = inputs
            .iter()
            .map(|(name, tensor)| Ok((*name, to_session_input(name, tensor)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::SessionPoisoned)?;

        let outputs = session
            .run(ort_inputs)
            .map_err(|e| InferenceError::Run(e.to_string()))?;

        let mut results = Vec::with_capacity(outputs.len());

        for (name, value) in outputs.iter() {
            let tensor = if let Ok((shape, data)) = value.try_extract_tensor::<f32>() {
                OutputTensor::Float32(to_array(name, shape.iter(), data)?)
            } else if let Ok((shape, data)) = value.try_extract_tensor::<i64>() {
                OutputTensor::Int64(to_array(name, shape.iter(), data)?)
            } else {
                return Err(InferenceError::UnsupportedOutput(name.to_string()));
            };

            results.push((name.to_string(), tensor));
        }

        Ok(results)
    }

    fn input_names(&self) -> &[String] {
        &self.input_names
    }

    fn output_names(&self) -> &[String] {
        &self.output_names
    }
}
