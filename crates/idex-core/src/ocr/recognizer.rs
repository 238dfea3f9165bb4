//! Single-line text recognition with a CRNN/CTC ONNX model.

use std::path::Path;

use image::GrayImage;
use ndarray::ArrayD;
use tracing::{debug, trace};

use crate::error::OcrError;
use idex_inference::{InferenceBackend, InputTensor, OutputTensor};

use super::preprocessing::ImagePreprocessor;
use super::LineRecognizer;

/// Line recognizer using a CRNN model with greedy CTC decoding.
pub struct CrnnRecognizer<B: InferenceBackend> {
    backend: B,
    preprocessor: ImagePreprocessor,
    dictionary: Vec<char>,
}

impl<B: InferenceBackend> CrnnRecognizer<B> {
    /// Create a new recognizer. Index 0 of the dictionary is the CTC blank.
    pub fn new(backend: B, dictionary: Vec<char>) -> Self {
        Self {
            backend,
            preprocessor: ImagePreprocessor::new(),
            dictionary,
        }
    }

    /// Load dictionary from a file with one character per line.
    pub fn load_dictionary(path: &Path) -> Result<Vec<char>, OcrError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| OcrError::ModelLoad(format!("Failed to load dictionary: {}", e)))?;

        let mut chars: Vec<char> = vec![' '];
        chars.extend(content.lines().filter_map(|line| line.chars().next()));
        // PaddleOCR-style models end with a space class
        chars.push(' ');

        debug!("Loaded dictionary with {} characters", chars.len());
        Ok(chars)
    }

    /// Built-in dictionary covering the text printed on Aadhaar cards.
    pub fn default_latin_dictionary() -> Vec<char> {
        let mut chars = vec![' '];

        chars.extend('0'..='9');
        chars.extend('A'..='Z');
        chars.extend('a'..='z');
        chars.extend([
            '.', ',', ';', ':', '!', '?', '-', '_', '/', '\\', '(', ')', '[', ']', '\'', '"', '&',
            '#', '@', '+', ' ',
        ]);

        chars
    }

    fn decode_output(&self, output: &ArrayD<f32>) -> Result<String, OcrError> {
        // [1, T, num_classes]
        let shape = output.shape();
        if shape.len() != 3 {
            return Err(OcrError::Recognition(format!(
                "Invalid output shape: {:?}",
                shape
            )));
        }

        let (seq_len, num_classes) = (shape[1], shape[2]);
        let mut text = String::new();
        let mut prev_idx = 0usize;

        for t in 0..seq_len {
            let mut max_idx = 0;
            let mut max_val = f32::NEG_INFINITY;

            for c in 0..num_classes {
                let val = output[[0, t, c]];
                if val > max_val {
                    max_val = val;
                    max_idx = c;
                }
            }

            // Skip blanks and repeats
            if max_idx != 0 && max_idx != prev_idx {
                if let Some(&c) = self.dictionary.get(max_idx) {
                    text.push(c);
                }
            }

            prev_idx = max_idx;
        }

        trace!("CTC decoded: '{}'", text);
        Ok(text)
    }
}

impl<B: InferenceBackend> LineRecognizer for CrnnRecognizer<B> {
    fn recognize_line(&self, image: &GrayImage) -> Result<String, OcrError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrError::InvalidImage("empty line image".to_string()));
        }

        let tensor = self.preprocessor.preprocess_for_recognition(image);
        let input_name = self
            .backend
            .input_names()
            .first()
            .cloned()
            .unwrap_or_else(|| "x".to_string());

        let outputs = self
            .backend
            .run(&[(input_name.as_str(), InputTensor::Float32(tensor.into_dyn()))])
            .map_err(|e| OcrError::Recognition(e.to_string()))?;

        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| OcrError::Recognition("No output from model".to_string()))?
            .1;

        match output {
            OutputTensor::Float32(arr) => self.decode_output(&arr),
            _ => Err(OcrError::Recognition("Unexpected output type".to_string())),
        }
    }
}
