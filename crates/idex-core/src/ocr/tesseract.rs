//! Line recognition through the `tesseract` command-line tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::GrayImage;
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::error::OcrError;
use crate::models::OcrConfig;

use super::LineRecognizer;

/// Recognizer that shells out to Tesseract in single-line mode.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    command: PathBuf,
    language: String,
    oem: u8,
    psm: u8,
}

impl TesseractRecognizer {
    /// Create a recognizer using `tesseract` from `PATH`, English, LSTM
    /// engine and single-line segmentation.
    pub fn new() -> Self {
        Self {
            command: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            oem: 3,
            psm: 7,
        }
    }

    /// Create a recognizer from OCR configuration.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            command: config
                .tesseract_cmd
                .clone()
                .unwrap_or_else(|| PathBuf::from("tesseract")),
            language: config.language.clone(),
            oem: config.oem,
            psm: config.psm,
        }
    }

    /// Set the tesseract binary.
    pub fn with_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.command = command.into();
        self
    }

    /// Set the recognition language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Arguments passed after the input file.
    fn args(&self) -> Vec<String> {
        vec![
            "stdout".to_string(),
            "--oem".to_string(),
            self.oem.to_string(),
            "--psm".to_string(),
            self.psm.to_string(),
            "-l".to_string(),
            self.language.clone(),
        ]
    }

    fn run(&self, image_path: &Path) -> Result<String, OcrError> {
        trace!("Running {} on {}", self.command.display(), image_path.display());

        let output = Command::new(&self.command)
            .arg(image_path)
            .args(self.args())
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::Recognition(format!(
                    "tesseract exited with {}: {}",
                    output.status,
                    stderr.trim()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::EngineUnavailable(format!(
                    "{} not found (install tesseract-ocr)",
                    self.command.display()
                )),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }

    /// Whether the tesseract binary can be started.
    pub fn is_available(&self) -> bool {
        self.version().is_some()
    }

    /// First line of `tesseract --version`.
    pub fn version(&self) -> Option<String> {
        let output = Command::new(&self.command).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }

        // Older releases print the version to stderr
        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };

        text.lines().next().map(|line| line.trim().to_string())
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineRecognizer for TesseractRecognizer {
    fn recognize_line(&self, image: &GrayImage) -> Result<String, OcrError> {
        let file = tempfile::Builder::new()
            .prefix("idex-region-")
            .suffix(".png")
            .tempfile()?;

        save_png(image, &file)?;
        let text = self.run(file.path())?;

        debug!("tesseract read {} chars", text.trim().len());
        Ok(text)
    }
}

fn save_png(image: &GrayImage, file: &NamedTempFile) -> Result<(), OcrError> {
    image
        .save_with_format(file.path(), image::ImageFormat::Png)
        .map_err(|e| OcrError::InvalidImage(format!("failed to write region: {}", e)))
}
