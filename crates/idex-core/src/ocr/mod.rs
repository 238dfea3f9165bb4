//! Text recognition for detected card regions.
//!
//! The pipeline only needs single-line recognition of a grayscale crop, so
//! OCR engines plug in through [`LineRecognizer`]. Two engines are provided:
//! the `tesseract` command-line tool and a CRNN ONNX model.

mod preprocessing;
mod recognizer;
mod region;
mod tesseract;

pub use preprocessing::{ImagePreprocessor, Letterbox};
pub use recognizer::CrnnRecognizer;
pub use region::{recognize_field, try_recognize_field};
pub use tesseract::TesseractRecognizer;

use image::GrayImage;

use crate::error::OcrError;

/// An OCR engine operating in single-line mode.
///
/// `Ok` with empty text means the engine ran and found nothing; `Err` means
/// the engine itself failed.
pub trait LineRecognizer: Send + Sync {
    /// Read one line of text from a grayscale image.
    fn recognize_line(&self, image: &GrayImage) -> Result<String, OcrError>;
}

impl<R: LineRecognizer + ?Sized> LineRecognizer for Box<R> {
    fn recognize_line(&self, image: &GrayImage) -> Result<String, OcrError> {
        (**self).recognize_line(image)
    }
}

impl<R: LineRecognizer + ?Sized> LineRecognizer for &R {
    fn recognize_line(&self, image: &GrayImage) -> Result<String, OcrError> {
        (**self).recognize_line(image)
    }
}
