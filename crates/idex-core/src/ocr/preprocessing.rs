//! Image preprocessing for the ONNX detector and recognizer.

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgb, RgbImage};
use ndarray::Array4;
use tracing::debug;

/// Letterbox padding value used by YOLOv8 exports.
const LETTERBOX_FILL: u8 = 114;

/// Mapping from letterboxed model coordinates back to the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Scale applied to the source image.
    pub scale: f32,
    /// Horizontal padding on the left, in model pixels.
    pub pad_x: f32,
    /// Vertical padding on the top, in model pixels.
    pub pad_y: f32,
}

impl Letterbox {
    /// Map a model-space point back to source image pixels.
    pub fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Image preprocessor for the detection and recognition models.
pub struct ImagePreprocessor {
    /// Square input size of the detection model.
    det_input_size: u32,
    /// Target height for recognition model.
    rec_target_height: u32,
    /// Maximum width for recognition model.
    rec_target_width: u32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            det_input_size: 640,
            rec_target_height: 48,
            rec_target_width: 320,
        }
    }

    /// Set the detection input size.
    pub fn with_det_input_size(mut self, size: u32) -> Self {
        self.det_input_size = size.max(32);
        self
    }

    pub fn det_input_size(&self) -> u32 {
        self.det_input_size
    }

    /// Letterbox an image into a square NCHW tensor scaled to `[0, 1]`.
    ///
    /// The image is resized to fit, keeping its aspect ratio, and centered on
    /// a gray canvas.
    pub fn preprocess_for_detection(&self, image: &RgbImage) -> (Array4<f32>, Letterbox) {
        let size = self.det_input_size;
        let (orig_width, orig_height) = image.dimensions();

        let scale = (size as f32 / orig_width.max(1) as f32)
            .min(size as f32 / orig_height.max(1) as f32);
        let new_width = ((orig_width as f32 * scale).round() as u32).clamp(1, size);
        let new_height = ((orig_height as f32 * scale).round() as u32).clamp(1, size);
        let pad_x = (size - new_width) / 2;
        let pad_y = (size - new_height) / 2;

        debug!(
            "Letterbox {}x{} -> {}x{} (scale {:.3}, pad {}x{})",
            orig_width, orig_height, new_width, new_height, scale, pad_x, pad_y
        );

        let resized = imageops::resize(image, new_width, new_height, FilterType::Triangle);
        let mut canvas = RgbImage::from_pixel(size, size, Rgb([LETTERBOX_FILL; 3]));
        imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);

        let mut tensor = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
        for (x, y, pixel) in canvas.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
            }
        }

        let letterbox = Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        };

        (tensor, letterbox)
    }

    /// Preprocess a grayscale text line for recognition.
    ///
    /// The line is resized to the target height keeping its aspect ratio
    /// (capped at the target width), replicated into three channels,
    /// normalized to `[-1, 1]` and right-padded with zeros.
    pub fn preprocess_for_recognition(&self, image: &GrayImage) -> Array4<f32> {
        let (width, height) = image.dimensions();

        let aspect_ratio = width as f32 / height.max(1) as f32;
        let target_width = (self.rec_target_height as f32 * aspect_ratio) as u32;
        let target_width = target_width.min(self.rec_target_width).max(1);

        let resized = imageops::resize(
            image,
            target_width,
            self.rec_target_height,
            FilterType::Lanczos3,
        );

        let mut tensor = Array4::<f32>::zeros((
            1,
            3,
            self.rec_target_height as usize,
            self.rec_target_width as usize,
        ));

        for (x, y, pixel) in resized.enumerate_pixels() {
            let value = (pixel[0] as f32 / 255.0 - 0.5) / 0.5;
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] = value;
            }
        }

        tensor
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_letterbox_wide_image() {
        let preprocessor = ImagePreprocessor::new();
        let image = RgbImage::from_pixel(1280, 640, Rgb([0, 0, 0]));

        let (tensor, letterbox) = preprocessor.preprocess_for_detection(&image);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_eq!(letterbox.scale, 0.5);
        assert_eq!(letterbox.pad_x, 0.0);
        assert_eq!(letterbox.pad_y, 160.0);

        // Padding rows are gray, image rows are black
        assert!((tensor[[0, 0, 10, 10]] - 114.0 / 255.0).abs() < 1e-6);
        assert_eq!(tensor[[0, 0, 320, 320]], 0.0);

        assert_eq!(letterbox.unmap(320.0, 480.0), (640.0, 640.0));
    }

    #[test]
    fn test_recognition_tensor() {
        let preprocessor = ImagePreprocessor::new();
        let line = GrayImage::from_pixel(200, 20, Luma([255]));

        let tensor = preprocessor.preprocess_for_recognition(&line);

        assert_eq!(tensor.shape(), &[1, 3, 48, 320]);
        // 200x20 at height 48 is 480 wide, capped to 320
        assert!((tensor[[0, 1, 0, 319]] - 1.0).abs() < 1e-3);

        let narrow = GrayImage::from_pixel(20, 20, Luma([255]));
        let tensor = preprocessor.preprocess_for_recognition(&narrow);
        assert!((tensor[[0, 0, 10, 40]] - 1.0).abs() < 1e-3);
        assert_eq!(tensor[[0, 0, 10, 100]], 0.0);
    }
}
