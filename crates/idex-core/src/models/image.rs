//! Decoded card images with explicit channel order.

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, RgbImage};

use crate::error::{ExtractionError, IdexError};
use crate::models::card::BoundingBox;

/// Byte order of the three color channels in a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// Integer pixel rectangle, half-open: `[x1, x2) x [y1, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

/// An 8-bit, 3-channel image held in memory.
#[derive(Debug, Clone)]
pub struct CardImage {
    width: u32,
    height: u32,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl CardImage {
    /// Wrap a raw interleaved pixel buffer.
    ///
    /// The buffer must hold exactly `width * height * 3` bytes and both
    /// dimensions must be non-zero.
    pub fn from_raw(
        width: u32,
        height: u32,
        order: ChannelOrder,
        data: Vec<u8>,
    ) -> Result<Self, ExtractionError> {
        if width == 0 || height == 0 {
            return Err(ExtractionError::EmptyImage);
        }

        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(ExtractionError::InvalidBuffer {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            order,
            data,
        })
    }

    /// Convert a decoded image to RGB.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self {
            width,
            height,
            order: ChannelOrder::Rgb,
            data: rgb.into_raw(),
        }
    }

    /// Decode an image file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IdexError> {
        let image = Self::from_dynamic(&image::open(path)?);
        if image.is_empty() {
            return Err(ExtractionError::EmptyImage.into());
        }
        Ok(image)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    /// True when the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel at `(x, y)` as RGB regardless of the stored order.
    fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        let p = &self.data[i..i + 3];
        match self.order {
            ChannelOrder::Rgb => [p[0], p[1], p[2]],
            ChannelOrder::Bgr => [p[2], p[1], p[0]],
        }
    }

    /// Copy into an RGB image.
    pub fn to_rgb(&self) -> RgbImage {
        if self.order == ChannelOrder::Rgb {
            if let Some(image) = RgbImage::from_raw(self.width, self.height, self.data.clone()) {
                return image;
            }
        }
        RgbImage::from_fn(self.width, self.height, |x, y| image::Rgb(self.rgb_at(x, y)))
    }

    /// Clamp a detector box to the image.
    ///
    /// Coordinates are truncated toward zero, then limited to
    /// `[0, width] x [0, height]`. Returns `None` when nothing is left.
    pub fn clamp(&self, bbox: &BoundingBox) -> Option<PixelRect> {
        let x1 = (bbox.x1 as i64).max(0);
        let y1 = (bbox.y1 as i64).max(0);
        let x2 = (bbox.x2 as i64).min(self.width as i64);
        let y2 = (bbox.y2 as i64).min(self.height as i64);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some(PixelRect {
            x1: x1 as u32,
            y1: y1 as u32,
            x2: x2 as u32,
            y2: y2 as u32,
        })
    }

    /// Crop a rectangle and convert it to grayscale.
    ///
    /// Uses ITU-R 601-2 luma on the RGB values, in the same fixed-point form
    /// as PIL's `convert('L')`.
    pub fn crop_gray(&self, rect: PixelRect) -> GrayImage {
        GrayImage::from_fn(rect.width(), rect.height(), |x, y| {
            let [r, g, b] = self.rgb_at(rect.x1 + x, rect.y1 + y);
            Luma([luma(r, g, b)])
        })
    }
}

/// ITU-R 601-2 luma (299/587/114) with rounding.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}
