//! Data models for card extraction.

pub mod card;
pub mod config;
pub mod image;

pub use card::{AadhaarData, BoundingBox, Detection, DetectionRecord, ExtractionResponse, FieldKind};
pub use config::{DetectionConfig, IdexConfig, InputConfig, ModelConfig, OcrConfig, OcrEngineKind};
pub use image::{CardImage, ChannelOrder, PixelRect};
