//! Aadhaar card field extraction.

pub mod extractor;
pub mod pipeline;
pub mod rules;

pub use extractor::{CardExtractor, Extraction};
pub use pipeline::CardPipeline;
