//! Image preprocessing for OCR enhancement
//!
//! Normalizes an uploaded photo before segmentation and text extraction.

pub mod pipeline;
pub mod steps;

pub use pipeline::{process, PreprocessingResult, StepTiming};
