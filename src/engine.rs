use crate::error::DetectError;
use image::DynamicImage;

/// One recognized word: its text, the engine's confidence (0-100), and the
/// word's pixel height in the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenReading {
    pub text: String,
    pub confidence: f32,
    pub height: u32,
}

/// OCR output for a single image.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    /// Full recognized text.
    pub text: String,
    /// Per-word records, in reading order.
    pub tokens: Vec<TokenReading>,
}

/// Trait the OCR backend must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "tesseract")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize text in an image
    fn recognize(&self, image: &DynamicImage) -> Result<Recognition, DetectError>;
}
