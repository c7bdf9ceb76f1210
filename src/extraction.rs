use crate::engine::OcrEngine;
use crate::segmentation::Region;
use std::sync::Arc;

/// Runs the OCR engine over each candidate region independently
pub struct TextExtractor {
    engine: Arc<dyn OcrEngine>,
}

impl TextExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &dyn OcrEngine {
        self.engine.as_ref()
    }

    /// OCR every region, trimming surrounding whitespace. A failure on one
    /// region is logged and skipped so the remaining regions still
    /// contribute to the prediction.
    pub fn extract_all(&self, regions: &[Region]) -> Vec<String> {
        regions
            .iter()
            .filter_map(|region| match self.engine.recognize(&region.pixels) {
                Ok(recognition) => {
                    if !recognition.tokens.is_empty() {
                        let mean_confidence = recognition
                            .tokens
                            .iter()
                            .map(|t| t.confidence)
                            .sum::<f32>()
                            / recognition.tokens.len() as f32;
                        tracing::debug!(
                            "Region {}x{} at ({}, {}): {} words, mean confidence {:.1}",
                            region.width,
                            region.height,
                            region.x,
                            region.y,
                            recognition.tokens.len(),
                            mean_confidence
                        );
                    }
                    Some(recognition.text.trim().to_string())
                }
                Err(e) => {
                    tracing::warn!(
                        "OCR failed on region {}x{} at ({}, {}), skipping: {}",
                        region.width,
                        region.height,
                        region.x,
                        region.y,
                        e
                    );
                    None
                }
            })
            .collect()
    }
}
