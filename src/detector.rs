use crate::engine::OcrEngine;
use crate::error::DetectError;
use crate::extraction::TextExtractor;
use crate::preprocessing;
use crate::resolver;
use crate::segmentation;
use std::path::Path;
use std::sync::Arc;

/// End-to-end detection pipeline: decode, preprocess, segment, OCR, resolve
pub struct MedicineDetector {
    extractor: TextExtractor,
    preprocess: bool,
}

impl MedicineDetector {
    pub fn new(engine: Arc<dyn OcrEngine>, preprocess: bool) -> Self {
        Self {
            extractor: TextExtractor::new(engine),
            preprocess,
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.extractor.engine().name()
    }

    pub fn preprocessing_enabled(&self) -> bool {
        self.preprocess
    }

    /// Predict the medicine name for an image file
    pub fn detect(&self, path: &Path) -> Result<String, DetectError> {
        let image = image::open(path).map_err(|e| DetectError::Decode(e.to_string()))?;

        let image = if self.preprocess {
            let result = preprocessing::process(image)?;
            tracing::debug!(
                "Preprocessing finished in {}ms ({:?})",
                result.total_time_ms,
                result.steps
            );
            result.image
        } else {
            image
        };

        let regions = segmentation::segment(&image);
        tracing::debug!("Found {} candidate text regions", regions.len());

        let texts = self.extractor.extract_all(&regions);
        Ok(resolver::resolve(&texts))
    }
}
