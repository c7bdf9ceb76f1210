//! Tesseract engine implementation
//!
//! Uses the tesseract-static crate for static linking (no system
//! dependencies). Downloads tessdata (training data) automatically on first
//! use when no directory is configured.

use crate::config::Config;
use crate::engine::{OcrEngine, Recognition, TokenReading};
use crate::error::DetectError;
use image::DynamicImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tesseract_static::tesseract::Tesseract;

/// Page segmentation mode 11: sparse text, no assumed paragraph or column
/// structure. Package photos scatter words across the label.
const SPARSE_TEXT_PSM: &str = "11";

/// Tesseract OCR Engine
pub struct TesseractEngine {
    /// Path to tessdata directory
    tessdata_path: String,
    /// Language for OCR
    language: String,
}

impl TesseractEngine {
    /// Create a new Tesseract-based OCR engine
    pub fn new(config: &Config) -> Result<Self, DetectError> {
        let language = config.language.clone();

        let tessdata_path = match &config.tessdata_path {
            Some(path) => path.clone(),
            None => ensure_tessdata_available(&language)?,
        };

        // Validate that tessdata is accessible by doing a test initialization
        let probe = Tesseract::new(Some(&tessdata_path), Some(&language)).map_err(|e| {
            DetectError::Initialization(format!("Failed to initialize Tesseract: {}", e))
        })?;
        drop(probe);

        tracing::info!(
            "Tesseract engine initialized (tessdata: {}, language: {})",
            tessdata_path,
            language
        );

        Ok(Self {
            tessdata_path,
            language,
        })
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn description(&self) -> &'static str {
        "Statically linked Tesseract with sparse-text page segmentation"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<Recognition, DetectError> {
        // Convert to RGB8 for consistent handling
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        // Convert to BMP in memory (BMP is always supported by leptonica)
        let mut bmp_data = Vec::new();
        {
            let mut cursor = std::io::Cursor::new(&mut bmp_data);
            rgb.write_to(&mut cursor, image::ImageFormat::Bmp)
                .map_err(|e| DetectError::Ocr(format!("Failed to convert to BMP: {}", e)))?;
        }

        let mut tess = Tesseract::new(Some(&self.tessdata_path), Some(&self.language))
            .map_err(|e| DetectError::Ocr(format!("Failed to create Tesseract: {}", e)))?;

        tess = tess
            .set_variable("tessedit_pageseg_mode", SPARSE_TEXT_PSM)
            .map_err(|e| {
                DetectError::Ocr(format!("Failed to set page segmentation mode: {}", e))
            })?;

        tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            DetectError::Ocr(format!(
                "Failed to set image ({}x{}, {} bytes): {}",
                width,
                height,
                bmp_data.len(),
                e
            ))
        })?;

        tess = tess
            .recognize()
            .map_err(|e| DetectError::Ocr(format!("Failed to recognize text: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| DetectError::Ocr(format!("Failed to get text: {}", e)))?;

        let tsv = tess
            .get_tsv_text(0)
            .map_err(|e| DetectError::Ocr(format!("Failed to get word data: {}", e)))?;
        let tokens = parse_word_records(&tsv);

        tracing::debug!(
            "Recognized {} words in {}x{} image (mean confidence {})",
            tokens.len(),
            width,
            height,
            tess.mean_text_conf()
        );

        Ok(Recognition {
            text: text.trim().to_string(),
            tokens,
        })
    }
}

/// Parse Tesseract TSV output into per-word records.
///
/// Word rows have level 5 and a non-negative confidence; page, block,
/// paragraph, and line rows are skipped.
fn parse_word_records(tsv: &str) -> Vec<TokenReading> {
    tsv.lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() != 12 || cols[0] != "5" {
                return None;
            }
            let confidence: f32 = cols[10].parse().ok()?;
            if confidence < 0.0 {
                return None;
            }
            let height: u32 = cols[9].parse().ok()?;
            let text = cols[11].trim();
            if text.is_empty() {
                return None;
            }
            Some(TokenReading {
                text: text.to_string(),
                confidence,
                height,
            })
        })
        .collect()
}

// ============================================================================
// Tessdata download helpers
// ============================================================================

/// Ensure tessdata is available, downloading if needed
fn ensure_tessdata_available(language: &str) -> Result<String, DetectError> {
    // Get cache directory for tessdata
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("medscan")
        .join("tessdata");

    std::fs::create_dir_all(&cache_dir).map_err(|e| {
        DetectError::Initialization(format!("Failed to create tessdata directory: {}", e))
    })?;

    let traineddata_file = format!("{}.traineddata", language);
    let traineddata_path = cache_dir.join(&traineddata_file);

    // Download if not cached
    if !traineddata_path.exists() {
        let url = tessdata_url(language);
        tracing::info!(
            "Downloading tessdata for '{}' (this may take a moment)...",
            language
        );
        download_file(&url, &traineddata_path)?;
        tracing::info!("Downloaded tessdata to {:?}", traineddata_path);
    } else {
        tracing::info!("Using cached tessdata from {:?}", cache_dir);
    }

    // Return the directory path (Tesseract expects the directory, not the file)
    cache_dir
        .to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| DetectError::Initialization("Invalid tessdata path".to_string()))
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // Use tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), DetectError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| DetectError::Initialization(format!("Failed to download tessdata: {}", e)))?;

    let mut file = File::create(path).map_err(|e| {
        DetectError::Initialization(format!("Failed to create tessdata file: {}", e))
    })?;

    // Read response body and write to file
    let buffer = response.into_body().read_to_vec().map_err(|e| {
        DetectError::Initialization(format!("Failed to read tessdata response: {}", e))
    })?;

    file.write_all(&buffer).map_err(|e| {
        DetectError::Initialization(format!("Failed to write tessdata file: {}", e))
    })?;

    Ok(())
}
