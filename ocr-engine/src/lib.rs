//! Text extraction from downloaded images.
//!
//! The pipeline talks to OCR through [`TextExtractor`]. The production
//! implementation is [`TesseractExtractor`], which runs the `tesseract`
//! binary once per image and reads the recognized text from stdout.

mod format;
mod tesseract;

pub use format::{detect_format, ImageFormat};
pub use tesseract::TesseractExtractor;

use feedscribe_core::OcrError;

#[allow(async_fn_in_trait)]
pub trait TextExtractor {
    /// Returns the raw recognized text; normalization is the caller's job.
    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError>;
}
