//! OCR collaborator built on `pure-onnx-ocr`.

mod engine;

pub use engine::OcrEngine;

use image::DynamicImage;

use crate::error::OcrError;

/// Recognition backend consumed by the extraction engine.
///
/// The bundled implementation is [`OcrEngine`]; the trait is the seam
/// for alternative backends.
pub trait TextRecognizer {
    /// Recognize text in an image.
    fn recognize(&self, image: &DynamicImage) -> Result<Recognition, OcrError>;
}

/// Text recognized from one image.
#[derive(Debug, Clone)]
pub struct Recognition {
    /// Recognized text, regions joined with newlines in reading order.
    pub text: String,

    /// Mean recognition confidence across regions (0.0 - 1.0).
    pub confidence: f32,
}
