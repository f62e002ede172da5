//! Text extraction: native PDF text layer first, OCR fallback.

mod engine;

pub use engine::TextExtractor;

use serde::{Deserialize, Serialize};

/// How the text in an [`ExtractionResult`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Embedded PDF text layer.
    Direct,
    /// Optical recognition over rasterized pages or an image payload.
    Ocr,
}

/// The kind of document the text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Pdf,
    Image,
}

/// Per-page outcome of a PDF OCR run.
///
/// A page carries either recognized text or an error message, never
/// both; a failed page has empty text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageOutcome {
    pub page: u32,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Text extracted from one document, with extraction metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub method: ExtractionMethod,

    #[serde(rename = "fileType")]
    pub file_type: SourceKind,

    pub text: String,

    pub pages: u32,

    /// Mean recognition confidence; image OCR only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    /// Per-page outcomes in ascending page order; PDF OCR only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<PageOutcome>>,
}

/// Per-call extraction options.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Requested recognition language. The model set actually loaded
    /// comes from `ModelConfig`; a request that differs from the
    /// configured language is logged, not honored.
    pub ocr_language: String,

    /// Requested density in dpi for PDF page rasters. Advisory: a page
    /// whose raster is recovered from its embedded scan image comes
    /// back at the stored resolution regardless of this value.
    pub image_quality: u32,

    /// Fall back to OCR when the PDF text layer is too thin.
    pub fallback_to_ocr: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            ocr_language: "eng".to_string(),
            image_quality: 300,
            fallback_to_ocr: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_result_wire_format() {
        let result = ExtractionResult {
            method: ExtractionMethod::Direct,
            file_type: SourceKind::Pdf,
            text: "hello".to_string(),
            pages: 2,
            confidence: None,
            results: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["method"], "direct");
        assert_eq!(json["fileType"], "pdf");
        assert_eq!(json["pages"], 2);
        assert!(json.get("confidence").is_none());
        assert!(json.get("results").is_none());
    }

    #[test]
    fn test_page_outcome_error_serialization() {
        let ok = PageOutcome {
            page: 1,
            text: "text".to_string(),
            error: None,
        };
        let failed = PageOutcome {
            page: 2,
            text: String::new(),
            error: Some("render failed".to_string()),
        };
        let json = serde_json::to_value(&[ok, failed]).unwrap();
        assert!(json[0].get("error").is_none());
        assert_eq!(json[1]["error"], "render failed");
        assert_eq!(json[1]["text"], "");
    }

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert_eq!(options.ocr_language, "eng");
        assert_eq!(options.image_quality, 300);
        assert!(options.fallback_to_ocr);
    }
}
