//! Configuration structures for the labrex pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the labrex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabrexConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Report parser configuration.
    pub parser: ParserConfig,

    /// Model file locations.
    pub models: ModelConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Language the configured model set covers; requests for a
    /// different language are flagged at extraction time.
    pub language: String,

    /// Maximum image dimension (either side) fed to recognition.
    pub max_image_size: u32,

    /// Keep `[UNK]` placeholder tokens instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            max_image_size: 2000,
            keep_unk: false,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Requested density for PDF page rasters. Pages recovered from
    /// their embedded scan image keep the stored resolution.
    pub render_dpi: u32,

    /// Fall back to per-page OCR when the text layer is too thin.
    pub fallback_to_ocr: bool,

    /// Minimum trimmed text length to accept the embedded text layer.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            fallback_to_ocr: true,
            min_text_length: 50,
        }
    }
}

/// Report parser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Literal lab name to probe the report header for.
    pub lab_name: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            lab_name: "Labsmart Software".to_string(),
        }
    }
}

/// Model file paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl LabrexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let config = LabrexConfig::default();
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.max_image_size, 2000);
        assert_eq!(config.pdf.render_dpi, 300);
        assert_eq!(config.pdf.min_text_length, 50);
        assert!(config.pdf.fallback_to_ocr);
        assert_eq!(config.parser.lab_name, "Labsmart Software");
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = LabrexConfig::default();
        config.pdf.render_dpi = 150;
        config.parser.lab_name = "Acme Diagnostics".to_string();
        config.save(&path).unwrap();

        let loaded = LabrexConfig::from_file(&path).unwrap();
        assert_eq!(loaded.pdf.render_dpi, 150);
        assert_eq!(loaded.parser.lab_name, "Acme Diagnostics");
        // Untouched sections come back as defaults.
        assert_eq!(loaded.pdf.min_text_length, 50);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"ocr": {"language": "lat"}}"#).unwrap();

        let loaded = LabrexConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.language, "lat");
        assert_eq!(loaded.ocr.max_image_size, 2000);
    }
}
