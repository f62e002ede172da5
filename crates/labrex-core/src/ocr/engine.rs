//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::{ModelConfig, OcrConfig};

use super::{Recognition, TextRecognizer};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
///
/// One engine holds the loaded detection/recognition models; recognition
/// calls on it are not safe to overlap, which the owning extractor
/// enforces by taking `&mut self` on its public entry point.
pub struct OcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

impl OcrEngine {
    /// Load an engine from the configured model directory.
    pub fn from_config(models: &ModelConfig, ocr: &OcrConfig) -> Result<Self, OcrError> {
        let det_path = models.model_dir.join(&models.detection_model);
        let rec_path = models.model_dir.join(&models.recognition_model);
        let dict_path = models.model_dir.join(&models.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("loaded OCR models from {}", models.model_dir.display());

        Ok(Self {
            engine,
            keep_unk: ocr.keep_unk,
        })
    }
}

impl TextRecognizer for OcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<Recognition, OcrError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage("zero-sized image".to_string()));
        }
        debug!("recognizing {}x{} image", width, height);

        let items = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        // (y, x, confidence, text) per detected region
        let mut regions: Vec<(f32, f32, f32, String)> = items
            .iter()
            .map(|r| {
                let (x, y) = polygon_origin(&r.bounding_box);
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                (y, x, r.confidence, text)
            })
            .collect();

        // Reading order: bucket rows by vertical position, then left to right.
        regions.sort_by(|a, b| {
            let row_a = (a.0 / 20.0) as i32;
            let row_b = (b.0 / 20.0) as i32;
            if row_a != row_b {
                row_a.cmp(&row_b)
            } else {
                a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)
            }
        });

        let confidence = if regions.is_empty() {
            0.0
        } else {
            regions.iter().map(|r| r.2).sum::<f32>() / regions.len() as f32
        };

        let text = regions
            .iter()
            .map(|r| r.3.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        debug!("recognized {} text regions", regions.len());

        Ok(Recognition { text, confidence })
    }
}

/// Top-left corner of a detection polygon.
fn polygon_origin(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32) {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    for coord in polygon.exterior().coords() {
        min_x = min_x.min(coord.x as f32);
        min_y = min_y.min(coord.y as f32);
    }
    (min_x, min_y)
}
