//! The extraction engine: format dispatch, native-text-first PDF
//! handling, and per-page OCR fallback.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use image::DynamicImage;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::document::SourceDocument;
use crate::error::{LabrexError, Result};
use crate::models::config::LabrexConfig;
use crate::ocr::{OcrEngine, TextRecognizer};
use crate::pdf::{PdfExtractor, PdfProcessor};

use super::{ExtractOptions, ExtractionMethod, ExtractionResult, PageOutcome, SourceKind};

/// Text extraction engine with a lazily initialized OCR backend.
///
/// One extractor owns one OCR handle and one scoped temp directory.
/// Extraction calls take `&mut self` and must not overlap; for
/// concurrent throughput use one extractor per worker.
pub struct TextExtractor {
    config: LabrexConfig,
    ocr: Option<Box<dyn TextRecognizer>>,
    temp_dir: Option<TempDir>,
}

impl TextExtractor {
    /// Create an extractor. The OCR backend is not loaded until the
    /// first call that needs it.
    pub fn new(config: LabrexConfig) -> Self {
        Self {
            config,
            ocr: None,
            temp_dir: None,
        }
    }

    /// Create an extractor with a custom recognition backend instead of
    /// the lazily loaded [`OcrEngine`].
    pub fn with_recognizer(config: LabrexConfig, recognizer: Box<dyn TextRecognizer>) -> Self {
        Self {
            config,
            ocr: Some(recognizer),
            temp_dir: None,
        }
    }

    /// Extract text from one document.
    ///
    /// Images go straight to OCR. PDFs try the embedded text layer
    /// first and fall back to page-by-page OCR when the layer is too
    /// thin and `options.fallback_to_ocr` is set.
    pub fn extract(
        &mut self,
        input: &SourceDocument,
        options: &ExtractOptions,
    ) -> Result<ExtractionResult> {
        let format = input.detect_format()?;
        debug!("detected file type: {:?}", format);

        if options.ocr_language != self.config.ocr.language {
            warn!(
                "requested OCR language {:?} differs from configured model set {:?}",
                options.ocr_language, self.config.ocr.language
            );
        }

        if format.is_image() {
            self.extract_from_image(input)
        } else {
            self.extract_from_pdf(input, options)
        }
    }

    fn extract_from_image(&mut self, input: &SourceDocument) -> Result<ExtractionResult> {
        let data = match input.payload() {
            Some(bytes) => bytes.to_vec(),
            None => self.read_path(input)?,
        };
        let image = image::load_from_memory(&data)?;
        let image = clamp_dimensions(image, self.config.ocr.max_image_size);

        let engine = self.ocr_engine()?;
        let recognition = engine.recognize(&image)?;
        info!("image OCR produced {} chars", recognition.text.len());

        Ok(ExtractionResult {
            method: ExtractionMethod::Ocr,
            file_type: SourceKind::Image,
            text: recognition.text.trim().to_string(),
            pages: 1,
            confidence: Some(recognition.confidence),
            results: None,
        })
    }

    fn extract_from_pdf(
        &mut self,
        input: &SourceDocument,
        options: &ExtractOptions,
    ) -> Result<ExtractionResult> {
        let data = match input.payload() {
            Some(bytes) => {
                // In-memory payloads get a stable on-disk copy, purged
                // on shutdown.
                let spooled = self.spool(bytes)?;
                debug!("spooled PDF payload to {}", spooled.display());
                bytes.to_vec()
            }
            None => self.read_path(input)?,
        };

        let mut pdf = PdfExtractor::new();
        pdf.load(&data)?;

        let native = pdf.extract_text()?;
        if native.trim().len() > self.config.pdf.min_text_length {
            info!("direct PDF text extraction successful");
            let pages = native.split("\n\n").count() as u32;
            return Ok(ExtractionResult {
                method: ExtractionMethod::Direct,
                file_type: SourceKind::Pdf,
                text: native,
                pages,
                confidence: None,
                results: None,
            });
        }

        if !options.fallback_to_ocr {
            return Ok(ExtractionResult {
                method: ExtractionMethod::Direct,
                file_type: SourceKind::Pdf,
                text: native,
                pages: 1,
                confidence: None,
                results: None,
            });
        }

        info!("text layer too thin, falling back to PDF OCR");
        self.ocr_pdf(&pdf, options)
    }

    /// OCR every page of a loaded PDF, in ascending order, isolating
    /// per-page failures.
    fn ocr_pdf(
        &mut self,
        pdf: &dyn PdfProcessor,
        options: &ExtractOptions,
    ) -> Result<ExtractionResult> {
        let total = pdf.page_count();
        let max_size = self.config.ocr.max_image_size;
        let engine = self.ocr_engine()?;

        let mut accumulated = String::new();
        let mut outcomes = Vec::with_capacity(total as usize);

        for page in 1..=total {
            debug!("processing PDF page {}/{}", page, total);
            let recognized = pdf
                .render_page(page, options.image_quality)
                .map_err(LabrexError::from)
                .and_then(|image| {
                    let image = clamp_dimensions(image, max_size);
                    engine.recognize(&image).map_err(LabrexError::from)
                });
            match recognized {
                Ok(recognition) => {
                    accumulated.push_str(&format!(
                        "\n--- Page {} ---\n{}\n",
                        page, recognition.text
                    ));
                    outcomes.push(PageOutcome {
                        page,
                        text: recognition.text.trim().to_string(),
                        error: None,
                    });
                }
                Err(e) => {
                    // One bad page never aborts the document.
                    warn!("error processing page {}: {}", page, e);
                    outcomes.push(PageOutcome {
                        page,
                        text: String::new(),
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(ExtractionResult {
            method: ExtractionMethod::Ocr,
            file_type: SourceKind::Pdf,
            text: accumulated.trim().to_string(),
            pages: total,
            confidence: None,
            results: Some(outcomes),
        })
    }

    /// Release the OCR backend and purge spooled temp files.
    pub fn shutdown(&mut self) {
        if self.ocr.take().is_some() {
            debug!("released OCR engine");
        }
        if let Some(dir) = self.temp_dir.take() {
            if let Err(e) = dir.close() {
                warn!("failed to remove temp dir: {}", e);
            }
        }
    }

    fn ocr_engine(&mut self) -> Result<&dyn TextRecognizer> {
        if self.ocr.is_none() {
            info!("initializing OCR engine");
            self.ocr = Some(Box::new(OcrEngine::from_config(
                &self.config.models,
                &self.config.ocr,
            )?));
        }
        Ok(self.ocr.as_deref().unwrap())
    }

    fn read_path(&self, input: &SourceDocument) -> Result<Vec<u8>> {
        match input {
            SourceDocument::Path(path) => Ok(std::fs::read(path)?),
            _ => Err(LabrexError::Config(
                "document variant carries no path".to_string(),
            )),
        }
    }

    fn spool(&mut self, data: &[u8]) -> Result<PathBuf> {
        if self.temp_dir.is_none() {
            self.temp_dir = Some(tempfile::tempdir()?);
        }
        let dir = self.temp_dir.as_ref().unwrap();
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let path = dir.path().join(format!("temp_{}.pdf", stamp));
        std::fs::write(&path, data)?;
        Ok(path)
    }
}

impl Drop for TextExtractor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Shrink an image so neither side exceeds `max_size`, preserving
/// aspect ratio.
fn clamp_dimensions(image: DynamicImage, max_size: u32) -> DynamicImage {
    use image::GenericImageView;
    let (width, height) = image.dimensions();
    if width > max_size || height > max_size {
        debug!(
            "resizing {}x{} image to fit {}x{}",
            width, height, max_size, max_size
        );
        image.thumbnail(max_size, max_size)
    } else {
        image
    }
}
