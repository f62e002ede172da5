//! PDF processing module.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for the PDF collaborator consumed by the extraction engine.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract the embedded text layer from the entire PDF.
    fn extract_text(&self) -> Result<String>;

    /// Produce a raster image for one page. The density is advisory:
    /// an implementation that recovers the page's embedded scan image
    /// returns it at its stored resolution.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage>;
}
