//! Core library for lab-report OCR processing.
//!
//! This crate provides:
//! - Document format detection (PDF, PNG, JPEG)
//! - Text extraction with a native-text-first, OCR-fallback strategy
//! - Heuristic parsing of lab-report text into a structured record
//!   (patient identity, test-result sections, clinical notes, signatories)

pub mod document;
pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod report;

pub use document::{DocumentFormat, SourceDocument};
pub use error::{FormatError, LabrexError, OcrError, PdfError, Result};
pub use extract::{
    ExtractOptions, ExtractionMethod, ExtractionResult, PageOutcome, SourceKind, TextExtractor,
};
pub use models::config::LabrexConfig;
pub use models::report::{LabInfo, PatientInfo, ResultValue, StructuredReport, TestResult};
pub use ocr::{OcrEngine, Recognition, TextRecognizer};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use report::{LineClass, ReportParser, classify};
