//! Input document variants and format detection.
//!
//! A [`SourceDocument`] is consumed once per pipeline run. Each variant
//! carries one authoritative format signal: a path has its extension, a
//! raw payload has its magic bytes, and an upload descriptor has both a
//! payload and a declared media type. For uploads the byte signature
//! wins; the declared media type is only consulted when the signature is
//! unrecognized.

use std::path::PathBuf;

use crate::error::FormatError;

/// File extensions accepted by the pipeline.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = [".pdf", ".png", ".jpg", ".jpeg"];

/// Detected document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// A PDF document (native text layer or scanned pages).
    Pdf,
    /// A PNG image.
    Png,
    /// A JPEG image (`.jpg` and `.jpeg`).
    Jpeg,
}

impl DocumentFormat {
    /// Whether this format is a raster image (as opposed to a PDF).
    pub fn is_image(&self) -> bool {
        !matches!(self, DocumentFormat::Pdf)
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(DocumentFormat::Pdf),
            "png" => Some(DocumentFormat::Png),
            "jpg" | "jpeg" => Some(DocumentFormat::Jpeg),
            _ => None,
        }
    }

    fn from_magic(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"%PDF") {
            Some(DocumentFormat::Pdf)
        } else if data.starts_with(&[0x89, 0x50, 0x4e, 0x47]) {
            Some(DocumentFormat::Png)
        } else if data.starts_with(&[0xff, 0xd8]) {
            Some(DocumentFormat::Jpeg)
        } else {
            None
        }
    }

    fn from_media_type(content_type: &str) -> Option<Self> {
        match content_type {
            "application/pdf" => Some(DocumentFormat::Pdf),
            "image/png" => Some(DocumentFormat::Png),
            "image/jpeg" | "image/jpg" => Some(DocumentFormat::Jpeg),
            _ => None,
        }
    }
}

/// A single input to the extraction pipeline.
#[derive(Debug, Clone)]
pub enum SourceDocument {
    /// A document on the local filesystem.
    Path(PathBuf),
    /// A raw in-memory payload.
    Bytes(Vec<u8>),
    /// An upload descriptor: payload plus declared media type and original name.
    Upload {
        data: Vec<u8>,
        content_type: String,
        filename: String,
    },
}

impl SourceDocument {
    /// Detect the document format from whichever signal this variant carries.
    pub fn detect_format(&self) -> Result<DocumentFormat, FormatError> {
        match self {
            SourceDocument::Path(path) => {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_lowercase();
                DocumentFormat::from_extension(&ext).ok_or(FormatError::Unsupported {
                    detected: format!(".{ext}"),
                })
            }
            SourceDocument::Bytes(data) => {
                DocumentFormat::from_magic(data).ok_or(FormatError::Unsupported {
                    detected: "unknown signature".to_string(),
                })
            }
            SourceDocument::Upload {
                data, content_type, ..
            } => DocumentFormat::from_magic(data)
                .or_else(|| DocumentFormat::from_media_type(content_type))
                .ok_or(FormatError::Unsupported {
                    detected: content_type.clone(),
                }),
        }
    }

    /// Borrow the in-memory payload, if this variant carries one.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            SourceDocument::Path(_) => None,
            SourceDocument::Bytes(data) => Some(data),
            SourceDocument::Upload { data, .. } => Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_from_extension() {
        for (name, expected) in [
            ("report.pdf", DocumentFormat::Pdf),
            ("scan.PNG", DocumentFormat::Png),
            ("photo.jpg", DocumentFormat::Jpeg),
            ("photo.JPEG", DocumentFormat::Jpeg),
        ] {
            let doc = SourceDocument::Path(PathBuf::from(name));
            assert_eq!(doc.detect_format().unwrap(), expected);
        }
    }

    #[test]
    fn test_reject_unknown_extension() {
        let doc = SourceDocument::Path(PathBuf::from("report.docx"));
        let err = doc.detect_format().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(".docx"));
        assert!(msg.contains(".pdf, .png, .jpg, .jpeg"));
    }

    #[test]
    fn test_detect_from_magic_bytes() {
        let pdf = SourceDocument::Bytes(b"%PDF-1.7 rest".to_vec());
        assert_eq!(pdf.detect_format().unwrap(), DocumentFormat::Pdf);

        let png = SourceDocument::Bytes(vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a]);
        assert_eq!(png.detect_format().unwrap(), DocumentFormat::Png);

        let jpeg = SourceDocument::Bytes(vec![0xff, 0xd8, 0xff, 0xe0]);
        assert_eq!(jpeg.detect_format().unwrap(), DocumentFormat::Jpeg);

        let other = SourceDocument::Bytes(b"GIF89a".to_vec());
        assert!(other.detect_format().is_err());
    }

    #[test]
    fn test_detect_from_media_type() {
        for (mime, expected) in [
            ("application/pdf", DocumentFormat::Pdf),
            ("image/png", DocumentFormat::Png),
            ("image/jpeg", DocumentFormat::Jpeg),
            ("image/jpg", DocumentFormat::Jpeg),
        ] {
            let doc = SourceDocument::Upload {
                // Payload with no recognizable signature, so the declared
                // media type decides.
                data: b"xxxx".to_vec(),
                content_type: mime.to_string(),
                filename: "upload.bin".to_string(),
            };
            assert_eq!(doc.detect_format().unwrap(), expected);
        }
    }

    #[test]
    fn test_upload_signature_beats_media_type() {
        let doc = SourceDocument::Upload {
            data: b"%PDF-1.4".to_vec(),
            content_type: "image/png".to_string(),
            filename: "mislabeled.png".to_string(),
        };
        assert_eq!(doc.detect_format().unwrap(), DocumentFormat::Pdf);
    }

    #[test]
    fn test_reject_unknown_media_type() {
        let doc = SourceDocument::Upload {
            data: b"plain text".to_vec(),
            content_type: "text/plain".to_string(),
            filename: "notes.txt".to_string(),
        };
        let err = doc.detect_format().unwrap_err();
        assert!(err.to_string().contains("text/plain"));
    }
}
