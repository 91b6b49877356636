//! Document extraction: turns an uploaded resume into plain text.
//!
//! The format is picked from the declared file name only. There is no OCR and no
//! layout reconstruction: text comes out in document order, as the parser sees it.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

mod docx;
mod pdf;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type for '{file_name}'. Please upload a PDF or DOCX resume.")]
    UnsupportedFormat { file_name: String },

    #[error("Could not read PDF: {0}")]
    Pdf(String),

    #[error("Could not read DOCX: {0}")]
    Docx(String),

    /// The extraction task itself died, whatever the format.
    #[error("Could not read '{file_name}': extraction did not complete ({reason})")]
    Interrupted { file_name: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolves the format from the file extension, ignoring case.
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractionError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            _ => Err(ExtractionError::UnsupportedFormat {
                file_name: file_name.to_string(),
            }),
        }
    }
}

/// Extracts plain text from a resume upload.
///
/// PDF pages are concatenated with no separator; DOCX body paragraphs each end with `\n`.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    match DocumentFormat::from_file_name(file_name)? {
        DocumentFormat::Pdf => pdf::extract_pdf_text(bytes),
        DocumentFormat::Docx => docx::extract_docx_text(bytes),
    }
}
