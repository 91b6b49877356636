use std::panic;

use super::ExtractionError;

/// Extracts every page's text layer in order and concatenates them with no separator.
///
/// Pages without a text layer contribute an empty string. pdf-extract can panic on
/// malformed input, so the call is unwound and reported as a parse failure.
pub(super) fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| ExtractionError::Pdf("parser aborted on malformed input".to_string()))?
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    Ok(pages.concat())
}
