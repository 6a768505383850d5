//! services/api/src/pipeline/extract.rs
//!
//! Turns an uploaded file into prompt-ready content: page text for PDFs, a
//! re-encoded binary payload for images.

use std::io::Cursor;

use bytes::Bytes;
use health_assistant_core::domain::{DeclaredKind, ExtractedContent, ImageAttachment};
use image::ImageFormat;
use lopdf::Document;
use tokio::task;
use tracing::warn;

use crate::error::PipelineError;

/// Runs [`extract`] on the blocking thread pool.
pub async fn extract_blocking(
    kind: DeclaredKind,
    bytes: Bytes,
) -> Result<ExtractedContent, PipelineError> {
    task::spawn_blocking(move || extract(kind, &bytes))
        .await
        .map_err(|e| PipelineError::ExtractionFailed(format!("extraction task failed: {}", e)))?
}

/// Dispatches on the declared kind. Rejected kinds never reach a decoder.
pub fn extract(kind: DeclaredKind, bytes: &[u8]) -> Result<ExtractedContent, PipelineError> {
    match kind {
        DeclaredKind::Pdf => extract_pdf_text(bytes).map(ExtractedContent::Text),
        DeclaredKind::Image => extract_image(bytes).map(ExtractedContent::Image),
        DeclaredKind::Rejected => Err(PipelineError::bad_input("Invalid file type")),
    }
}

/// Concatenates the text of every page in page order.
///
/// A page whose text cannot be extracted contributes nothing; only a document
/// that cannot be opened at all is an error.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, PipelineError> {
    let document = Document::load_mem(bytes)
        .map_err(|e| PipelineError::ExtractionFailed(format!("could not open PDF: {}", e)))?;

    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => warn!("Skipping unreadable PDF page {}: {}", page_number, e),
        }
    }
    Ok(text)
}

/// Decodes the image and re-encodes it in its own detected format.
///
/// The MIME subtype comes from the decoded bytes, never from the filename.
pub fn extract_image(bytes: &[u8]) -> Result<ImageAttachment, PipelineError> {
    let format = image::guess_format(bytes)
        .map_err(|e| PipelineError::ExtractionFailed(format!("unrecognised image: {}", e)))?;

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PipelineError::ExtractionFailed(format!("could not decode image: {}", e)))?;

    let mut encoded = Cursor::new(Vec::new());
    decoded
        .write_to(&mut encoded, format)
        .map_err(|e| PipelineError::ExtractionFailed(format!("could not re-encode image: {}", e)))?;

    Ok(ImageAttachment {
        mime_subtype: mime_subtype(format),
        data: Bytes::from(encoded.into_inner()),
    })
}

fn mime_subtype(format: ImageFormat) -> String {
    let mime = format.to_mime_type();
    mime.strip_prefix("image/").unwrap_or(mime).to_lowercase()
}
