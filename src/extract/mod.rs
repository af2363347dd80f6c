//! Plain-text extraction for uploaded documents.
//!
//! Every extractor takes the raw upload bytes and returns trimmed text. The
//! format is chosen from the file name before any bytes are parsed.

use thiserror::Error;
use tracing::{error, info};

use crate::data::FileKind;

mod docx;
mod pdf;
mod text;

pub use docx::extract_docx_text;
pub use pdf::extract_pdf_text;
pub use text::extract_plain_text;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type. Please upload a PDF, DOCX, or TXT file.")]
    UnsupportedFormat,
    #[error("Error extracting text from {}: {}", .kind.label(), .detail)]
    Failed { kind: FileKind, detail: String },
    #[error(
        "No text could be extracted from {} file. The file may be empty or contain only images.",
        .0.label()
    )]
    NoText(FileKind),
}

impl ExtractError {
    pub(crate) fn failed(kind: FileKind, detail: impl Into<String>) -> Self {
        ExtractError::Failed {
            kind,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub kind: FileKind,
    pub text: String,
}

pub fn detect_kind(filename: &str) -> Result<FileKind, ExtractError> {
    FileKind::from_filename(filename).ok_or(ExtractError::UnsupportedFormat)
}

pub fn extract_text(bytes: &[u8], kind: FileKind) -> Result<String, ExtractError> {
    let result = match kind {
        FileKind::Pdf => extract_pdf_text(bytes),
        FileKind::Docx => extract_docx_text(bytes),
        FileKind::Txt => extract_plain_text(bytes),
    };
    if let Err(err) = &result {
        error!("{} extraction error: {}", kind.label(), err);
    }
    result
}

/// Picks the extractor from `filename` and fails when nothing readable is left.
pub fn extract_document(bytes: &[u8], filename: &str) -> Result<ExtractedDocument, ExtractError> {
    let kind = detect_kind(filename)?;
    let text = extract_text(bytes, kind)?;
    if text.trim().is_empty() {
        return Err(ExtractError::NoText(kind));
    }
    info!(
        "{} text extracted from {}: {} characters",
        kind.label(),
        filename,
        text.chars().count()
    );
    Ok(ExtractedDocument { kind, text })
}
