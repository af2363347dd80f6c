use std::panic;

use crate::data::FileKind;

use super::ExtractError;

pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    if !bytes.starts_with(b"%PDF-") {
        return Err(ExtractError::failed(FileKind::Pdf, "missing %PDF header"));
    }
    // pdf-extract panics on some malformed content streams
    let outcome = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
    match outcome {
        Ok(Ok(text)) => Ok(normalize_pages(&text)),
        Ok(Err(err)) => Err(ExtractError::failed(FileKind::Pdf, err.to_string())),
        Err(_) => Err(ExtractError::failed(
            FileKind::Pdf,
            "pdf parser aborted on malformed content",
        )),
    }
}

/// Page breaks come back as form feeds; pages are joined by a newline.
fn normalize_pages(text: &str) -> String {
    text.split('\u{c}')
        .map(|page| page.trim_end())
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
