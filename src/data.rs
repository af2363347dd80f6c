use std::path::Path;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_MIME: &str = "application/pdf";
pub const TEXT_MIME: &str = "text/plain";

/// Upload formats accepted by the extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Txt,
}

impl FileKind {
    pub fn from_filename(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        if lower.ends_with(".pdf") {
            Some(FileKind::Pdf)
        } else if lower.ends_with(".docx") {
            Some(FileKind::Docx)
        } else if lower.ends_with(".txt") {
            Some(FileKind::Txt)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF",
            FileKind::Docx => "DOCX",
            FileKind::Txt => "TXT",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            FileKind::Pdf => PDF_MIME,
            FileKind::Docx => DOCX_MIME,
            FileKind::Txt => TEXT_MIME,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Txt => "txt",
        }
    }
}

/// File name without directories or extension.
pub fn file_stem(name: &str) -> Option<String> {
    // uploads from Windows clients may carry backslash separated paths
    let normalized = name.replace('\\', "/");
    Path::new(&normalized)
        .file_stem()
        .and_then(|value| value.to_str())
        .map(|value| value.to_string())
}
