use serde::{Deserialize, Serialize};

use crate::translator::Paragraph;

pub(crate) const DEFAULT_FILE_TARGET: &str = "hindi";

#[derive(Debug, Serialize)]
pub(crate) struct MessageResponse {
    pub(crate) message: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) has_google_key: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetectRequest {
    pub(crate) text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct DetectResponse {
    pub(crate) detected_language: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranslateRequest {
    pub(crate) text: String,
    pub(crate) target_language: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TranslateResponse {
    pub(crate) original_text: String,
    pub(crate) translated_text: String,
    pub(crate) detected_language: String,
    pub(crate) target_language: String,
    pub(crate) confidence: String,
    pub(crate) provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) file_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ParagraphTranslateRequest {
    pub(crate) paragraphs: Vec<Paragraph>,
    #[serde(rename = "targetLang")]
    pub(crate) target_lang: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadResponse {
    pub(crate) extracted_text: String,
    pub(crate) detected_language: String,
    pub(crate) file_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranslateFileQuery {
    #[serde(default = "default_file_target")]
    pub(crate) target_language: String,
}

fn default_file_target() -> String {
    DEFAULT_FILE_TARGET.to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct DownloadRequest {
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) target_language: Option<String>,
    #[serde(default)]
    pub(crate) original_filename: Option<String>,
}
