use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::languages;
use crate::providers::TranslationProvider;
use crate::providers::retry::{DEFAULT_BACKOFF, MAX_ATTEMPTS, is_retryable, wait_with_backoff};

pub const CONFIDENCE_HIGH: &str = "high";
pub const CONFIDENCE_LOW: &str = "low";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationResult {
    pub translated_text: String,
    pub confidence: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Paragraph {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParagraphTranslation {
    pub id: String,
    #[serde(rename = "translatedText")]
    pub translated_text: String,
    pub confidence: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParagraphBatch {
    pub translations: Vec<ParagraphTranslation>,
    pub provider: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Text to translate cannot be empty")]
    EmptyText,
    #[error("Unsupported target language: {0}")]
    UnsupportedLanguage(String),
    #[error("Translation rate limit exceeded. Please wait a moment and try again.")]
    RateLimited,
    #[error(
        "Translation service is temporarily unavailable. Error: {0}. Please check your internet connection and try again in a moment."
    )]
    Unavailable(String),
    #[error("Translation failed: {0}. Please check the language selection and try again.")]
    InvalidRequest(String),
    #[error("Translation returned empty result. Please check the input text and try again.")]
    EmptyResult,
    #[error(
        "Translation service error: {0}. Please try again. If this persists, the translation service may be experiencing issues."
    )]
    Service(String),
}

impl TranslateError {
    pub fn status(&self) -> u16 {
        match self {
            TranslateError::EmptyText
            | TranslateError::UnsupportedLanguage(_)
            | TranslateError::InvalidRequest(_)
            | TranslateError::EmptyResult => 400,
            TranslateError::RateLimited => 429,
            TranslateError::Unavailable(_) => 503,
            TranslateError::Service(_) => 502,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    RateLimited,
    Unavailable,
    InvalidRequest,
    EmptyResult,
}

/// First matching rule wins; no match is a generic service error.
const FAILURE_RULES: &[(&[&str], FailureKind)] = &[
    (&["429", "rate limit", "quota"], FailureKind::RateLimited),
    (
        &[
            "timeout",
            "connection",
            "503",
            "service unavailable",
            "temporarily unavailable",
            "network",
            "unreachable",
        ],
        FailureKind::Unavailable,
    ),
    (
        &["invalid", "not supported", "unsupported", "language"],
        FailureKind::InvalidRequest,
    ),
    (&["empty", "no result"], FailureKind::EmptyResult),
];

/// Maps a provider failure message onto the error reported to clients.
pub fn classify_failure(message: &str) -> TranslateError {
    let lower = message.to_lowercase();
    let kind = FAILURE_RULES
        .iter()
        .find(|(markers, _)| markers.iter().any(|marker| lower.contains(marker)))
        .map(|(_, kind)| *kind);
    match kind {
        Some(FailureKind::RateLimited) => TranslateError::RateLimited,
        Some(FailureKind::Unavailable) => TranslateError::Unavailable(message.to_string()),
        Some(FailureKind::InvalidRequest) => TranslateError::InvalidRequest(message.to_string()),
        Some(FailureKind::EmptyResult) => TranslateError::EmptyResult,
        None => TranslateError::Service(message.chars().take(200).collect()),
    }
}

#[derive(Debug, Clone)]
pub struct Translator<P: TranslationProvider> {
    provider: P,
    backoff: Duration,
}

impl<P: TranslationProvider> Translator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Base wait between attempts (the second retry waits twice as long).
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<TranslationResult, TranslateError> {
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyText);
        }
        let target_code = languages::code_for_name(target_language)
            .ok_or_else(|| TranslateError::UnsupportedLanguage(target_language.to_string()))?;

        let source_code = languages::detect_code(text).filter(|code| code.len() == 2);
        match source_code.as_deref() {
            Some(code) => info!("detected source language: {}", code),
            None => warn!("language detection failed, using 'auto'"),
        }
        if source_code.as_deref() == Some(target_code) {
            info!("source and target languages are the same, returning original text");
            return Ok(self.result(text.to_string()));
        }

        let source_label = source_code.as_deref().unwrap_or("auto");
        let mut last_error = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            info!(
                "translating from {} to {} (attempt {}/{})",
                source_label, target_code, attempt, MAX_ATTEMPTS
            );
            let outcome = self
                .provider
                .translate(text.to_string(), target_code.to_string())
                .await
                .and_then(|translated| {
                    if translated.trim().is_empty() {
                        Err(crate::providers::ProviderError::EmptyResult)
                    } else {
                        Ok(translated)
                    }
                });
            match outcome {
                Ok(translated) => {
                    info!(
                        "translation succeeded: {} -> {} chars",
                        text.chars().count(),
                        translated.chars().count()
                    );
                    return Ok(self.result(translated));
                }
                Err(err) => {
                    last_error = err.to_string();
                    warn!("translation attempt {} failed: {}", attempt, last_error);
                    if attempt < MAX_ATTEMPTS && is_retryable(&last_error) {
                        wait_with_backoff(self.provider.name(), attempt, self.backoff).await;
                        continue;
                    }
                    break;
                }
            }
        }

        error!("translation error: {}", last_error);
        Err(classify_failure(&last_error))
    }

    /// Translates each paragraph in order. Failures become inline
    /// `[Error: ...]` markers instead of failing the batch.
    pub async fn translate_paragraphs(
        &self,
        paragraphs: &[Paragraph],
        target_language: &str,
    ) -> ParagraphBatch {
        info!(
            "paragraph translation: {} paragraphs -> {}",
            paragraphs.len(),
            target_language
        );
        let mut translations = Vec::with_capacity(paragraphs.len());
        let mut errors = Vec::new();
        for paragraph in paragraphs {
            match self.translate(&paragraph.text, target_language).await {
                Ok(result) => translations.push(ParagraphTranslation {
                    id: paragraph.id.clone(),
                    translated_text: result.translated_text,
                    confidence: Some(result.confidence),
                }),
                Err(err) => {
                    let message = err.to_string();
                    error!("error translating paragraph {}: {}", paragraph.id, message);
                    errors.push(format!("Paragraph {}: {}", paragraph.id, message));
                    translations.push(ParagraphTranslation {
                        id: paragraph.id.clone(),
                        translated_text: format!("[Error: {}]", message),
                        confidence: Some(CONFIDENCE_LOW.to_string()),
                    });
                }
            }
        }
        ParagraphBatch {
            translations,
            provider: self.provider.name().to_string(),
            error: if errors.is_empty() {
                None
            } else {
                Some(errors.join("; "))
            },
        }
    }

    fn result(&self, translated_text: String) -> TranslationResult {
        TranslationResult {
            translated_text,
            confidence: CONFIDENCE_HIGH.to_string(),
            provider: self.provider.name().to_string(),
        }
    }
}
