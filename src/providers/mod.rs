use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

mod google;
pub(crate) mod retry;

pub use google::{GoogleTranslate, MAX_TEXT_CHARS};

/// Provider failures. Every message names what went wrong (status code,
/// timeout, connection, empty result) so callers can classify by text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("request timeout after {0}s")]
    Timeout(u64),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Translation returned empty result")]
    EmptyResult,
    #[error("invalid text length: {0} characters (max {MAX_TEXT_CHARS})")]
    TextTooLong(usize),
    #[error("unexpected response: {0}")]
    Malformed(String),
    #[error("request failed: {0}")]
    Request(String),
}

pub type ProviderFuture = Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send>>;

/// A remote machine-translation backend. The source language is always left
/// to the backend to detect.
pub trait TranslationProvider: Clone + Send + Sync + 'static {
    /// Label reported alongside results.
    fn name(&self) -> &'static str;
    fn translate(&self, text: String, target_code: String) -> ProviderFuture;
}
