use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{ProviderError, ProviderFuture, TranslationProvider};

const ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
/// Longest input the web endpoint accepts in one request.
pub const MAX_TEXT_CHARS: usize = 5000;

/// Google's public web translation endpoint. No API key is needed.
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl GoogleTranslate {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| "failed to build translation client")?;
        Ok(Self {
            client,
            endpoint: ENDPOINT.to_string(),
            timeout,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        if !endpoint.trim().is_empty() {
            self.endpoint = endpoint;
        }
        self
    }

    fn map_request_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout.as_secs())
        } else if err.is_connect() {
            ProviderError::Connection(err.to_string())
        } else {
            ProviderError::Request(err.to_string())
        }
    }
}

impl TranslationProvider for GoogleTranslate {
    fn name(&self) -> &'static str {
        "google"
    }

    fn translate(&self, text: String, target_code: String) -> ProviderFuture {
        let provider = self.clone();
        Box::pin(async move {
            let chars = text.chars().count();
            if chars > MAX_TEXT_CHARS {
                return Err(ProviderError::TextTooLong(chars));
            }
            debug!("google translate: {} chars -> {}", chars, target_code);
            let response = provider
                .client
                .get(&provider.endpoint)
                .query(&[
                    ("client", "gtx"),
                    ("sl", "auto"),
                    ("tl", target_code.as_str()),
                    ("dt", "t"),
                    ("q", text.as_str()),
                ])
                .send()
                .await
                .map_err(|err| provider.map_request_error(err))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|err| provider.map_request_error(err))?;
            if !status.is_success() {
                return Err(ProviderError::Status {
                    status: status.as_u16(),
                    body: truncate(&body, 200),
                });
            }
            parse_response(&body)
        })
    }
}

/// The endpoint answers with nested arrays; the first element lists
/// `[translated, original, ...]` segments.
fn parse_response(body: &str) -> Result<String, ProviderError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|err| ProviderError::Malformed(format!("invalid JSON: {}", err)))?;
    let segments = payload
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Malformed("missing translation segments".to_string()))?;
    let translated = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect::<String>();
    if translated.trim().is_empty() {
        return Err(ProviderError::EmptyResult);
    }
    Ok(translated)
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
