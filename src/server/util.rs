use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use time::Date;
use time::macros::format_description;
use tracing::error;

use crate::extract::ExtractError;
use crate::render::RenderError;
use crate::translator::TranslateError;

const DEFAULT_BASE_NAME: &str = "translated_text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl ServerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{} {}", self.status.as_u16(), self.message);
        }
        let body = Json(ErrorBody {
            detail: &self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ExtractError> for ServerError {
    fn from(err: ExtractError) -> Self {
        ServerError::bad_request(err.to_string())
    }
}

impl From<TranslateError> for ServerError {
    fn from(err: TranslateError) -> Self {
        let status =
            StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ServerError::new(status, err.to_string())
    }
}

impl From<RenderError> for ServerError {
    fn from(err: RenderError) -> Self {
        ServerError::internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::internal(format!("server task failed: {}", err))
    }
}

/// `{base}_{language}_{YYYYMMDD}.{extension}`. The base is the original file
/// stem reduced to alphanumerics, spaces, `-` and `_`; the language part is
/// dropped when empty.
pub fn build_download_filename(
    original_filename: Option<&str>,
    target_language: Option<&str>,
    date: Date,
    extension: &str,
) -> Result<String, ServerError> {
    let base = original_filename
        .and_then(crate::data::file_stem)
        .map(|stem| sanitize_base_name(&stem))
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_NAME.to_string());

    let mut parts = vec![base];
    let language = target_language
        .map(|lang| lang.trim().to_lowercase().replace(' ', "_"))
        .unwrap_or_default();
    if !language.is_empty() {
        parts.push(language);
    }
    let stamp = date
        .format(format_description!("[year][month][day]"))
        .map_err(|err| ServerError::internal(format!("failed to format date: {}", err)))?;
    parts.push(stamp);
    Ok(format!("{}.{}", parts.join("_"), extension))
}

fn sanitize_base_name(stem: &str) -> String {
    stem.chars()
        .filter(|ch| ch.is_alphanumeric() || matches!(ch, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Local date, UTC when the local offset cannot be determined.
pub(crate) fn today() -> Date {
    time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc())
        .date()
}
