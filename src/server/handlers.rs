use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::info;

use crate::data::FileKind;
use crate::extract;
use crate::languages;
use crate::providers::TranslationProvider;
use crate::render;
use crate::translator::ParagraphBatch;

use super::models::{
    DetectRequest, DetectResponse, DownloadRequest, HealthResponse, MessageResponse,
    ParagraphTranslateRequest, TranslateFileQuery, TranslateRequest, TranslateResponse,
    UploadResponse,
};
use super::state::ServerState;
use super::util::{ServerError, build_download_filename, today};

const UPLOAD_FIELD: &str = "file";

pub async fn run_server<P: TranslationProvider>(state: ServerState<P>) -> Result<()> {
    let addr = state.settings.addr.clone();
    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address {}", addr))?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router<P: TranslationProvider>(state: Arc<ServerState<P>>) -> Router {
    let origins = Arc::new(state.settings.allowed_origins.clone());
    let body_limit = state.settings.max_upload_bytes;
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health::<P>))
        .route("/api/detect-language", post(detect_language))
        .route("/api/translate", post(translate::<P>))
        .route("/api/translate-paragraphs", post(translate_paragraphs::<P>))
        .route("/api/upload-pdf", post(upload_file))
        .route("/api/translate-pdf", post(translate_file::<P>))
        .route("/api/download-docx", post(download_docx))
        .route("/api/download-pdf", post(download_pdf::<P>))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(origins, cors_middleware))
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Translation API is running",
    })
}

async fn health<P: TranslationProvider>(
    State(state): State<Arc<ServerState<P>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        has_google_key: state.settings.has_google_key(),
    })
}

async fn cors_middleware(
    State(origins): State<Arc<Vec<String>>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_end_matches('/').to_string())
        .filter(|value| origins.iter().any(|allowed| allowed == value));

    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut(), origin.as_deref());
        return response;
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut(), origin.as_deref());
    response
}

/// Unknown origins get no allow-origin header, so browsers block them.
fn apply_cors_headers(headers: &mut HeaderMap, origin: Option<&str>) {
    headers.insert(header::VARY, HeaderValue::from_static("origin"));
    let Some(value) = origin.and_then(|origin| HeaderValue::from_str(origin).ok()) else {
        return;
    };
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type,authorization"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("content-disposition"),
    );
}

async fn detect_language(Json(request): Json<DetectRequest>) -> Json<DetectResponse> {
    Json(DetectResponse {
        detected_language: languages::detect_language(&request.text),
    })
}

async fn translate<P: TranslationProvider>(
    State(state): State<Arc<ServerState<P>>>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ServerError> {
    info!(
        "translate request: {} chars -> {}",
        request.text.chars().count(),
        request.target_language
    );
    let detected_language = languages::detect_language(&request.text);
    let result = state
        .translator
        .translate(&request.text, &request.target_language)
        .await?;
    Ok(Json(TranslateResponse {
        original_text: request.text,
        translated_text: result.translated_text,
        detected_language,
        target_language: request.target_language,
        confidence: result.confidence,
        provider: result.provider,
        file_type: None,
    }))
}

async fn translate_paragraphs<P: TranslationProvider>(
    State(state): State<Arc<ServerState<P>>>,
    Json(request): Json<ParagraphTranslateRequest>,
) -> Json<ParagraphBatch> {
    let batch = state
        .translator
        .translate_paragraphs(&request.paragraphs, &request.target_lang)
        .await;
    Json(batch)
}

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// Reads the `file` field. The extension is checked before the body is
/// buffered.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ServerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::new(err.status(), err.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ServerError::bad_request("No file provided"))?;
        let kind = extract::detect_kind(&filename)?;
        info!("{} upload: {}", kind.label(), filename);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ServerError::new(err.status(), err.body_text()))?;
        info!("file size: {} bytes", bytes.len());
        return Ok(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }
    Err(ServerError::bad_request("No file provided"))
}

async fn extract_upload(upload: Upload) -> Result<(FileKind, String), ServerError> {
    let Upload { filename, bytes } = upload;
    let document =
        tokio::task::spawn_blocking(move || extract::extract_document(&bytes, &filename)).await??;
    Ok((document.kind, document.text))
}

async fn upload_file(multipart: Multipart) -> Result<Json<UploadResponse>, ServerError> {
    let upload = read_upload(multipart).await?;
    let (kind, text) = extract_upload(upload).await?;
    let detected_language = languages::detect_language(&text);
    info!(
        "{} text extracted: {} characters, detected language: {}",
        kind.label(),
        text.chars().count(),
        detected_language
    );
    Ok(Json(UploadResponse {
        extracted_text: text,
        detected_language,
        file_type: kind.label(),
    }))
}

async fn translate_file<P: TranslationProvider>(
    State(state): State<Arc<ServerState<P>>>,
    Query(query): Query<TranslateFileQuery>,
    multipart: Multipart,
) -> Result<Json<TranslateResponse>, ServerError> {
    let upload = read_upload(multipart).await?;
    let (kind, text) = extract_upload(upload).await?;
    let detected_language = languages::detect_language(&text);
    info!(
        "{} translate: {} characters ({}) -> {}",
        kind.label(),
        text.chars().count(),
        detected_language,
        query.target_language
    );
    let result = state
        .translator
        .translate(&text, &query.target_language)
        .await?;
    Ok(Json(TranslateResponse {
        original_text: text,
        translated_text: result.translated_text,
        detected_language,
        target_language: query.target_language,
        confidence: result.confidence,
        provider: result.provider,
        file_type: Some(kind.label()),
    }))
}

struct DownloadJob {
    text: String,
    title: String,
    target_language: String,
    filename: String,
}

fn prepare_download(request: DownloadRequest, kind: FileKind) -> Result<DownloadJob, ServerError> {
    if request.text.trim().is_empty() {
        return Err(ServerError::bad_request("Text cannot be empty"));
    }
    let filename = build_download_filename(
        request.original_filename.as_deref(),
        request.target_language.as_deref(),
        today(),
        kind.extension(),
    )?;
    info!(
        "generating {} for {} characters, target language: {:?}, file: {}",
        kind.label(),
        request.text.chars().count(),
        request.target_language,
        filename
    );
    Ok(DownloadJob {
        text: request.text,
        title: request
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| render::DEFAULT_TITLE.to_string()),
        target_language: request.target_language.unwrap_or_default(),
        filename,
    })
}

fn attachment(kind: FileKind, filename: &str, bytes: Vec<u8>) -> Result<Response, ServerError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|err| ServerError::internal(format!("invalid download filename: {}", err)))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(kind.mime())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn download_docx(Json(request): Json<DownloadRequest>) -> Result<Response, ServerError> {
    let job = prepare_download(request, FileKind::Docx)?;
    let DownloadJob {
        text,
        title,
        target_language,
        filename,
    } = job;
    let bytes = tokio::task::spawn_blocking(move || {
        render::render_docx(&text, &title, &target_language)
    })
    .await??;
    attachment(FileKind::Docx, &filename, bytes)
}

async fn download_pdf<P: TranslationProvider>(
    State(state): State<Arc<ServerState<P>>>,
    Json(request): Json<DownloadRequest>,
) -> Result<Response, ServerError> {
    let job = prepare_download(request, FileKind::Pdf)?;
    let DownloadJob {
        text,
        title,
        target_language,
        filename,
    } = job;
    let fonts = state.fonts.clone();
    let bytes = tokio::task::spawn_blocking(move || {
        render::render_pdf(&text, &title, &target_language, &fonts)
    })
    .await??;
    attachment(FileKind::Pdf, &filename, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontRegistry;
    use crate::settings::Settings;
    use crate::test_util::ScriptedProvider;
    use crate::translator::Translator;
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "doc-translator-boundary";
    const ENGLISH: &str = "This report describes the quarterly results of the company and its plans.";

    fn app_with(provider: ScriptedProvider) -> Router {
        let settings = Settings {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            ..Settings::default()
        };
        let translator = Translator::new(provider).with_backoff(Duration::ZERO);
        router(Arc::new(ServerState::new(
            settings,
            Arc::new(FontRegistry::new()),
            translator,
        )))
    }

    fn app() -> Router {
        app_with(ScriptedProvider::new())
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(uri: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_key_presence() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        insta::assert_json_snapshot!(body_json(response).await, @r#"
        {
          "has_google_key": false,
          "status": "healthy"
        }
        "#);
    }

    #[tokio::test]
    async fn root_message() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await["message"],
            "Translation API is running"
        );
    }

    #[tokio::test]
    async fn translate_returns_provider_output() {
        let response = app()
            .oneshot(json_request(
                "/api/translate",
                serde_json::json!({"text": ENGLISH, "target_language": "hindi"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["translated_text"], format!("[hi] {}", ENGLISH));
        assert_eq!(body["original_text"], ENGLISH);
        assert_eq!(body["detected_language"], "English");
        assert_eq!(body["confidence"], "high");
        assert_eq!(body["provider"], "google");
        assert!(body.get("file_type").is_none());
    }

    #[tokio::test]
    async fn unsupported_language_is_a_bad_request() {
        let response = app()
            .oneshot(json_request(
                "/api/translate",
                serde_json::json!({"text": ENGLISH, "target_language": "klingon"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["detail"],
            "Unsupported target language: klingon"
        );
    }

    #[tokio::test]
    async fn provider_rate_limit_maps_to_429() {
        let provider = ScriptedProvider::with_outcomes(vec![Err(
            crate::providers::ProviderError::Status {
                status: 429,
                body: String::new(),
            },
        )]);
        let response = app_with(provider)
            .oneshot(json_request(
                "/api/translate",
                serde_json::json!({"text": ENGLISH, "target_language": "tamil"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn paragraphs_use_camel_case_fields() {
        let response = app()
            .oneshot(json_request(
                "/api/translate-paragraphs",
                serde_json::json!({
                    "paragraphs": [{"id": "a", "text": ENGLISH}, {"id": "b", "text": "   "}],
                    "targetLang": "telugu"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["translations"][0]["id"], "a");
        assert_eq!(body["translations"][0]["translatedText"], format!("[te] {}", ENGLISH));
        assert_eq!(
            body["translations"][1]["translatedText"],
            "[Error: Text to translate cannot be empty]"
        );
        assert_eq!(body["translations"][1]["confidence"], "low");
        assert_eq!(
            body["error"],
            "Paragraph b: Text to translate cannot be empty"
        );
        assert_eq!(body["provider"], "google");
    }

    #[tokio::test]
    async fn text_upload_is_extracted() {
        let text = "The quarterly report is attached to this message.\nPlease read it carefully before the meeting on Monday morning.";
        let response = app()
            .oneshot(multipart_request("/api/upload-pdf", "report.txt", text.as_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["extracted_text"], text);
        assert_eq!(body["file_type"], "TXT");
        assert_eq!(body["detected_language"], "English");
    }

    #[tokio::test]
    async fn csv_upload_is_rejected() {
        let response = app()
            .oneshot(multipart_request("/api/upload-pdf", "table.csv", b"a,b\n1,2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["detail"],
            "Unsupported file type. Please upload a PDF, DOCX, or TXT file."
        );
    }

    #[tokio::test]
    async fn empty_text_upload_is_rejected() {
        let response = app()
            .oneshot(multipart_request("/api/upload-pdf", "empty.txt", b"  \n "))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let detail = body_json(response).await["detail"].as_str().unwrap().to_string();
        assert!(detail.starts_with("No text could be extracted from TXT file"));
    }

    #[tokio::test]
    async fn file_translation_defaults_to_hindi() {
        let response = app()
            .oneshot(multipart_request(
                "/api/translate-pdf",
                "report.txt",
                ENGLISH.as_bytes(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["target_language"], "hindi");
        assert_eq!(body["translated_text"], format!("[hi] {}", ENGLISH));
        assert_eq!(body["file_type"], "TXT");
    }

    #[tokio::test]
    async fn downloads_reject_blank_text() {
        for uri in ["/api/download-docx", "/api/download-pdf"] {
            let response = app()
                .oneshot(json_request(uri, serde_json::json!({"text": " \n "})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await["detail"], "Text cannot be empty");
        }
    }

    #[tokio::test]
    async fn docx_download_is_an_attachment() {
        let response = app()
            .oneshot(json_request(
                "/api/download-docx",
                serde_json::json!({
                    "text": "మొదటి పేరా",
                    "target_language": "Telugu",
                    "original_filename": "report.pdf"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            crate::data::DOCX_MIME
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"report_telugu_"));
        assert!(disposition.ends_with(".docx\""));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn pdf_download_uses_builtin_fonts_without_registry() {
        let response = app()
            .oneshot(json_request(
                "/api/download-pdf",
                serde_json::json!({"text": "Hello\n\nWorld", "title": "Notes"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], crate::data::PDF_MIME);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn preflight_for_allowed_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/translate")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }

    #[tokio::test]
    async fn unknown_origin_gets_no_cors_headers() {
        let request = Request::builder()
            .uri("/")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
