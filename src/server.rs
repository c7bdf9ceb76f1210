use crate::config::Config;
use crate::detector::MedicineDetector;
use crate::engines::tesseract::TesseractEngine;
use crate::error::DetectError;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<MedicineDetector>,
    pub config: Arc<Config>,
}

/// Detection response
#[derive(Serialize)]
pub struct DetectResponse {
    pub medicine_name: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub engine: String,
    pub language: String,
    pub max_file_size_bytes: usize,
    pub preprocessing: bool,
}

/// Build the application router for the given state
pub fn router(state: AppState) -> Router {
    let max_file_size = state.config.max_file_size;
    Router::new()
        .route("/detect-medicine", post(handle_detect))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let engine = TesseractEngine::new(&config)?;
    let detector = MedicineDetector::new(Arc::new(engine), config.preprocess);
    let addr = format!("{}:{}", config.host, config.port);

    let state = AppState {
        detector: Arc::new(detector),
        config: Arc::new(config),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle medicine detection requests
async fn handle_detect(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DetectResponse>, DetectError> {
    let start = Instant::now();

    let mut upload: Option<(Bytes, Option<String>)> = None;

    // Parse multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DetectError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            // Ignore unknown fields
            continue;
        }

        // A file input submitted with nothing chosen arrives as a "file"
        // part with an empty filename; reject it before touching disk.
        if field.file_name().unwrap_or_default().is_empty() {
            return Err(DetectError::NoSelectedFile);
        }

        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| DetectError::InvalidRequest(format!("Failed to read file data: {}", e)))?;
        upload = Some((data, content_type));
    }

    let (data, content_type) = upload.ok_or(DetectError::MissingFile)?;

    if data.len() > state.config.max_file_size {
        return Err(DetectError::ImageTooLarge {
            size: data.len(),
            max: state.config.max_file_size,
        });
    }

    // Determine file extension from mime type
    let extension = match content_type.as_deref() {
        Some("image/png") => ".png",
        Some("image/jpeg") => ".jpg",
        Some("image/gif") => ".gif",
        Some("image/bmp") => ".bmp",
        Some("image/webp") => ".webp",
        Some("image/tiff") => ".tiff",
        _ => ".tmp",
    };

    // Scratch file lives only for the duration of this request; dropping
    // the handle removes it whether detection succeeds or fails.
    let mut temp_file = tempfile::Builder::new()
        .suffix(extension)
        .tempfile()
        .map_err(|e| DetectError::Internal(format!("Failed to create temp file: {}", e)))?;

    temp_file
        .write_all(&data)
        .map_err(|e| DetectError::Internal(format!("Failed to write temp file: {}", e)))?;

    let medicine_name = state.detector.detect(temp_file.path())?;

    tracing::info!(
        "Detection completed in {}ms: {}",
        start.elapsed().as_millis(),
        medicine_name
    );

    Ok(Json(DetectResponse { medicine_name }))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.detector.engine_name().to_string(),
        language: state.config.language.clone(),
        max_file_size_bytes: state.config.max_file_size,
        preprocessing: state.detector.preprocessing_enabled(),
    })
}
