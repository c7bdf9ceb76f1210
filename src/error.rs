use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("No selected file")]
    NoSelectedFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Preprocessing failed: {0}")]
    Preprocessing(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Failed to initialize OCR engine: {0}")]
    Initialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for DetectError {
    fn into_response(self) -> Response {
        let status = match &self {
            DetectError::MissingFile
            | DetectError::NoSelectedFile
            | DetectError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DetectError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            DetectError::Decode(_)
            | DetectError::Preprocessing(_)
            | DetectError::Ocr(_)
            | DetectError::Initialization(_)
            | DetectError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
