use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use image::{DynamicImage, Rgb, RgbImage};
use medscan_server::config::Config;
use medscan_server::detector::MedicineDetector;
use medscan_server::engine::{OcrEngine, Recognition, TokenReading};
use medscan_server::error::DetectError;
use medscan_server::server::{router, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "test-boundary";

/// Engine that answers every region with the same text
struct ConstantEngine {
    text: &'static str,
}

impl OcrEngine for ConstantEngine {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn description(&self) -> &'static str {
        "Returns a fixed text for every region"
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<Recognition, DetectError> {
        Ok(Recognition {
            text: self.text.to_string(),
            tokens: self
                .text
                .split_whitespace()
                .map(|word| TokenReading {
                    text: word.to_string(),
                    confidence: 90.0,
                    height: 20,
                })
                .collect(),
        })
    }
}

fn test_state(text: &'static str, preprocess: bool) -> AppState {
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        language: "eng".to_string(),
        max_file_size: 52_428_800,
        tessdata_path: None,
        preprocess,
    };
    let detector = MedicineDetector::new(Arc::new(ConstantEngine { text }), preprocess);
    AppState {
        detector: Arc::new(detector),
        config: Arc::new(config),
    }
}

/// A label-like photo: dark background with one bright panel big enough to
/// pass the region filter.
fn sample_png() -> Vec<u8> {
    let mut img = RgbImage::from_pixel(200, 100, Rgb([10, 10, 10]));
    for y in 20..60 {
        for x in 20..150 {
            img.put_pixel(x, y, Rgb([240, 240, 240]));
        }
    }
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("encode test image");
    bytes
}

fn multipart_request(parts: &[(&str, Option<&str>, Vec<u8>)]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/detect-medicine")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json body")
}

#[tokio::test]
async fn detect_returns_most_frequent_word() {
    let app = router(test_state("ROYCE 500 mg ROYCE tablets ROYCE", true));
    let request = multipart_request(&[("file", Some("package.png"), sample_png())]);

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["medicine_name"], "ROYCE");
}

#[tokio::test]
async fn detect_works_without_preprocessing() {
    let app = router(test_state("DOLEX forte DOLEX suspension", false));
    let request = multipart_request(&[("file", Some("package.png"), sample_png())]);

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["medicine_name"], "DOLEX");
}

#[tokio::test]
async fn detect_returns_unknown_when_no_token_qualifies() {
    let app = router(test_state("mg 5 ml", false));
    let request = multipart_request(&[("file", Some("package.png"), sample_png())]);

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["medicine_name"], "Unknown");
}

#[tokio::test]
async fn detect_without_file_field_is_bad_request() {
    let app = router(test_state("ROYCE", false));
    let request = multipart_request(&[("metadata", None, b"not a file".to_vec())]);

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn detect_with_empty_filename_is_bad_request() {
    let app = router(test_state("ROYCE", false));
    let request = multipart_request(&[("file", Some(""), Vec::new())]);

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No selected file");
}

#[tokio::test]
async fn detect_with_undecodable_payload_is_server_error() {
    let app = router(test_state("ROYCE", false));
    let request = multipart_request(&[("file", Some("broken.png"), b"not an image".to_vec())]);

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(
        message.starts_with("Failed to decode image"),
        "unexpected error: {}",
        message
    );
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = router(test_state("ROYCE", false));
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn info_endpoint_reports_configuration() {
    let app = router(test_state("ROYCE", true));
    let request = Request::builder()
        .method("GET")
        .uri("/info")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["engine"], "constant");
    assert_eq!(body["language"], "eng");
    assert_eq!(body["preprocessing"], true);
}
