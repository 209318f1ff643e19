//! End-to-end tests against the real binary.
//!
//! Everything that reaches the OCR engine needs `tesseract` with the `eng`
//! traineddata on PATH, so those tests are ignored by default:
//! `cargo test -- --ignored`

use image::{ImageFormat, Luma, Rgb, RgbImage};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::io::Cursor;
use std::net::TcpStream;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{Duration, Instant};

// Use atomic counter to give each test a unique port
static PORT_COUNTER: AtomicU16 = AtomicU16::new(9400);

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct OcrResponse {
    extracted_text: String,
    revised_text: Option<String>,
    processing_time_ms: u64,
    preprocessing: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct HealthResponse {
    status: String,
    version: String,
}

struct TestServer {
    child: Child,
    port: u16,
}

impl TestServer {
    fn start(extra_args: &[&str]) -> Self {
        let port = PORT_COUNTER.fetch_add(1, Ordering::SeqCst);
        let port_arg = port.to_string();

        let child = Command::new(env!("CARGO_BIN_EXE_scanocr-server"))
            .args(["--host", "127.0.0.1", "--port", &port_arg])
            .args(extra_args)
            .spawn()
            .expect("Failed to start server");

        let deadline = Instant::now() + Duration::from_secs(10);
        while TcpStream::connect(("127.0.0.1", port)).is_err() {
            assert!(Instant::now() < deadline, "server did not start on port {}", port);
            std::thread::sleep(Duration::from_millis(100));
        }

        Self { child, port }
    }

    fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn blank_page() -> RgbImage {
    RgbImage::from_pixel(200, 120, Rgb([250, 248, 240]))
}

async fn post_file(
    client: &reqwest::Client,
    url: &str,
    filename: &str,
    bytes: Vec<u8>,
) -> reqwest::Response {
    let part = Part::bytes(bytes).file_name(filename.to_string());
    let form = Form::new().part("file", part);

    client
        .post(url)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request")
}

#[test]
fn test_even_blur_kernel_refuses_to_start() {
    let output = Command::new(env!("CARGO_BIN_EXE_scanocr-server"))
        .args(["--port", "0", "--blur-kernel-size", "4"])
        .output()
        .expect("Failed to run server");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("odd"), "stderr: {}", stderr);
}

#[test]
fn test_unknown_language_code_refuses_to_start() {
    let output = Command::new(env!("CARGO_BIN_EXE_scanocr-server"))
        .args(["--port", "0", "--languages", "eng+../etc"])
        .output()
        .expect("Failed to run server");

    assert!(!output.status.success());
}

#[tokio::test]
#[ignore = "requires tesseract on PATH"]
async fn test_health_endpoint() {
    let server = TestServer::start(&[]);
    let client = reqwest::Client::new();

    let response: HealthResponse = client
        .get(format!("{}/health", server.base_url()))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(response.status, "ok");
}

#[tokio::test]
#[ignore = "requires tesseract on PATH"]
async fn test_blank_png_yields_empty_text() {
    let server = TestServer::start(&[]);
    let client = reqwest::Client::new();

    let response = post_file(
        &client,
        &format!("{}/ocr", server.base_url()),
        "blank.png",
        encode(&blank_page(), ImageFormat::Png),
    )
    .await;

    assert!(response.status().is_success());
    let result: OcrResponse = response.json().await.expect("Failed to parse response");
    assert!(result.extracted_text.trim().is_empty());
    assert!(result.revised_text.is_none());
}

#[tokio::test]
#[ignore = "requires tesseract on PATH"]
async fn test_jpeg_with_fixed_threshold() {
    let server = TestServer::start(&["--threshold-policy", "fixed", "--fixed-threshold", "90"]);
    let client = reqwest::Client::new();

    let response = post_file(
        &client,
        &format!("{}/ocr", server.base_url()),
        "blank.jpg",
        encode(&blank_page(), ImageFormat::Jpeg),
    )
    .await;

    assert!(response.status().is_success());
    let result: OcrResponse = response.json().await.expect("Failed to parse response");
    assert_eq!(result.preprocessing["threshold_policy"], "fixed");
    assert_eq!(result.preprocessing["threshold"], 90);
}

#[tokio::test]
#[ignore = "requires tesseract on PATH"]
async fn test_oversized_upload_is_rejected() {
    let server = TestServer::start(&["--max-file-size", "2048"]);
    let client = reqwest::Client::new();

    let noisy = image::GrayImage::from_fn(256, 256, |x, y| Luma([((x * 31 + y * 17) % 251) as u8]));
    let mut bytes = Cursor::new(Vec::new());
    noisy.write_to(&mut bytes, ImageFormat::Png).unwrap();
    let bytes = bytes.into_inner();
    assert!(bytes.len() > 2048);

    let response = post_file(
        &client,
        &format!("{}/ocr", server.base_url()),
        "noisy.png",
        bytes,
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);
    let error: ErrorResponse = response.json().await.expect("Failed to parse error");
    assert_eq!(error.code, "PAYLOAD_TOO_LARGE");
    assert!(error.error.contains("2048"));
}

#[tokio::test]
#[ignore = "requires tesseract on PATH"]
async fn test_unreachable_revision_service_keeps_text() {
    // Nothing listens on port 9; revision must degrade to the original text
    let server = TestServer::start(&["--revision-url", "http://127.0.0.1:9/v1"]);
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/revise", server.base_url()))
        .json(&serde_json::json!({"text": "Teh quick brwn fox"}))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["revised_text"], "Teh quick brwn fox");
}
