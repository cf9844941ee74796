//! Shared test helpers
//!
//! `MockService` stands in for both the detection service and the
//! claim-verification service: an axum server on 127.0.0.1:0 that records
//! every request and answers with configurable replies.

#![allow(dead_code)]

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::post,
    Router,
};
use deepsecure_common::events::{EventBus, RecordId};
use deepsecure_dash::models::UploadedFile;
use deepsecure_dash::services::{ClaimClient, DetectionClient, SampleCatalog};
use deepsecure_dash::AppState;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Canned reply for one endpoint or file
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockReply {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: json!({"detail": "mock failure"}).to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub part_name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
    pub claim: Option<String>,
}

#[derive(Default)]
struct MockInner {
    by_path: HashMap<String, MockReply>,
    by_file: HashMap<String, MockReply>,
    requests: Vec<RecordedRequest>,
}

#[derive(Clone, Default)]
pub struct MockService {
    inner: Arc<Mutex<MockInner>>,
    pub base_url: String,
}

impl MockService {
    /// Start the mock server on an ephemeral port
    pub async fn start() -> Self {
        let mut mock = MockService::default();

        let app = Router::new()
            .route("/detect/:kind", post(handle))
            .route("/analyze", post(handle))
            .layer(DefaultBodyLimit::disable())
            .with_state(mock.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        mock.base_url = format!("http://{}", addr);
        mock
    }

    pub fn reply_on(&self, path: &str, reply: MockReply) {
        self.inner.lock().unwrap().by_path.insert(path.to_string(), reply);
    }

    /// Reply used for an uploaded file name, ahead of the per-path reply
    pub fn reply_for_file(&self, file_name: &str, reply: MockReply) {
        self.inner
            .lock()
            .unwrap()
            .by_file
            .insert(file_name.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn hits(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }

    fn reply_for(&self, path: &str, file_name: Option<&str>) -> MockReply {
        let inner = self.inner.lock().unwrap();
        file_name
            .and_then(|name| inner.by_file.get(name))
            .or_else(|| inner.by_path.get(path))
            .cloned()
            .unwrap_or_else(|| MockReply::json(json!({"is_fake": false, "confidence": 0.5})))
    }
}

async fn handle(State(mock): State<MockService>, uri: Uri, mut multipart: Multipart) -> impl IntoResponse {
    let mut recorded = RecordedRequest {
        path: uri.path().to_string(),
        part_name: None,
        file_name: None,
        content_type: None,
        size: 0,
        claim: None,
    };

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(str::to_string);
        if name.as_deref() == Some("claim") {
            recorded.claim = Some(field.text().await.unwrap());
            continue;
        }
        recorded.part_name = name;
        recorded.file_name = field.file_name().map(str::to_string);
        recorded.content_type = field.content_type().map(str::to_string);
        recorded.size = field.bytes().await.unwrap().len();
    }

    let reply = mock.reply_for(&recorded.path, recorded.file_name.as_deref());
    mock.inner.lock().unwrap().requests.push(recorded);

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    (
        StatusCode::from_u16(reply.status).unwrap(),
        [("content-type", "application/json")],
        reply.body,
    )
}

/// App state wired to a mock service
pub fn test_app_state(mock: &MockService, samples_dir: &Path) -> AppState {
    let detection = DetectionClient::new(&mock.base_url, Duration::from_secs(10)).unwrap();
    let claims = ClaimClient::new(&mock.base_url, Duration::from_secs(10)).unwrap();
    AppState::from_parts(
        EventBus::new(100),
        detection,
        claims,
        SampleCatalog::new(samples_dir),
    )
}

/// Poll until the record leaves `analyzing`
pub async fn wait_for_terminal(state: &AppState, id: RecordId) -> UploadedFile {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let record = state.records.get(id).await.expect("record should exist");
        if record.status.is_terminal() {
            return record;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "record {} did not resolve in time",
            id
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// One part of a hand-built multipart body
pub struct FormPart<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: Vec<u8>,
}

impl<'a> FormPart<'a> {
    pub fn file(name: &'a str, file_name: &'a str, content_type: &'a str, data: Vec<u8>) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            content_type: Some(content_type),
            data,
        }
    }

    pub fn text(name: &'a str, value: &str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes().to_vec(),
        }
    }
}

pub const BOUNDARY: &str = "deepsecure-test-boundary";

/// Content-Type header value and body for a multipart request
pub fn multipart_body(parts: &[FormPart<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
            ),
        }
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

/// JPEG header padded with zeros to `size` bytes
pub fn jpeg_bytes(size: usize) -> Vec<u8> {
    let mut data = vec![0u8; size.max(4)];
    data[..4].copy_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
    data
}

/// Video response with `total` frames of which the first `fake` are fake
pub fn video_response(total: u32, fake: u32) -> Value {
    let frames: Vec<Value> = (0..total)
        .map(|i| {
            json!({
                "frame_index": i * 30,
                "fake_probability": if i < fake { 0.92 } else { 0.08 },
                "is_fake": i < fake,
                "confidence": 0.92,
            })
        })
        .collect();
    json!({
        "is_fake": false,
        "confidence": 0.7,
        "detection_method": "frame-ensemble",
        "frame_analysis": {
            "total_frames_analyzed": total,
            "fake_frames": fake,
            "real_frames": total - fake,
            "consistency_score": 0.7,
            "frame_results": frames,
        }
    })
}
