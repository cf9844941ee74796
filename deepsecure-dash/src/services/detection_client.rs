//! Detection service client
//!
//! One multipart POST per file to the endpoint of the file's category.
//! The request is split in two steps (`send`, then `PendingDetection::detection`)
//! so callers can tell when the response head has arrived.

use deepsecure_common::events::MediaCategory;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use thiserror::Error;

use crate::models::{parse_detection, Detection, MappingError};
use crate::services::intake::MediaFile;

const USER_AGENT: &str = concat!("DeepSecure/", env!("CARGO_PKG_VERSION"));

/// Submission errors
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Unsupported file type")]
    UnsupportedType(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error! status: {0}")]
    HttpStatus(u16),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// Category and endpoint path for a MIME type
pub fn endpoint_for(mime_type: &str) -> Result<(MediaCategory, &'static str), SubmissionError> {
    match MediaCategory::from_mime(mime_type) {
        Some(MediaCategory::Image) => Ok((MediaCategory::Image, "/detect/image")),
        Some(MediaCategory::Video) => Ok((MediaCategory::Video, "/detect/video")),
        Some(MediaCategory::Audio) => Ok((MediaCategory::Audio, "/detect/audio")),
        None => Err(SubmissionError::UnsupportedType(mime_type.to_string())),
    }
}

/// Multipart part sharing the upload buffer instead of copying it
pub(crate) fn file_part(file: &MediaFile) -> Part {
    Part::stream_with_length(reqwest::Body::from(file.bytes.clone()), file.bytes.len() as u64)
        .file_name(file.name.clone())
}

/// Client for the detection service
pub struct DetectionClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl DetectionClient {
    /// `base_url` is expected without a trailing slash (see `normalize_base_url`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SubmissionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload the file and wait for the response head
    ///
    /// Unsupported MIME types fail before any network traffic.
    pub async fn send(&self, file: &MediaFile) -> Result<PendingDetection, SubmissionError> {
        let (category, path) = endpoint_for(&file.mime_type)?;
        let url = format!("{}{}", self.base_url, path);

        // An unparsable MIME string is sent without a part content type
        let part = match file_part(file).mime_str(&file.mime_type) {
            Ok(part) => part,
            Err(_) => file_part(file),
        };
        let form = Form::new().part("file", part);

        tracing::debug!(
            name = %file.name,
            category = %category,
            endpoint = %url,
            size = file.bytes.len(),
            "Submitting file to detection service"
        );

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint = %url, status = status.as_u16(), "Detection service returned error status");
            return Err(SubmissionError::HttpStatus(status.as_u16()));
        }

        Ok(PendingDetection { category, response })
    }

    /// Submit and parse in one call
    pub async fn detect(&self, file: &MediaFile) -> Result<Detection, SubmissionError> {
        self.send(file).await?.detection().await
    }
}

/// Response whose head has arrived and whose body is still to be read
pub struct PendingDetection {
    category: MediaCategory,
    response: reqwest::Response,
}

impl PendingDetection {
    pub fn category(&self) -> MediaCategory {
        self.category
    }

    /// Read the body and map it against the category schema
    pub async fn detection(self) -> Result<Detection, SubmissionError> {
        let body = self
            .response
            .bytes()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;
        Ok(parse_detection(self.category, &body)?)
    }
}
