//! Claim-verification service client
//!
//! Sends one image or video together with a free-text claim to `/analyze`.

use deepsecure_common::events::MediaCategory;
use reqwest::multipart::Form;
use std::time::Duration;
use thiserror::Error;

use crate::models::ClaimAnalysis;
use crate::services::detection_client::file_part;
use crate::services::intake::MediaFile;

const USER_AGENT: &str = concat!("DeepSecure/", env!("CARGO_PKG_VERSION"));

/// Claim-verification errors
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Please enter a claim to verify")]
    EmptyClaim,

    #[error("Only image and video files can be tracked, got {0}")]
    UnsupportedType(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API request failed: {0}")]
    HttpStatus(u16),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ClaimError {
    /// Errors caught before any request is made
    pub fn is_input_error(&self) -> bool {
        matches!(self, ClaimError::EmptyClaim | ClaimError::UnsupportedType(_))
    }
}

/// Client for the claim-verification service
pub struct ClaimClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ClaimClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClaimError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClaimError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Verify a claim against one media file
    pub async fn analyze(&self, claim: &str, file: &MediaFile) -> Result<ClaimAnalysis, ClaimError> {
        let claim = claim.trim();
        if claim.is_empty() {
            return Err(ClaimError::EmptyClaim);
        }
        match MediaCategory::from_mime(&file.mime_type) {
            Some(MediaCategory::Image) | Some(MediaCategory::Video) => {}
            _ => return Err(ClaimError::UnsupportedType(file.mime_type.clone())),
        }

        let part = file_part(file)
            .mime_str(&file.mime_type)
            .map_err(|_| ClaimError::UnsupportedType(file.mime_type.clone()))?;
        let form = Form::new()
            .part("image", part)
            .text("claim", claim.to_string());

        let url = format!("{}/analyze", self.base_url);
        tracing::debug!(endpoint = %url, name = %file.name, "Submitting claim for verification");

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClaimError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClaimError::HttpStatus(status.as_u16()));
        }

        response
            .json::<ClaimAnalysis>()
            .await
            .map_err(|e| ClaimError::Parse(e.to_string()))
    }

    /// Verify a claim, turning request failures into a failed result
    ///
    /// Input errors are still returned since no request was made for them.
    pub async fn verify(&self, claim: &str, file: &MediaFile) -> Result<ClaimAnalysis, ClaimError> {
        match self.analyze(claim, file).await {
            Ok(analysis) => {
                tracing::info!(verdict = %analysis.assessment.verdict, confidence = analysis.assessment.confidence, "Claim analysed");
                Ok(analysis)
            }
            Err(e) if e.is_input_error() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Claim verification failed");
                Ok(ClaimAnalysis::failed(claim.trim(), &e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    fn client() -> ClaimClient {
        // Nothing listens here; any request would surface as a Network error
        ClaimClient::new("http://127.0.0.1:9/", Duration::from_secs(1)).unwrap()
    }

    fn file(mime: &str) -> MediaFile {
        MediaFile {
            name: "evidence".to_string(),
            mime_type: mime.to_string(),
            bytes: Bytes::from_static(b"data"),
        }
    }

    #[tokio::test]
    async fn test_empty_claim_rejected_before_request() {
        let err = client().verify("   ", &file("image/png")).await.unwrap_err();
        assert!(matches!(err, ClaimError::EmptyClaim));
    }

    #[tokio::test]
    async fn test_audio_rejected_before_request() {
        let err = client().verify("a claim", &file("audio/wav")).await.unwrap_err();
        assert!(matches!(err, ClaimError::UnsupportedType(_)));
    }

    #[tokio::test]
    async fn test_network_failure_becomes_failed_result() {
        let analysis = client().verify("a claim", &file("image/png")).await.unwrap();
        assert!(analysis.is_failure());
        assert_eq!(analysis.claim, "a claim");
        assert!(analysis.assessment.reasoning.starts_with("Analysis failed: Network error"));
    }

    #[test]
    fn test_status_message() {
        assert_eq!(ClaimError::HttpStatus(502).to_string(), "API request failed: 502");
        assert_eq!(client().base_url(), "http://127.0.0.1:9");
    }
}
