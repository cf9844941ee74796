//! Uploaded-file record
//!
//! One record tracks one submitted file from intake to its rendered result.

use chrono::{DateTime, Utc};
use deepsecure_common::events::{MediaCategory, RecordId, RecordStatus, RequestStage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::detection::{
    AudioAnalysis, Detection, FrameAnalysis, ImageForensics, ModelPrediction,
};

/// Record mutation errors
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("Record {id} already resolved as {status}")]
    AlreadyResolved { id: RecordId, status: &'static str },

    #[error("Record {id} cannot move from stage {from:?} back to {to:?}")]
    StageRegression {
        id: RecordId,
        from: RequestStage,
        to: RequestStage,
    },
}

/// Cosmetic colour tag derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Blue,
    Accent,
    Green,
    Orange,
    Pink,
    Slate,
}

impl ColorTag {
    pub fn from_file_name(name: &str) -> Self {
        match extension_of(name).as_deref() {
            Some("jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" | "tiff") => ColorTag::Blue,
            Some("mp4" | "mov" | "avi" | "webm" | "mkv" | "flv" | "wmv") => ColorTag::Accent,
            Some("wav" | "mp3" | "flac" | "ogg" | "m4a" | "aac") => ColorTag::Green,
            Some("pdf" | "doc" | "docx") => ColorTag::Orange,
            Some("zip" | "rar" | "7z") => ColorTag::Pink,
            _ => ColorTag::Slate,
        }
    }

    /// CSS class used by the dashboard page
    pub fn css_class(&self) -> &'static str {
        match self {
            ColorTag::Blue => "bg-blue-500",
            ColorTag::Accent => "bg-accent",
            ColorTag::Green => "bg-green-500",
            ColorTag::Orange => "bg-orange-500",
            ColorTag::Pink => "bg-pink-500",
            ColorTag::Slate => "bg-slate-500",
        }
    }
}

/// Lower-cased extension of a file name, without the dot
pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Human-readable size as shown in the file list ("2048.0 KB")
pub fn format_size(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

/// Terminal result of one detection request
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    /// Service answered with a response matching the category schema
    Detected(Detection),
    /// Anything else: unsupported type, network, HTTP status, parse, schema
    Failed { error: String },
}

/// Record of one uploaded file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: RecordId,
    pub name: String,
    pub size: String,
    pub size_bytes: u64,
    pub color: ColorTag,
    pub mime_type: String,
    pub category: Option<MediaCategory>,
    pub stage: RequestStage,
    pub status: RecordStatus,
    /// URL of the preview resource (images and videos only)
    pub preview: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models_used: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fake_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub individual_predictions: Option<BTreeMap<String, ModelPrediction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_analysis: Option<FrameAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_analysis: Option<AudioAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_forensics: Option<ImageForensics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl UploadedFile {
    /// New record in the `analyzing` state
    pub fn new(name: impl Into<String>, size_bytes: u64, mime_type: impl Into<String>) -> Self {
        let name = name.into();
        let mime_type = mime_type.into();
        Self {
            id: RecordId::new(),
            size: format_size(size_bytes),
            color: ColorTag::from_file_name(&name),
            category: MediaCategory::from_mime(&mime_type),
            name,
            size_bytes,
            mime_type,
            stage: RequestStage::Queued,
            status: RecordStatus::Analyzing,
            preview: None,
            confidence: None,
            result: None,
            detection_method: None,
            models_used: None,
            fake_probability: None,
            individual_predictions: None,
            frame_analysis: None,
            audio_analysis: None,
            image_forensics: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Whether intake should allocate a preview for this record
    pub fn wants_preview(&self) -> bool {
        matches!(
            self.category,
            Some(MediaCategory::Image) | Some(MediaCategory::Video)
        )
    }

    /// Advance the request stage
    ///
    /// Stages only move forward; `Complete` is set by `resolve`.
    pub fn advance(&mut self, stage: RequestStage) -> Result<(), RecordError> {
        if self.status.is_terminal() {
            return Err(RecordError::AlreadyResolved {
                id: self.id,
                status: self.status.as_str(),
            });
        }
        if stage < self.stage {
            return Err(RecordError::StageRegression {
                id: self.id,
                from: self.stage,
                to: stage,
            });
        }
        self.stage = stage;
        Ok(())
    }

    /// Apply the terminal outcome
    ///
    /// Succeeds exactly once; a resolved record never changes status again.
    pub fn resolve(&mut self, outcome: DetectionOutcome) -> Result<RecordStatus, RecordError> {
        if self.status.is_terminal() {
            return Err(RecordError::AlreadyResolved {
                id: self.id,
                status: self.status.as_str(),
            });
        }

        match outcome {
            DetectionOutcome::Detected(detection) => {
                let summary = detection.summary();
                self.status = if summary.is_fake {
                    RecordStatus::Fake
                } else {
                    RecordStatus::Authentic
                };
                self.confidence = Some(summary.confidence);
                self.result = summary.result.clone();
                self.detection_method = summary.detection_method.clone();
                self.models_used = summary.models_used.clone();
                self.fake_probability = summary.fake_probability;
                self.individual_predictions = summary.individual_predictions.clone();

                match detection {
                    Detection::Image { forensics, .. } => self.image_forensics = forensics,
                    Detection::Video { frame_analysis, .. } => self.frame_analysis = frame_analysis,
                    Detection::Audio { analysis, .. } => self.audio_analysis = analysis,
                }
            }
            DetectionOutcome::Failed { error } => {
                self.status = RecordStatus::Inconclusive;
                self.error = Some(if error.trim().is_empty() {
                    "Unknown error".to_string()
                } else {
                    error
                });
            }
        }

        self.stage = RequestStage::Complete;
        self.completed_at = Some(Utc::now());
        Ok(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::detection::DetectionSummary;

    fn summary(is_fake: bool, confidence: f64) -> DetectionSummary {
        DetectionSummary {
            is_fake,
            confidence,
            fake_probability: None,
            result: None,
            detection_method: Some("ensemble".to_string()),
            models_used: Some(vec!["A".to_string(), "B".to_string()]),
            individual_predictions: None,
        }
    }

    #[test]
    fn test_new_record_defaults() {
        let record = UploadedFile::new("portrait.JPG", 2 * 1024 * 1024, "image/jpeg");
        assert_eq!(record.status, RecordStatus::Analyzing);
        assert_eq!(record.stage, RequestStage::Queued);
        assert_eq!(record.size, "2048.0 KB");
        assert_eq!(record.color, ColorTag::Blue);
        assert_eq!(record.category, Some(MediaCategory::Image));
        assert!(record.wants_preview());
    }

    #[test]
    fn test_color_tags() {
        assert_eq!(ColorTag::from_file_name("clip.mkv"), ColorTag::Accent);
        assert_eq!(ColorTag::from_file_name("voice.m4a"), ColorTag::Green);
        assert_eq!(ColorTag::from_file_name("report.pdf"), ColorTag::Orange);
        assert_eq!(ColorTag::from_file_name("bundle.7z"), ColorTag::Pink);
        assert_eq!(ColorTag::from_file_name("README"), ColorTag::Slate);
        assert_eq!(ColorTag::Accent.css_class(), "bg-accent");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.tar.GZ").as_deref(), Some("gz"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_audio_record_has_no_preview() {
        let record = UploadedFile::new("voice.wav", 10, "audio/wav");
        assert!(!record.wants_preview());
    }

    #[test]
    fn test_resolve_fake_copies_summary() {
        let mut record = UploadedFile::new("face.png", 10, "image/png");
        let status = record
            .resolve(DetectionOutcome::Detected(Detection::Image {
                summary: summary(true, 0.87),
                forensics: None,
            }))
            .unwrap();

        assert_eq!(status, RecordStatus::Fake);
        assert_eq!(record.confidence, Some(0.87));
        assert_eq!(record.detection_method.as_deref(), Some("ensemble"));
        assert_eq!(record.stage, RequestStage::Complete);
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn test_resolve_only_once() {
        let mut record = UploadedFile::new("face.png", 10, "image/png");
        record
            .resolve(DetectionOutcome::Detected(Detection::Image {
                summary: summary(false, 0.9),
                forensics: None,
            }))
            .unwrap();

        let second = record.resolve(DetectionOutcome::Failed {
            error: "late failure".to_string(),
        });
        assert!(matches!(second, Err(RecordError::AlreadyResolved { .. })));
        assert_eq!(record.status, RecordStatus::Authentic);
        assert!(record.error.is_none());
    }

    #[test]
    fn test_failed_outcome_always_has_error_text() {
        let mut record = UploadedFile::new("face.png", 10, "image/png");
        record
            .resolve(DetectionOutcome::Failed {
                error: "  ".to_string(),
            })
            .unwrap();
        assert_eq!(record.status, RecordStatus::Inconclusive);
        assert_eq!(record.error.as_deref(), Some("Unknown error"));
    }

    #[test]
    fn test_stage_moves_forward_only() {
        let mut record = UploadedFile::new("clip.mp4", 10, "video/mp4");
        record.advance(RequestStage::Uploading).unwrap();
        record.advance(RequestStage::AwaitingResponse).unwrap();
        assert!(matches!(
            record.advance(RequestStage::Uploading),
            Err(RecordError::StageRegression { .. })
        ));
    }
}
